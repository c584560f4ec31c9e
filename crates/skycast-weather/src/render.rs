//! Render contract and the data preparation behind it.
//!
//! The core never draws anything itself. It hands fully prepared rows
//! (rounded temperatures, formatted percentages, `HH:MM` times) to a
//! [`Renderer`] supplied by the presentation layer.

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::{CurrentConditions, ForecastResult, Suggestion, WeatherCondition};

/// Shown in place of a value the provider left out.
pub const MISSING: &str = "n/a";

/// Label used when no place name could be resolved.
pub const UNNAMED_LOCATION: &str = "Your location";

/// Presentation layer callbacks.
pub trait Renderer: Send + Sync {
    fn render_summary(&self, city_label: &str, current: &CurrentSummary);

    fn render_day_list(&self, days: &[DayEntry]);

    fn render_hourly_detail(&self, day: &DayEntry, hours: &[HourlyRow]);

    fn show_status(&self, message: &str, is_error: bool);

    fn hide_status(&self);

    fn render_suggestions(&self, suggestions: &[Suggestion]);

    /// Replace the text of the search input.
    fn set_query_text(&self, text: &str);

    fn close_hourly_detail(&self);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentSummary {
    pub temperature: i64,
    pub wind: String,
    pub condition: WeatherCondition,
    pub description: &'static str,
    pub icon: &'static str,
    pub observed_at: String,
    pub is_day: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayEntry {
    pub index: usize,
    /// Date key (`YYYY-MM-DD`) as sent by the provider.
    pub date: String,
    /// e.g. "Wed, May 1"
    pub label: String,
    pub high: Option<i64>,
    pub low: Option<i64>,
    pub rain_chance: String,
    pub precipitation: String,
    pub wind: String,
    pub gusts: String,
    pub sunrise: String,
    pub sunset: String,
    pub condition: WeatherCondition,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRow {
    pub time: String,
    pub temperature: Option<i64>,
    pub humidity: String,
    pub rain_chance: String,
    pub wind: String,
    pub condition: WeatherCondition,
}

pub fn summarize(current: &CurrentConditions) -> CurrentSummary {
    let condition = current.condition();
    CurrentSummary {
        temperature: round(current.temperature),
        wind: format!("{} km/h", current.windspeed),
        condition,
        description: condition.description(),
        icon: condition.icon_name(),
        observed_at: time_of_day(&current.time),
        is_day: current.is_day.map_or(true, |d| d != 0),
    }
}

/// One entry per forecast day; the entry whose date equals `selected` is flagged.
pub fn day_entries(forecast: &ForecastResult, selected: Option<&str>) -> Vec<DayEntry> {
    let daily = &forecast.daily;
    daily
        .time
        .iter()
        .enumerate()
        .map(|(i, date)| DayEntry {
            index: i,
            date: date.clone(),
            label: day_label(date),
            high: daily.temperature_2m_max[i].map(round),
            low: daily.temperature_2m_min[i].map(round),
            rain_chance: percent(daily.precipitation_probability_max[i]),
            precipitation: with_unit(daily.precipitation_sum[i], "mm"),
            wind: with_unit(daily.windspeed_10m_max[i], "km/h"),
            gusts: with_unit(daily.windgusts_10m_max[i], "km/h"),
            sunrise: daily.sunrise[i]
                .as_deref()
                .map_or_else(|| MISSING.to_string(), time_of_day),
            sunset: daily.sunset[i]
                .as_deref()
                .map_or_else(|| MISSING.to_string(), time_of_day),
            condition: daily.weathercode[i]
                .map(WeatherCondition::from_wmo_code)
                .unwrap_or_default(),
            selected: selected == Some(date.as_str()),
        })
        .collect()
}

/// Hours whose timestamp falls on `day`, in provider order.
pub fn hourly_rows(forecast: &ForecastResult, day: &str) -> Vec<HourlyRow> {
    let hourly = &forecast.hourly;
    hourly
        .indices_for_day(day)
        .map(|i| HourlyRow {
            time: time_of_day(&hourly.time[i]),
            temperature: hourly.temperature_2m[i].map(round),
            humidity: percent(hourly.relative_humidity_2m[i]),
            rain_chance: percent(hourly.precipitation_probability[i]),
            wind: with_unit(hourly.windspeed_10m[i], "km/h"),
            condition: hourly.weathercode[i]
                .map(WeatherCondition::from_wmo_code)
                .unwrap_or_default(),
        })
        .collect()
}

/// Draw a freshly stored forecast: summary, day list with the first day
/// selected, and that day's hourly detail.
pub fn render_forecast(renderer: &dyn Renderer, city_label: &str, forecast: &ForecastResult) {
    renderer.render_summary(city_label, &summarize(&forecast.current));

    let days = day_entries(forecast, forecast.first_day());
    renderer.render_day_list(&days);
    if let Some(first) = days.first() {
        renderer.render_hourly_detail(first, &hourly_rows(forecast, &first.date));
    }
}

/// Redraw after the user picked another day.
pub fn render_selection(renderer: &dyn Renderer, forecast: &ForecastResult, day: &str) {
    let days = day_entries(forecast, Some(day));
    renderer.render_day_list(&days);
    if let Some(entry) = days.iter().find(|d| d.selected) {
        renderer.render_hourly_detail(entry, &hourly_rows(forecast, day));
    }
}

fn round(value: f64) -> i64 {
    value.round() as i64
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{}%", round(v)))
}

fn with_unit(value: Option<f64>, unit: &str) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{} {}", v, unit))
}

/// `2024-05-01T13:45` -> `13:45`
pub fn time_of_day(timestamp: &str) -> String {
    match timestamp.split_once('T') {
        Some((_, time)) => time.chars().take(5).collect(),
        None => timestamp.to_string(),
    }
}

/// `2024-05-01` -> `Wed, May 1`
pub fn day_label(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => d.format("%a, %b %-d").to_string(),
        Err(_) => date.to_string(),
    }
}
