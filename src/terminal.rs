//! Plain-text renderer printing to stdout.

use skycast_weather::render::MISSING;
use skycast_weather::{CurrentSummary, DayEntry, HourlyRow, Renderer, Suggestion};
use tokio::sync::Notify;

#[derive(Default)]
pub struct TerminalRenderer {
    suggestions: Notify,
}

impl TerminalRenderer {
    /// Resolves once the next suggestion list has been printed.
    pub async fn suggestions_drawn(&self) {
        self.suggestions.notified().await;
    }
}

fn degrees(value: Option<i64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{}°C", v))
}

impl Renderer for TerminalRenderer {
    fn render_summary(&self, city_label: &str, current: &CurrentSummary) {
        println!();
        println!("{}", city_label);
        println!(
            "  {}°C  {}  wind {}  (observed {}{})",
            current.temperature,
            current.description,
            current.wind,
            current.observed_at,
            if current.is_day { "" } else { ", night" }
        );
    }

    fn render_day_list(&self, days: &[DayEntry]) {
        println!();
        for day in days {
            println!(
                "{} {:<12} {:>6} / {:<6} {:<16} rain {:>4} {:>8}  wind {} (gusts {})  sun {}-{}",
                if day.selected { ">" } else { " " },
                day.label,
                degrees(day.high),
                degrees(day.low),
                day.condition.description(),
                day.rain_chance,
                day.precipitation,
                day.wind,
                day.gusts,
                day.sunrise,
                day.sunset,
            );
        }
    }

    fn render_hourly_detail(&self, day: &DayEntry, hours: &[HourlyRow]) {
        println!();
        println!("Hourly for {}", day.label);
        for hour in hours {
            println!(
                "  {}  {:>6}  humidity {:>4}  rain {:>4}  wind {:<10}  {}",
                hour.time,
                degrees(hour.temperature),
                hour.humidity,
                hour.rain_chance,
                hour.wind,
                hour.condition.description(),
            );
        }
    }

    fn show_status(&self, message: &str, is_error: bool) {
        if is_error {
            eprintln!("error: {}", message);
        } else {
            eprintln!("{}", message);
        }
    }

    fn hide_status(&self) {}

    fn render_suggestions(&self, suggestions: &[Suggestion]) {
        for (i, suggestion) in suggestions.iter().enumerate() {
            println!(
                "{:>2}. {}  ({})",
                i + 1,
                suggestion.display_name,
                suggestion.coordinates
            );
        }
        self.suggestions.notify_one();
    }

    fn set_query_text(&self, text: &str) {
        println!();
        println!("Selected: {}", text);
    }

    fn close_hourly_detail(&self) {}
}
