use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// Weather condition categories mapped from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert WMO weather code to WeatherCondition
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1..=2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            56 | 57 => Self::Sleet, // Freezing drizzle
            61 | 63 | 80 => Self::Rain,
            65 | 81 | 82 => Self::HeavyRain,
            66 | 67 => Self::Sleet, // Freezing rain
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Clear, // Unknown codes default to clear
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::Sleet => "Sleet",
            Self::Thunderstorm => "Thunderstorm",
        }
    }

    /// Icon name for the presentation layer
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Clear => "sun",
            Self::PartlyCloudy => "cloud_sun",
            Self::Cloudy => "cloud",
            Self::Fog => "cloud_fog",
            Self::Drizzle | Self::Rain | Self::HeavyRain => "cloud_rain",
            Self::Snow | Self::Sleet => "cloud_snow",
            Self::Thunderstorm => "cloud_lightning",
        }
    }
}

/// Geographic position. Consumed by exactly one forecast fetch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// One autocomplete candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub display_name: String,
    pub coordinates: Coordinates,
}

/// `current_weather` block of the forecast response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub time: String,
    pub temperature: f64,
    pub windspeed: f64,
    #[serde(default)]
    pub winddirection: Option<f64>,
    pub weathercode: i32,
    #[serde(default)]
    pub is_day: Option<u8>,
}

impl CurrentConditions {
    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_wmo_code(self.weathercode)
    }
}

/// Per-day metrics. Every vector is index-aligned with `time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    pub time: Vec<String>,
    pub temperature_2m_max: Vec<Option<f64>>,
    pub temperature_2m_min: Vec<Option<f64>>,
    pub precipitation_sum: Vec<Option<f64>>,
    pub precipitation_probability_max: Vec<Option<f64>>,
    pub windspeed_10m_max: Vec<Option<f64>>,
    pub windgusts_10m_max: Vec<Option<f64>>,
    pub sunrise: Vec<Option<String>>,
    pub sunset: Vec<Option<String>>,
    pub weathercode: Vec<Option<i32>>,
}

/// Per-hour metrics. Every vector is index-aligned with `time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<String>,
    pub temperature_2m: Vec<Option<f64>>,
    pub relative_humidity_2m: Vec<Option<f64>>,
    pub precipitation_probability: Vec<Option<f64>>,
    pub windspeed_10m: Vec<Option<f64>>,
    pub weathercode: Vec<Option<i32>>,
}

impl HourlySeries {
    /// Indices of the hours whose timestamp falls on `day` (`YYYY-MM-DD`).
    pub fn indices_for_day<'a>(&'a self, day: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.time
            .iter()
            .enumerate()
            .filter(move |(_, ts)| date_component(ts) == day)
            .map(|(i, _)| i)
    }
}

/// Full provider response as fetched for one pair of coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(rename = "current_weather")]
    pub current: CurrentConditions,
    pub daily: DailySeries,
    pub hourly: HourlySeries,
}

impl ForecastResult {
    /// Check that every metric array lines up with its `time` array.
    pub fn validate(&self) -> Result<(), WeatherError> {
        let days = self.daily.time.len();
        let daily = [
            ("daily.temperature_2m_max", self.daily.temperature_2m_max.len()),
            ("daily.temperature_2m_min", self.daily.temperature_2m_min.len()),
            ("daily.precipitation_sum", self.daily.precipitation_sum.len()),
            (
                "daily.precipitation_probability_max",
                self.daily.precipitation_probability_max.len(),
            ),
            ("daily.windspeed_10m_max", self.daily.windspeed_10m_max.len()),
            ("daily.windgusts_10m_max", self.daily.windgusts_10m_max.len()),
            ("daily.sunrise", self.daily.sunrise.len()),
            ("daily.sunset", self.daily.sunset.len()),
            ("daily.weathercode", self.daily.weathercode.len()),
        ];
        check_aligned("daily.time", days, &daily)?;

        let hours = self.hourly.time.len();
        let hourly = [
            ("hourly.temperature_2m", self.hourly.temperature_2m.len()),
            ("hourly.relative_humidity_2m", self.hourly.relative_humidity_2m.len()),
            (
                "hourly.precipitation_probability",
                self.hourly.precipitation_probability.len(),
            ),
            ("hourly.windspeed_10m", self.hourly.windspeed_10m.len()),
            ("hourly.weathercode", self.hourly.weathercode.len()),
        ];
        check_aligned("hourly.time", hours, &hourly)?;

        if days == 0 {
            return Err(WeatherError::MalformedResponse(
                "daily.time is empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Date key of the first forecast day.
    pub fn first_day(&self) -> Option<&str> {
        self.daily.time.first().map(String::as_str)
    }

    pub fn day_count(&self) -> usize {
        self.daily.time.len()
    }
}

fn check_aligned(
    key: &str,
    expected: usize,
    metrics: &[(&str, usize)],
) -> Result<(), WeatherError> {
    for (name, len) in metrics {
        if *len != expected {
            return Err(WeatherError::MalformedResponse(format!(
                "{} has {} entries but {} has {}",
                name, len, key, expected
            )));
        }
    }
    Ok(())
}

/// `2024-05-01T13:00` -> `2024-05-01`
pub(crate) fn date_component(timestamp: &str) -> &str {
    timestamp.split('T').next().unwrap_or(timestamp)
}


#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: serde_json::Value) -> ForecastResult {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_wmo_code_mapping() {
        assert_eq!(WeatherCondition::from_wmo_code(0), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(2), WeatherCondition::PartlyCloudy);
        assert_eq!(WeatherCondition::from_wmo_code(48), WeatherCondition::Fog);
        assert_eq!(WeatherCondition::from_wmo_code(57), WeatherCondition::Sleet);
        assert_eq!(WeatherCondition::from_wmo_code(82), WeatherCondition::HeavyRain);
        assert_eq!(WeatherCondition::from_wmo_code(86), WeatherCondition::Snow);
        assert_eq!(WeatherCondition::from_wmo_code(99), WeatherCondition::Thunderstorm);
    }

    #[test]
    fn test_wmo_code_unknown_defaults_to_clear() {
        assert_eq!(WeatherCondition::from_wmo_code(999), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(-1), WeatherCondition::Clear);
    }

    #[test]
    fn test_condition_labels() {
        assert_eq!(WeatherCondition::Thunderstorm.description(), "Thunderstorm");
        assert_eq!(WeatherCondition::Rain.icon_name(), "cloud_rain");
    }

    #[test]
    fn test_aligned_response_validates() {
        let result = parse(fixtures::forecast_json(7));
        assert!(result.validate().is_ok());
        assert_eq!(result.day_count(), 7);
        assert_eq!(result.first_day(), Some("2024-05-01"));
        assert_eq!(result.current.condition(), WeatherCondition::PartlyCloudy);
    }

    #[test]
    fn test_short_daily_metric_is_malformed() {
        let mut json = fixtures::forecast_json(7);
        json["daily"]["temperature_2m_max"] = serde_json::json!([20.0, 21.0]);
        let err = parse(json).validate().unwrap_err();
        match err {
            WeatherError::MalformedResponse(msg) => {
                assert!(msg.contains("daily.temperature_2m_max"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_long_hourly_metric_is_malformed() {
        let mut json = fixtures::forecast_json(1);
        json["hourly"]["windspeed_10m"]
            .as_array_mut()
            .unwrap()
            .push(serde_json::json!(1.0));
        let err = parse(json).validate().unwrap_err();
        assert!(matches!(err, WeatherError::MalformedResponse(m) if m.contains("hourly.windspeed_10m")));
    }

    #[test]
    fn test_empty_daily_is_malformed() {
        let result = parse(fixtures::forecast_json(0));
        assert!(matches!(
            result.validate(),
            Err(WeatherError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_null_metrics_are_accepted() {
        let mut json = fixtures::forecast_json(2);
        json["daily"]["precipitation_probability_max"] = serde_json::json!([null, 40]);
        let result = parse(json);
        assert!(result.validate().is_ok());
        assert_eq!(result.daily.precipitation_probability_max[0], None);
    }

    #[test]
    fn test_hourly_indices_for_day() {
        let result = parse(fixtures::forecast_json(3));
        let idx: Vec<usize> = result.hourly.indices_for_day("2024-05-02").collect();
        assert_eq!(idx.len(), 24);
        assert_eq!(idx[0], 24);
        assert_eq!(idx[23], 47);
        assert_eq!(result.hourly.indices_for_day("2024-06-01").count(), 0);
    }

    #[test]
    fn test_date_component() {
        assert_eq!(date_component("2024-05-01T13:00"), "2024-05-01");
        assert_eq!(date_component("2024-05-01"), "2024-05-01");
    }
}
