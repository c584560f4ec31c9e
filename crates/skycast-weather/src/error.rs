//! Weather lookup error types.

use skycast_core::{AppError, NetworkError, ReqwestErrorExt};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Location permission denied")]
    GeolocationDenied,

    #[error("Location service unavailable")]
    GeolocationUnavailable,

    #[error("Location request timed out")]
    GeolocationTimeout,

    #[error("No geocoding match for: {0}")]
    NotFound(String),

    #[error("Search query is empty")]
    EmptyQuery,

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self {
        WeatherError::Network(e.into_network_error())
    }
}

impl WeatherError {
    /// Status line shown to the user when a run ends with this error.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::GeolocationDenied | Self::GeolocationTimeout => {
                "Could not get your location. Please enter a city."
            }
            Self::GeolocationUnavailable => {
                "Geolocation is not supported on this device. Please enter a city."
            }
            Self::NotFound(_) => "City not found.",
            Self::EmptyQuery => "Please enter a city.",
            Self::Network(_) | Self::MalformedResponse(_) => "Failed to load weather data.",
        }
    }

    /// Whether the failure happened before any coordinates were known.
    pub fn is_location_failure(&self) -> bool {
        matches!(
            self,
            Self::GeolocationDenied
                | Self::GeolocationUnavailable
                | Self::GeolocationTimeout
                | Self::NotFound(_)
                | Self::EmptyQuery
        )
    }
}

impl From<WeatherError> for AppError {
    fn from(e: WeatherError) -> Self {
        if e.is_location_failure() {
            AppError::Location(e.to_string())
        } else {
            match e {
                WeatherError::Network(n) => AppError::Network(n),
                other => AppError::Weather(other.to_string()),
            }
        }
    }
}
