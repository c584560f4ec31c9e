//! Device position sources.

use async_trait::async_trait;
use skycast_core::LocationConfig;

use crate::error::WeatherError;
use crate::types::Coordinates;

/// Where the device thinks it is.
///
/// Implementations report `GeolocationDenied` or `GeolocationUnavailable`;
/// the caller bounds the wait and turns a timeout into `GeolocationTimeout`.
#[async_trait]
pub trait GeolocationSource: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, WeatherError>;
}

/// A position pinned in configuration.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation {
    coordinates: Coordinates,
}

impl FixedLocation {
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl GeolocationSource for FixedLocation {
    async fn current_position(&self) -> Result<Coordinates, WeatherError> {
        Ok(self.coordinates)
    }
}

/// Platform without any position service.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

#[async_trait]
impl GeolocationSource for NoGeolocation {
    async fn current_position(&self) -> Result<Coordinates, WeatherError> {
        Err(WeatherError::GeolocationUnavailable)
    }
}

/// Pick the source for the configured platform.
pub fn from_config(config: &LocationConfig) -> Box<dyn GeolocationSource> {
    match config.position() {
        Some((lat, lon)) => Box::new(FixedLocation::new(Coordinates::new(lat, lon))),
        None => Box::new(NoGeolocation),
    }
}
