//! In-memory providers for unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use skycast_core::NetworkError;

use crate::error::WeatherError;
use crate::geocode::{GeoProvider, GeocodeMatch};
use crate::location::GeolocationSource;
use crate::provider::WeatherProvider;
use crate::types::fixtures::forecast_json;
use crate::types::{Coordinates, ForecastResult, Suggestion};

pub fn forecast(days: usize) -> ForecastResult {
    serde_json::from_value(forecast_json(days)).unwrap()
}

/// Forecast distinguishable by its latitude.
pub fn forecast_at(latitude: f64, days: usize) -> ForecastResult {
    let mut f = forecast(days);
    f.latitude = latitude;
    f
}

pub fn suggestion(name: &str, lat: f64, lon: f64) -> Suggestion {
    Suggestion {
        display_name: name.to_string(),
        coordinates: Coordinates::new(lat, lon),
    }
}

#[derive(Default)]
pub struct FakeGeo {
    places: Mutex<HashMap<String, Vec<Suggestion>>>,
    delays: Mutex<HashMap<String, Duration>>,
    reverse_name: Mutex<Option<String>>,
    offline: Mutex<bool>,
    forward_calls: Mutex<Vec<String>>,
    many_calls: Mutex<Vec<(String, usize)>>,
}

impl FakeGeo {
    pub fn with_place(self, query: &str, results: Vec<Suggestion>) -> Self {
        self.places.lock().insert(query.to_string(), results);
        self
    }

    pub fn with_delay(self, query: &str, delay: Duration) -> Self {
        self.delays.lock().insert(query.to_string(), delay);
        self
    }

    pub fn with_reverse_name(self, name: &str) -> Self {
        *self.reverse_name.lock() = Some(name.to_string());
        self
    }

    pub fn offline(self) -> Self {
        *self.offline.lock() = true;
        self
    }

    pub fn forward_calls(&self) -> Vec<String> {
        self.forward_calls.lock().clone()
    }

    pub fn many_calls(&self) -> Vec<(String, usize)> {
        self.many_calls.lock().clone()
    }

    fn check_online(&self) -> Result<(), WeatherError> {
        if *self.offline.lock() {
            Err(WeatherError::Network(NetworkError::ConnectionFailed(
                "offline".to_string(),
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GeoProvider for FakeGeo {
    async fn forward_geocode(&self, query: &str) -> Result<GeocodeMatch, WeatherError> {
        self.forward_calls.lock().push(query.to_string());
        self.check_online()?;
        let first = self
            .places
            .lock()
            .get(query)
            .and_then(|r| r.first().cloned())
            .ok_or_else(|| WeatherError::NotFound(query.to_string()))?;
        Ok(GeocodeMatch {
            coordinates: first.coordinates,
            display_name: Some(first.display_name),
        })
    }

    async fn forward_geocode_many(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Suggestion>, WeatherError> {
        self.many_calls.lock().push((query.to_string(), limit));
        let delay = self.delays.lock().get(query).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_online()?;
        let mut results = self.places.lock().get(query).cloned().unwrap_or_default();
        results.truncate(limit);
        Ok(results)
    }

    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<String, WeatherError> {
        self.check_online()?;
        self.reverse_name
            .lock()
            .clone()
            .ok_or_else(|| WeatherError::NotFound(coordinates.to_string()))
    }
}

/// Answers forecast requests from a queue, one entry per call.
#[derive(Default)]
pub struct FakeWeather {
    queue: Mutex<VecDeque<(Duration, Result<ForecastResult, WeatherError>)>>,
    calls: Mutex<Vec<Coordinates>>,
}

impl FakeWeather {
    pub fn respond(self, response: Result<ForecastResult, WeatherError>) -> Self {
        self.respond_after(Duration::ZERO, response)
    }

    pub fn respond_after(
        self,
        delay: Duration,
        response: Result<ForecastResult, WeatherError>,
    ) -> Self {
        self.queue.lock().push_back((delay, response));
        self
    }

    pub fn calls(&self) -> Vec<Coordinates> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn fetch_forecast(
        &self,
        coordinates: Coordinates,
    ) -> Result<ForecastResult, WeatherError> {
        self.calls.lock().push(coordinates);
        let next = self.queue.lock().pop_front();
        match next {
            Some((delay, response)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                response
            }
            None => Err(WeatherError::Network(NetworkError::ConnectionFailed(
                "no response queued".to_string(),
            ))),
        }
    }
}

pub enum FakeDevice {
    At(Coordinates),
    Denied,
    Unsupported,
    Hangs,
}

#[async_trait]
impl GeolocationSource for FakeDevice {
    async fn current_position(&self) -> Result<Coordinates, WeatherError> {
        match self {
            FakeDevice::At(c) => Ok(*c),
            FakeDevice::Denied => Err(WeatherError::GeolocationDenied),
            FakeDevice::Unsupported => Err(WeatherError::GeolocationUnavailable),
            FakeDevice::Hangs => std::future::pending().await,
        }
    }
}
