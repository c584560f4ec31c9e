//! Forward and reverse geocoding against Nominatim (OpenStreetMap).
//! Free, no API key required, but an identifying User-Agent is mandatory.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use skycast_core::GeocodingConfig;
use std::time::Duration;
use tracing::instrument;

use crate::error::WeatherError;
use crate::types::{Coordinates, Suggestion};

const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";
const NOMINATIM_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("Skycast/", env!("CARGO_PKG_VERSION"), " (weather lookup)");

/// Best match for a free-text search.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    pub coordinates: Coordinates,
    pub display_name: Option<String>,
}

/// Coordinate <-> place name lookups.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// First match for `query`. Zero matches is `WeatherError::NotFound`.
    async fn forward_geocode(&self, query: &str) -> Result<GeocodeMatch, WeatherError>;

    /// Up to `limit` ranked candidates. Zero matches is an empty list.
    async fn forward_geocode_many(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Suggestion>, WeatherError>;

    /// Human-readable name for a position.
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<String, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimReverse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl NominatimAddress {
    /// city > town > village > state
    fn place(&self) -> Option<&str> {
        [&self.city, &self.town, &self.village, &self.state]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .find(|s| !s.is_empty())
    }

    /// "<place>, <country>", skipping whichever part is missing.
    fn label(&self) -> Option<String> {
        let parts: Vec<&str> = [self.place(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

impl NominatimPlace {
    fn coordinates(&self) -> Result<Coordinates, WeatherError> {
        let lat = self.lat.trim().parse::<f64>().map_err(|e| {
            WeatherError::MalformedResponse(format!("lat {:?}: {}", self.lat, e))
        })?;
        let lon = self.lon.trim().parse::<f64>().map_err(|e| {
            WeatherError::MalformedResponse(format!("lon {:?}: {}", self.lon, e))
        })?;
        Ok(Coordinates::new(lat, lon))
    }

    fn label(&self) -> Option<String> {
        self.address
            .as_ref()
            .and_then(NominatimAddress::label)
            .or_else(|| self.display_name.clone())
    }
}

/// Nominatim HTTP client.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: Client,
    search_url: String,
    reverse_url: String,
}

impl NominatimClient {
    pub fn new() -> Result<Self, WeatherError> {
        Self::with_endpoints(
            NOMINATIM_SEARCH_URL,
            NOMINATIM_REVERSE_URL,
            USER_AGENT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn from_config(config: &GeocodingConfig) -> Result<Self, WeatherError> {
        Self::with_endpoints(
            &config.search_url,
            &config.reverse_url,
            &config.user_agent,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn with_endpoints(
        search_url: &str,
        reverse_url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            search_url: search_url.to_string(),
            reverse_url: reverse_url.to_string(),
        })
    }

    async fn search(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<NominatimPlace>, WeatherError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WeatherError::EmptyQuery);
        }

        let mut params: Vec<(&str, String)> = vec![
            ("format", "json".to_string()),
            ("q", query.to_string()),
        ];
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
            params.push(("addressdetails", "1".to_string()));
        }

        let response = self
            .client
            .get(&self.search_url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| WeatherError::MalformedResponse(format!("geocoding search: {}", e)))
    }
}

#[async_trait]
impl GeoProvider for NominatimClient {
    #[instrument(skip(self), level = "info")]
    async fn forward_geocode(&self, query: &str) -> Result<GeocodeMatch, WeatherError> {
        let places = self.search(query, None).await?;

        let best = places
            .first()
            .ok_or_else(|| WeatherError::NotFound(query.trim().to_string()))?;

        let found = GeocodeMatch {
            coordinates: best.coordinates()?,
            display_name: best.label(),
        };
        tracing::debug!("Geocoded {:?} to {}", query, found.coordinates);
        Ok(found)
    }

    #[instrument(skip(self), level = "debug")]
    async fn forward_geocode_many(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Suggestion>, WeatherError> {
        let places = self.search(query, Some(limit)).await?;

        let mut suggestions = Vec::with_capacity(places.len().min(limit));
        for place in places.iter().take(limit) {
            let coordinates = place.coordinates()?;
            let Some(display_name) = place.label() else {
                tracing::debug!("Skipping unnamed place at {}", coordinates);
                continue;
            };
            suggestions.push(Suggestion {
                display_name,
                coordinates,
            });
        }

        Ok(suggestions)
    }

    #[instrument(skip(self), level = "info")]
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<String, WeatherError> {
        let response = self
            .client
            .get(&self.reverse_url)
            .query(&[
                ("format", "json".to_string()),
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        let reverse: NominatimReverse = serde_json::from_str(&body)
            .map_err(|e| WeatherError::MalformedResponse(format!("reverse geocoding: {}", e)))?;

        let address = reverse
            .address
            .ok_or_else(|| WeatherError::NotFound(coordinates.to_string()))?;

        let name = address
            .place()
            .map(str::to_string)
            .ok_or_else(|| WeatherError::NotFound(coordinates.to_string()))?;

        tracing::info!("Reverse geocoded to: {}", name);
        Ok(name)
    }
}
