use async_trait::async_trait;
use reqwest::Client;
use skycast_core::WeatherConfig;
use std::time::Duration;
use tracing::instrument;

use crate::error::WeatherError;
use crate::types::{Coordinates, ForecastResult};

const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";
const REQUEST_TIMEOUT_SECS: u64 = 10;

pub const DAILY_METRICS: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum,\
precipitation_probability_max,windspeed_10m_max,windgusts_10m_max,sunrise,sunset,weathercode";

pub const HOURLY_METRICS: &str =
    "temperature_2m,relative_humidity_2m,precipitation_probability,windspeed_10m,weathercode";

/// Source of forecasts.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current conditions plus the fixed daily/hourly metric set for a position.
    async fn fetch_forecast(&self, coordinates: Coordinates)
        -> Result<ForecastResult, WeatherError>;
}

/// Open-Meteo forecast client.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new() -> Result<Self, WeatherError> {
        Self::with_base_url(OPEN_METEO_URL, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn from_config(config: &WeatherConfig) -> Result<Self, WeatherError> {
        Self::with_base_url(
            &config.forecast_url,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    #[instrument(skip(self), level = "info")]
    async fn fetch_forecast(
        &self,
        coordinates: Coordinates,
    ) -> Result<ForecastResult, WeatherError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", coordinates.latitude.to_string()),
                ("longitude", coordinates.longitude.to_string()),
                ("current_weather", "true".to_string()),
                ("daily", DAILY_METRICS.to_string()),
                ("hourly", HOURLY_METRICS.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Forecast request returned status {}", status);
        }
        let response = response.error_for_status()?;

        let body = response.text().await?;
        let forecast: ForecastResult = serde_json::from_str(&body)
            .map_err(|e| WeatherError::MalformedResponse(format!("forecast: {}", e)))?;
        forecast.validate()?;

        tracing::debug!(
            "Fetched {} days / {} hours for {}",
            forecast.daily.time.len(),
            forecast.hourly.time.len(),
            coordinates
        );
        Ok(forecast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::forecast_json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenMeteoClient {
        OpenMeteoClient::with_base_url(
            &format!("{}/v1/forecast", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_forecast_sends_fixed_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "52.52"))
            .and(query_param("longitude", "13.405"))
            .and(query_param("current_weather", "true"))
            .and(query_param("daily", DAILY_METRICS))
            .and(query_param("hourly", HOURLY_METRICS))
            .and(query_param("timezone", "auto"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(7)))
            .expect(1)
            .mount(&server)
            .await;

        let forecast = client_for(&server)
            .fetch_forecast(Coordinates::new(52.52, 13.405))
            .await
            .unwrap();

        assert_eq!(forecast.daily.time.len(), 7);
        assert_eq!(forecast.hourly.time.len(), 7 * 24);
        assert_eq!(forecast.timezone.as_deref(), Some("Europe/Berlin"));
    }

    #[tokio::test]
    async fn test_http_error_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_forecast(Coordinates::new(52.52, 13.405))
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::Network(_)));
    }

    #[tokio::test]
    async fn test_missing_daily_block_is_malformed() {
        let server = MockServer::start().await;
        let mut body = forecast_json(3);
        body.as_object_mut().unwrap().remove("daily");
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_forecast(Coordinates::new(52.52, 13.405))
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_misaligned_arrays_are_malformed() {
        let server = MockServer::start().await;
        let mut body = forecast_json(7);
        body["daily"]["sunset"] = serde_json::json!(["2024-05-01T20:48"]);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_forecast(Coordinates::new(52.52, 13.405))
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::MalformedResponse(m) if m.contains("daily.sunset")));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = OpenMeteoClient::with_base_url(
            "http://127.0.0.1:9/v1/forecast",
            Duration::from_secs(2),
        )
        .unwrap();

        let err = client
            .fetch_forecast(Coordinates::new(0.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::Network(_)));
    }
}
