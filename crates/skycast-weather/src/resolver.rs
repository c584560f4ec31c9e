//! Location resolution and forecast fetch, one run per trigger.
//!
//! ```text
//! Start -> (geolocation | search | selection)
//!       -> ResolvedWithName | ResolvedWithoutName
//!       -> FetchingForecast -> Done | Failed
//! ```
//!
//! Every run takes a number from a monotonically increasing counter. After
//! each await-point a run whose number is no longer the latest stops as
//! `Superseded` and leaves the store and the status line to the newer run.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::WeatherError;
use crate::geocode::GeoProvider;
use crate::location::GeolocationSource;
use crate::provider::WeatherProvider;
use crate::render::{self, Renderer, UNNAMED_LOCATION};
use crate::status::{StatusReporter, LOADING_WEATHER, SEARCHING_CITY};
use crate::store::ForecastStore;
use crate::types::{Coordinates, Suggestion};

const DEFAULT_GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// What started a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// Page load: ask the device where it is.
    Geolocation,
    /// Free-text city submitted from the search form.
    Search(String),
    /// A picked autocomplete suggestion.
    Selection(Suggestion),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResolverState {
    #[default]
    Idle,
    Start,
    ResolvedWithName {
        coordinates: Coordinates,
        name: String,
    },
    ResolvedWithoutName {
        coordinates: Coordinates,
    },
    FetchingForecast,
    Done,
    Failed,
}

#[derive(Debug)]
pub enum RunOutcome {
    Done { label: String },
    Failed(WeatherError),
    /// A newer run started before this one finished; its result was dropped.
    Superseded,
    /// Nothing to do (blank search).
    Ignored,
}

impl RunOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, RunOutcome::Done { .. })
    }
}

enum Halt {
    Failed(WeatherError),
    Superseded,
}

impl From<WeatherError> for Halt {
    fn from(e: WeatherError) -> Self {
        Halt::Failed(e)
    }
}

pub struct LocationResolver {
    geo: Arc<dyn GeoProvider>,
    weather: Arc<dyn WeatherProvider>,
    device: Arc<dyn GeolocationSource>,
    store: Arc<ForecastStore>,
    renderer: Arc<dyn Renderer>,
    status: StatusReporter,
    geolocation_timeout: Duration,
    sequence: AtomicU64,
    state: Mutex<ResolverState>,
}

impl LocationResolver {
    pub fn new(
        geo: Arc<dyn GeoProvider>,
        weather: Arc<dyn WeatherProvider>,
        device: Arc<dyn GeolocationSource>,
        store: Arc<ForecastStore>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            geo,
            weather,
            device,
            store,
            status: StatusReporter::new(renderer.clone()),
            renderer,
            geolocation_timeout: DEFAULT_GEOLOCATION_TIMEOUT,
            sequence: AtomicU64::new(0),
            state: Mutex::new(ResolverState::Idle),
        }
    }

    pub fn with_geolocation_timeout(mut self, timeout: Duration) -> Self {
        self.geolocation_timeout = timeout;
        self
    }

    /// State reached by the latest run.
    pub fn state(&self) -> ResolverState {
        self.state.lock().clone()
    }

    /// Number of the most recently started run.
    pub fn latest_run(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    pub fn store(&self) -> &Arc<ForecastStore> {
        &self.store
    }

    /// Drive one run to a terminal state. Errors are reported on the status
    /// line here and returned for inspection, never propagated further.
    pub async fn run(&self, trigger: Trigger) -> RunOutcome {
        // A blank search is not a new trigger and must not supersede a run.
        let trigger = match trigger {
            Trigger::Search(query) if query.trim().is_empty() => {
                tracing::debug!("Ignoring blank search");
                return RunOutcome::Ignored;
            }
            Trigger::Search(query) => Trigger::Search(query.trim().to_string()),
            other => other,
        };

        let run = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(run, ?trigger, "Resolver run started");
        self.transition(run, ResolverState::Start);

        match self.execute(run, trigger).await {
            Ok(label) => RunOutcome::Done { label },
            Err(Halt::Superseded) => {
                tracing::debug!(run, "Run superseded, result discarded");
                RunOutcome::Superseded
            }
            Err(Halt::Failed(error)) => {
                if !self.is_latest(run) {
                    tracing::debug!(run, "Superseded run failed: {}", error);
                    return RunOutcome::Superseded;
                }
                self.transition(run, ResolverState::Failed);
                self.status.failure(&error);
                RunOutcome::Failed(error)
            }
        }
    }

    async fn execute(&self, run: u64, trigger: Trigger) -> Result<String, Halt> {
        let (coordinates, name) = match trigger {
            Trigger::Geolocation => self.locate(run).await?,
            Trigger::Search(query) => self.search(run, &query).await?,
            Trigger::Selection(suggestion) => {
                (suggestion.coordinates, Some(suggestion.display_name))
            }
        };

        let label = match name {
            Some(name) => {
                self.transition(
                    run,
                    ResolverState::ResolvedWithName {
                        coordinates,
                        name: name.clone(),
                    },
                );
                name
            }
            None => {
                self.transition(run, ResolverState::ResolvedWithoutName { coordinates });
                UNNAMED_LOCATION.to_string()
            }
        };

        self.transition(run, ResolverState::FetchingForecast);
        self.status.progress(LOADING_WEATHER);

        let forecast = self.weather.fetch_forecast(coordinates).await;
        self.ensure_latest(run)?;
        let forecast = forecast?;
        forecast.validate()?;

        let forecast = self.store.set(forecast, label.clone());
        self.status.clear();
        render::render_forecast(self.renderer.as_ref(), &label, &forecast);
        self.transition(run, ResolverState::Done);

        tracing::info!(
            run,
            "Forecast for {} ({}) loaded: {} days",
            label,
            coordinates,
            forecast.day_count()
        );
        Ok(label)
    }

    async fn locate(&self, run: u64) -> Result<(Coordinates, Option<String>), Halt> {
        let position =
            match tokio::time::timeout(self.geolocation_timeout, self.device.current_position())
                .await
            {
                Ok(result) => result,
                Err(_) => Err(WeatherError::GeolocationTimeout),
            };
        self.ensure_latest(run)?;
        let position = position?;

        // Best effort: a missing name never blocks the forecast.
        let name = match self.geo.reverse_geocode(position).await {
            Ok(name) => Some(name),
            Err(e) => {
                tracing::warn!("Reverse geocoding {} failed: {}", position, e);
                None
            }
        };
        self.ensure_latest(run)?;

        Ok((position, name))
    }

    async fn search(&self, run: u64, query: &str) -> Result<(Coordinates, Option<String>), Halt> {
        self.status.progress(SEARCHING_CITY);
        let found = self.geo.forward_geocode(query).await;
        self.ensure_latest(run)?;
        let found = found?;

        Ok((found.coordinates, Some(query.to_string())))
    }

    fn is_latest(&self, run: u64) -> bool {
        self.sequence.load(Ordering::SeqCst) == run
    }

    fn ensure_latest(&self, run: u64) -> Result<(), Halt> {
        if self.is_latest(run) {
            Ok(())
        } else {
            Err(Halt::Superseded)
        }
    }

    fn transition(&self, run: u64, next: ResolverState) {
        if !self.is_latest(run) {
            return;
        }
        tracing::debug!(run, state = ?next, "Resolver transition");
        *self.state.lock() = next;
    }
}
