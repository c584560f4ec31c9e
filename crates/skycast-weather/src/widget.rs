//! Event dispatch for the weather widget.
//!
//! The presentation layer turns user interaction into [`WidgetEvent`]s and
//! hands them to [`ForecastWidget::dispatch`]; everything it needs to draw
//! comes back through its [`Renderer`].

use skycast_core::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::autocomplete::AutocompleteController;
use crate::error::WeatherError;
use crate::geocode::{GeoProvider, NominatimClient};
use crate::location::{self, GeolocationSource};
use crate::provider::{OpenMeteoClient, WeatherProvider};
use crate::render::{self, Renderer};
use crate::resolver::{LocationResolver, RunOutcome, Trigger};
use crate::store::ForecastStore;

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    /// Widget shown for the first time: try the device position.
    PageLoaded,
    SearchSubmitted(String),
    QueryChanged(String),
    SuggestionChosen(usize),
    /// Interaction anywhere outside the search input and its suggestions.
    OutsideClick,
    DaySelected(usize),
    DetailClosed,
}

#[derive(Debug)]
pub enum Dispatch {
    /// A resolution run is in progress in the background.
    Run(JoinHandle<RunOutcome>),
    Handled,
    /// The event did not apply (unknown suggestion or day, nothing loaded yet).
    Ignored,
}

impl Dispatch {
    /// Wait for the run started by this event, if any.
    pub async fn finished(self) -> Option<RunOutcome> {
        match self {
            Dispatch::Run(handle) => match handle.await {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    tracing::error!("Resolver task failed: {}", e);
                    None
                }
            },
            Dispatch::Handled | Dispatch::Ignored => None,
        }
    }
}

pub struct ForecastWidget {
    resolver: Arc<LocationResolver>,
    autocomplete: Arc<AutocompleteController>,
    store: Arc<ForecastStore>,
    renderer: Arc<dyn Renderer>,
}

impl ForecastWidget {
    pub fn new(
        geo: Arc<dyn GeoProvider>,
        weather: Arc<dyn WeatherProvider>,
        device: Arc<dyn GeolocationSource>,
        renderer: Arc<dyn Renderer>,
        config: &Config,
    ) -> Self {
        let store = Arc::new(ForecastStore::new());
        let resolver = Arc::new(
            LocationResolver::new(
                geo.clone(),
                weather,
                device,
                store.clone(),
                renderer.clone(),
            )
            .with_geolocation_timeout(Duration::from_secs(config.location.timeout_secs)),
        );
        let autocomplete = Arc::new(
            AutocompleteController::new(geo, resolver.clone(), renderer.clone())
                .with_config(&config.autocomplete),
        );

        Self {
            resolver,
            autocomplete,
            store,
            renderer,
        }
    }

    /// Widget backed by Open-Meteo, Nominatim and the configured device position.
    pub fn from_config(config: &Config, renderer: Arc<dyn Renderer>) -> Result<Self, WeatherError> {
        let geo = Arc::new(NominatimClient::from_config(&config.geocoding)?);
        let weather = Arc::new(OpenMeteoClient::from_config(&config.weather)?);
        let device: Arc<dyn GeolocationSource> = Arc::from(location::from_config(&config.location));

        Ok(Self::new(geo, weather, device, renderer, config))
    }

    pub fn store(&self) -> &Arc<ForecastStore> {
        &self.store
    }

    pub fn resolver(&self) -> &Arc<LocationResolver> {
        &self.resolver
    }

    pub fn autocomplete(&self) -> &Arc<AutocompleteController> {
        &self.autocomplete
    }

    /// Route one event to its handler. Must be called inside a tokio runtime.
    pub fn dispatch(&self, event: WidgetEvent) -> Dispatch {
        tracing::debug!(?event, "Dispatching widget event");
        match event {
            WidgetEvent::PageLoaded => self.start(Trigger::Geolocation),
            WidgetEvent::SearchSubmitted(text) => {
                self.autocomplete.dismiss();
                self.start(Trigger::Search(text))
            }
            WidgetEvent::QueryChanged(text) => {
                self.autocomplete.on_input(&text);
                Dispatch::Handled
            }
            WidgetEvent::SuggestionChosen(index) => match self.autocomplete.select(index) {
                Some(chosen) => self.start(Trigger::Selection(chosen)),
                None => Dispatch::Ignored,
            },
            WidgetEvent::OutsideClick => {
                self.autocomplete.dismiss();
                Dispatch::Handled
            }
            WidgetEvent::DaySelected(index) => self.select_day(index),
            WidgetEvent::DetailClosed => {
                self.renderer.close_hourly_detail();
                Dispatch::Handled
            }
        }
    }

    fn start(&self, trigger: Trigger) -> Dispatch {
        let resolver = self.resolver.clone();
        Dispatch::Run(tokio::spawn(async move { resolver.run(trigger).await }))
    }

    fn select_day(&self, index: usize) -> Dispatch {
        match self.store.select_day(index) {
            Some((forecast, day)) => {
                render::render_selection(self.renderer.as_ref(), &forecast, &day);
                Dispatch::Handled
            }
            None => {
                tracing::debug!("No forecast day at index {}", index);
                Dispatch::Ignored
            }
        }
    }
}
