//! Weather lookup widget core for Skycast
//!
//! Resolves a place (device position, typed city or picked suggestion) to
//! coordinates, fetches a multi-day forecast from Open-Meteo and drives a
//! [`Renderer`] with the prepared summary, day list and hourly detail.

pub mod autocomplete;
pub mod debounce;
pub mod error;
pub mod geocode;
pub mod location;
pub mod provider;
pub mod render;
pub mod resolver;
pub mod status;
pub mod store;
pub mod types;
pub mod widget;

#[cfg(test)]
mod fakes;

pub use autocomplete::AutocompleteController;
pub use debounce::Debouncer;
pub use error::WeatherError;
pub use geocode::{GeoProvider, GeocodeMatch, NominatimClient};
pub use location::{FixedLocation, GeolocationSource, NoGeolocation};
pub use provider::{OpenMeteoClient, WeatherProvider};
pub use render::{CurrentSummary, DayEntry, HourlyRow, Renderer};
pub use resolver::{LocationResolver, ResolverState, RunOutcome, Trigger};
pub use status::StatusReporter;
pub use store::ForecastStore;
pub use types::*;
pub use widget::{Dispatch, ForecastWidget, WidgetEvent};
