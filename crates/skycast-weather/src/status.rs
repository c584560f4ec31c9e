//! Loading and error status lines.

use std::sync::Arc;

use crate::error::WeatherError;
use crate::render::Renderer;

pub const SEARCHING_CITY: &str = "Searching city...";
pub const LOADING_WEATHER: &str = "Loading weather...";
pub const SUGGESTIONS_FAILED: &str = "Could not load suggestions.";

#[derive(Clone)]
pub struct StatusReporter {
    renderer: Arc<dyn Renderer>,
}

impl StatusReporter {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self { renderer }
    }

    pub fn progress(&self, message: &str) {
        self.renderer.show_status(message, false);
    }

    /// Surface a failed run. The error is logged as well, never only logged.
    pub fn failure(&self, error: &WeatherError) {
        self.renderer.show_status(error.user_message(), true);
        tracing::warn!("Lookup failed: {}", error);
    }

    pub fn error_message(&self, message: &str) {
        self.renderer.show_status(message, true);
    }

    pub fn clear(&self) {
        self.renderer.hide_status();
    }
}
