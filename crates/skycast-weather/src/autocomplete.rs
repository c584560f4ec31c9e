//! Live city suggestions for the search input.

use parking_lot::Mutex;
use skycast_core::AutocompleteConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::debounce::Debouncer;
use crate::geocode::GeoProvider;
use crate::render::Renderer;
use crate::resolver::{LocationResolver, RunOutcome, Trigger};
use crate::status::{StatusReporter, SUGGESTIONS_FAILED};
use crate::types::Suggestion;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_MIN_QUERY_CHARS: usize = 2;
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

/// Drives suggestion lookups from input changes and turns a pick into a
/// forecast run.
///
/// Each input change bumps a query generation; a lookup that completes with
/// an older generation is dropped so it cannot replace newer suggestions.
pub struct AutocompleteController {
    geo: Arc<dyn GeoProvider>,
    resolver: Arc<LocationResolver>,
    renderer: Arc<dyn Renderer>,
    status: StatusReporter,
    debouncer: Debouncer,
    min_query_chars: usize,
    limit: usize,
    suggestions: Arc<Mutex<Vec<Suggestion>>>,
    generation: Arc<AtomicU64>,
}

impl AutocompleteController {
    pub fn new(
        geo: Arc<dyn GeoProvider>,
        resolver: Arc<LocationResolver>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            geo,
            resolver,
            status: StatusReporter::new(renderer.clone()),
            renderer,
            debouncer: Debouncer::new(DEFAULT_DEBOUNCE),
            min_query_chars: DEFAULT_MIN_QUERY_CHARS,
            limit: DEFAULT_SUGGESTION_LIMIT,
            suggestions: Arc::new(Mutex::new(Vec::new())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_config(mut self, config: &AutocompleteConfig) -> Self {
        self.debouncer = Debouncer::new(Duration::from_millis(config.debounce_ms));
        self.min_query_chars = config.min_query_chars;
        self.limit = config.suggestion_limit;
        self
    }

    /// Suggestions currently on screen.
    pub fn suggestions(&self) -> Vec<Suggestion> {
        self.suggestions.lock().clone()
    }

    /// True while a lookup is waiting for the quiet period to end.
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Handle a change of the search input text.
    pub fn on_input(&self, text: &str) {
        let query = text.trim().to_string();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if query.chars().count() < self.min_query_chars {
            self.debouncer.cancel();
            self.clear();
            return;
        }

        let geo = self.geo.clone();
        let renderer = self.renderer.clone();
        let status = self.status.clone();
        let suggestions = self.suggestions.clone();
        let latest = self.generation.clone();
        let limit = self.limit;

        self.debouncer.schedule(move || async move {
            let result = geo.forward_geocode_many(&query, limit).await;

            if latest.load(Ordering::SeqCst) != generation {
                tracing::debug!("Dropping stale suggestions for {:?}", query);
                return;
            }

            match result {
                Ok(list) => {
                    tracing::debug!("{} suggestions for {:?}", list.len(), query);
                    renderer.render_suggestions(&list);
                    *suggestions.lock() = list;
                }
                Err(e) => {
                    suggestions.lock().clear();
                    renderer.render_suggestions(&[]);
                    status.error_message(SUGGESTIONS_FAILED);
                    tracing::warn!("Suggestion lookup for {:?} failed: {}", query, e);
                }
            }
        });
    }

    /// Focus left the widget: drop the list and anything still in flight.
    pub fn dismiss(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.debouncer.cancel();
        self.clear();
    }

    /// Take the suggestion at `index`: fill the input, clear the list.
    pub fn select(&self, index: usize) -> Option<Suggestion> {
        let chosen = self.suggestions.lock().get(index).cloned()?;
        self.renderer.set_query_text(&chosen.display_name);
        self.dismiss();
        Some(chosen)
    }

    /// Select the suggestion at `index` and fetch its forecast.
    pub async fn choose(&self, index: usize) -> Option<RunOutcome> {
        let chosen = self.select(index)?;
        Some(self.resolver.run(Trigger::Selection(chosen)).await)
    }

    fn clear(&self) {
        self.suggestions.lock().clear();
        self.renderer.render_suggestions(&[]);
    }
}
