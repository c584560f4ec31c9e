//! Single-slot holder for the latest forecast and the selected day.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::types::ForecastResult;

#[derive(Debug, Default)]
struct Slot {
    forecast: Option<Arc<ForecastResult>>,
    label: Option<String>,
    selected_day: Option<String>,
}

/// Latest forecast, overwritten on every successful fetch and never cleared.
///
/// A failed fetch does not touch the slot, so the previous forecast stays on
/// screen.
#[derive(Debug, Default)]
pub struct ForecastStore {
    slot: RwLock<Slot>,
}

impl ForecastStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot and reset the selected day to the first forecast day.
    pub fn set(&self, forecast: ForecastResult, label: impl Into<String>) -> Arc<ForecastResult> {
        let forecast = Arc::new(forecast);
        let mut slot = self.slot.write();
        slot.selected_day = forecast.first_day().map(str::to_string);
        slot.label = Some(label.into());
        slot.forecast = Some(forecast.clone());
        forecast
    }

    pub fn get(&self) -> Option<Arc<ForecastResult>> {
        self.slot.read().forecast.clone()
    }

    /// City label the current forecast was rendered with.
    pub fn label(&self) -> Option<String> {
        self.slot.read().label.clone()
    }

    pub fn selected_day(&self) -> Option<String> {
        self.slot.read().selected_day.clone()
    }

    /// Select the day at `index`. Returns the forecast and the chosen date key,
    /// or `None` when nothing is stored or the index is out of range.
    pub fn select_day(&self, index: usize) -> Option<(Arc<ForecastResult>, String)> {
        let mut slot = self.slot.write();
        let forecast = slot.forecast.clone()?;
        let day = forecast.daily.time.get(index)?.clone();
        slot.selected_day = Some(day.clone());
        Some((forecast, day))
    }

    pub fn is_empty(&self) -> bool {
        self.slot.read().forecast.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::forecast_json;

    fn forecast(days: usize) -> ForecastResult {
        serde_json::from_value(forecast_json(days)).unwrap()
    }

    #[test]
    fn test_starts_empty() {
        let store = ForecastStore::new();
        assert!(store.is_empty());
        assert!(store.get().is_none());
        assert!(store.selected_day().is_none());
        assert!(store.select_day(0).is_none());
    }

    #[test]
    fn test_set_selects_first_day() {
        let store = ForecastStore::new();
        store.set(forecast(7), "Berlin");
        assert_eq!(store.selected_day().as_deref(), Some("2024-05-01"));
        assert_eq!(store.label().as_deref(), Some("Berlin"));
    }

    #[test]
    fn test_select_day_updates_selection() {
        let store = ForecastStore::new();
        store.set(forecast(7), "Berlin");

        let (_, day) = store.select_day(2).unwrap();
        assert_eq!(day, "2024-05-03");
        assert_eq!(store.selected_day().as_deref(), Some("2024-05-03"));

        assert!(store.select_day(7).is_none());
        assert_eq!(store.selected_day().as_deref(), Some("2024-05-03"));
    }

    #[test]
    fn test_set_overwrites_and_resets_selection() {
        let store = ForecastStore::new();
        store.set(forecast(7), "Berlin");
        store.select_day(4);

        let mut next = forecast(3);
        next.latitude = 51.5;
        store.set(next, "London");

        let current = store.get().unwrap();
        assert_eq!(current.latitude, 51.5);
        assert_eq!(current.day_count(), 3);
        assert_eq!(store.selected_day().as_deref(), Some("2024-05-01"));
        assert_eq!(store.label().as_deref(), Some("London"));
    }
}
