use crate::models::WidgetPlacement;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 60_000;

static DEFAULT_LAYOUT: Lazy<Vec<WidgetPlacement>> = Lazy::new(|| {
    let seed = [
        ("weather", 1, 1),
        ("news", 2, 1),
        ("country", 1, 1),
        ("crypto", 2, 2),
        ("posts", 2, 1),
        ("map", 2, 2),
    ];
    seed.into_iter()
        .map(|(id, width, height)| WidgetPlacement {
            id: id.to_string(),
            width,
            height,
            visible: true,
        })
        .collect()
});

static DEFAULT_INTERVALS: Lazy<BTreeMap<String, u64>> = Lazy::new(|| {
    DEFAULT_LAYOUT
        .iter()
        .map(|placement| (placement.id.clone(), DEFAULT_REFRESH_INTERVAL_MS))
        .collect()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSnapshot {
    pub widgets: Vec<WidgetPlacement>,
    pub refresh_intervals: BTreeMap<String, u64>,
}

/// Ordered widget placements plus per-widget refresh intervals.
///
/// Every mutation runs under the lock and hands back a fresh snapshot, so
/// consumers never observe partially applied state.
#[derive(Clone)]
pub struct LayoutStore {
    inner: Arc<Mutex<LayoutSnapshot>>,
}

impl Default for LayoutStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(default_snapshot())),
        }
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        self.lock().clone()
    }

    pub fn set_layout(&self, widgets: Vec<WidgetPlacement>) -> LayoutSnapshot {
        let mut state = self.lock();
        state.widgets = widgets;
        state.clone()
    }

    /// Unknown ids are ignored.
    pub fn toggle_visibility(&self, widget_id: &str) -> LayoutSnapshot {
        let mut state = self.lock();
        if let Some(widget) = state.widgets.iter_mut().find(|w| w.id == widget_id) {
            widget.visible = !widget.visible;
        }
        state.clone()
    }

    pub fn set_refresh_interval(&self, widget_id: &str, interval_ms: u64) -> LayoutSnapshot {
        let mut state = self.lock();
        state
            .refresh_intervals
            .insert(widget_id.to_string(), interval_ms.max(1));
        state.clone()
    }

    /// Configured interval, or the fallback default for unknown widgets.
    pub fn refresh_interval(&self, widget_id: &str) -> u64 {
        self.lock()
            .refresh_intervals
            .get(widget_id)
            .copied()
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_MS)
    }

    pub fn reset_to_default(&self) -> LayoutSnapshot {
        let mut state = self.lock();
        *state = default_snapshot();
        state.clone()
    }

    /// Exchanges the positions of two placements. Content stays with its id;
    /// only the ordering changes. Unknown ids make this a no-op.
    pub fn swap(&self, from_id: &str, to_id: &str) -> LayoutSnapshot {
        let mut state = self.lock();
        let from = state.widgets.iter().position(|w| w.id == from_id);
        let to = state.widgets.iter().position(|w| w.id == to_id);
        if let (Some(from), Some(to)) = (from, to) {
            state.widgets.swap(from, to);
        }
        state.clone()
    }

    pub fn visible_widget_ids(&self) -> Vec<String> {
        self.lock()
            .widgets
            .iter()
            .filter(|w| w.visible)
            .map(|w| w.id.clone())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LayoutSnapshot> {
        self.inner.lock().expect("layout store lock")
    }
}

fn default_snapshot() -> LayoutSnapshot {
    LayoutSnapshot {
        widgets: DEFAULT_LAYOUT.clone(),
        refresh_intervals: DEFAULT_INTERVALS.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::{LayoutStore, DEFAULT_REFRESH_INTERVAL_MS};

    #[test]
    fn swap_is_an_involution() {
        let store = LayoutStore::new();
        let original = store.snapshot();

        store.swap("weather", "crypto");
        let swapped = store.snapshot();
        assert_ne!(original.widgets, swapped.widgets);

        store.swap("weather", "crypto");
        assert_eq!(original.widgets, store.snapshot().widgets);
    }

    #[test]
    fn swap_with_unknown_id_is_a_noop() {
        let store = LayoutStore::new();
        let before = store.snapshot();
        store.swap("weather", "no-such-widget");
        assert_eq!(before, store.snapshot());
    }

    #[test]
    fn toggle_flips_only_the_target() {
        let store = LayoutStore::new();
        let after = store.toggle_visibility("news");
        let news = after.widgets.iter().find(|w| w.id == "news").unwrap();
        assert!(!news.visible);
        assert!(after.widgets.iter().filter(|w| w.id != "news").all(|w| w.visible));
    }

    #[test]
    fn unknown_interval_falls_back_to_default() {
        let store = LayoutStore::new();
        assert_eq!(store.refresh_interval("nonexistent"), DEFAULT_REFRESH_INTERVAL_MS);

        store.set_refresh_interval("crypto", 30_000);
        assert_eq!(store.refresh_interval("crypto"), 30_000);
    }

    #[test]
    fn reset_restores_the_compiled_in_default_exactly() {
        let store = LayoutStore::new();
        let pristine = store.snapshot();

        store.toggle_visibility("map");
        store.set_refresh_interval("weather", 5_000);
        store.swap("news", "posts");
        store.swap("crypto", "weather");
        assert_ne!(pristine, store.snapshot());

        let reset = store.reset_to_default();
        assert_eq!(pristine, reset);
    }

    #[test]
    fn snapshots_do_not_alias_store_state() {
        let store = LayoutStore::new();
        let mut snapshot = store.snapshot();
        snapshot.widgets[0].visible = false;
        assert!(store.snapshot().widgets[0].visible);
    }
}
