//! Last-known content and update time per source.

use chimelink_bridge_framework::DisplayContent;

use crate::source::SourceRegistry;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Mutable state of one source.
#[derive(Debug, Clone)]
struct SourceState {
    content: DisplayContent,
    last_update: Option<Timestamp>,
    update_count: u64,
}

/// Per-source record of the latest content and when it arrived.
///
/// Indexed by registry position. Sources that were never updated are
/// always stale.
#[derive(Debug, Clone)]
pub struct FreshnessStore {
    states: Vec<SourceState>,
}

impl FreshnessStore {
    /// Create a store where every source shows its placeholder.
    pub fn new(placeholders: impl IntoIterator<Item = DisplayContent>) -> Self {
        let states = placeholders
            .into_iter()
            .map(|content| SourceState {
                content,
                last_update: None,
                update_count: 0,
            })
            .collect();
        Self { states }
    }

    /// Create a store for every source in the registry.
    pub fn from_registry(registry: &SourceRegistry) -> Self {
        Self::new(registry.iter().map(|s| s.placeholder().clone()))
    }

    /// Replace a source's content and mark it updated at `now`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a registry position.
    pub fn record(&mut self, index: usize, content: DisplayContent, now: Timestamp) {
        let state = &mut self.states[index];
        state.content = content;
        state.last_update = Some(now);
        state.update_count += 1;
    }

    /// Whether a source's data is too old (or absent) to be shown.
    pub fn is_stale(&self, index: usize, now: Timestamp, threshold_ms: i64) -> bool {
        match self.states[index].last_update {
            None => true,
            Some(updated) => now.saturating_sub(updated) > threshold_ms,
        }
    }

    /// Last recorded content, or the placeholder.
    pub fn content_of(&self, index: usize) -> &DisplayContent {
        &self.states[index].content
    }

    /// When the source was last updated.
    pub fn last_update(&self, index: usize) -> Option<Timestamp> {
        self.states[index].last_update
    }

    /// Number of updates recorded for the source.
    pub fn update_count(&self, index: usize) -> u64 {
        self.states[index].update_count
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chimelink_bridge_framework::Graphic;

    fn store(n: usize) -> FreshnessStore {
        FreshnessStore::new((0..n).map(|_| DisplayContent::starting()))
    }

    #[test]
    fn test_never_updated_is_stale() {
        let store = store(3);
        for index in 0..3 {
            for threshold in [0, 1, 60_000, i64::MAX] {
                assert!(store.is_stale(index, 0, threshold));
                assert!(store.is_stale(index, 1_700_000_000_000, threshold));
            }
        }
    }

    #[test]
    fn test_fresh_until_threshold_passes() {
        let mut store = store(2);
        let t = 1_700_000_000_000;
        store.record(1, DisplayContent::new("21 C", Graphic::LargeText), t);

        for threshold in [0, 1_000, 3_600_000] {
            assert!(!store.is_stale(1, t, threshold));
            assert!(!store.is_stale(1, t + threshold, threshold));
            assert!(store.is_stale(1, t + threshold + 1, threshold));
        }
        assert!(store.is_stale(0, t, 3_600_000));
    }

    #[test]
    fn test_content_and_counts() {
        let mut store = store(2);
        assert_eq!(store.content_of(0), &DisplayContent::starting());
        assert_eq!(store.last_update(0), None);

        store.record(0, DisplayContent::new("a", Graphic::None), 10);
        store.record(0, DisplayContent::new("b", Graphic::None), 20);

        assert_eq!(store.content_of(0).text, "b");
        assert_eq!(store.last_update(0), Some(20));
        assert_eq!(store.update_count(0), 2);
        assert_eq!(store.update_count(1), 0);
        assert_eq!(store.len(), 2);
    }
}
