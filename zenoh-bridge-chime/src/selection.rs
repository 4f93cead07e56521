//! Display cycling policy.
//!
//! There is no timer. Every inbound update asks the policy whether the
//! current selection has been shown for longer than the dwell time; if so
//! the selection advances to the next source with fresh data. Cycling
//! therefore stops when traffic stops.

use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::freshness::{FreshnessStore, Timestamp};

/// Which source is on the display and since when.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleState {
    /// Registry position of the visible source.
    pub selected: usize,
    /// When the selection last advanced; `None` until the first cycle.
    pub last_cycle: Option<Timestamp>,
}

/// Outcome of one policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Registry position of the source to display.
    pub index: usize,
    /// Whether a cycle happened on this event.
    pub cycled: bool,
    /// Whether the cycle found no fresh source and fell back to the next slot.
    pub all_stale: bool,
}

/// Cycles the single display slot among sources.
#[derive(Debug, Clone)]
pub struct SelectionPolicy {
    min_display_ms: i64,
    stale_threshold_ms: i64,
    state: CycleState,
}

impl SelectionPolicy {
    /// Create a policy starting at the first source, eligible to cycle on
    /// the first event.
    pub fn new(min_display: Duration, stale_threshold: Duration) -> Self {
        Self {
            min_display_ms: duration_ms(min_display),
            stale_threshold_ms: duration_ms(stale_threshold),
            state: CycleState::default(),
        }
    }

    /// Registry position of the visible source.
    pub fn selected(&self) -> usize {
        self.state.selected
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Whether the dwell time has strictly elapsed at `now`.
    pub fn dwell_elapsed(&self, now: Timestamp) -> bool {
        match self.state.last_cycle {
            None => true,
            Some(last) => now.saturating_sub(last) > self.min_display_ms,
        }
    }

    /// Evaluate the policy after an update has been recorded in `store`.
    ///
    /// When the dwell time has elapsed, scans forward from the slot after
    /// the current selection, wrapping once, for the first fresh source.
    /// The current selection is checked last. If every source is stale the
    /// slot after the current selection is chosen anyway.
    pub fn on_event(&mut self, store: &FreshnessStore, now: Timestamp) -> Selection {
        let n = store.len();
        if n == 0 || !self.dwell_elapsed(now) {
            return Selection {
                index: self.state.selected,
                cycled: false,
                all_stale: false,
            };
        }

        let previous = self.state.selected;
        let candidate = (previous + 1) % n;
        let fresh = (0..n).map(|step| (candidate + step) % n).find(|&index| {
            let stale = store.is_stale(index, now, self.stale_threshold_ms);
            if stale {
                trace!(
                    index,
                    last_update = ?store.last_update(index),
                    "Skipping stale source"
                );
            }
            !stale
        });

        let (index, all_stale) = match fresh {
            Some(index) => (index, false),
            None => {
                warn!(
                    now,
                    sources = n,
                    fallback = candidate,
                    "All sources are stale, showing next slot anyway"
                );
                (candidate, true)
            }
        };

        debug!(from = previous, to = index, "Cycling display");

        self.state = CycleState {
            selected: index,
            last_cycle: Some(now),
        };

        Selection {
            index,
            cycled: true,
            all_stale,
        }
    }
}

fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
