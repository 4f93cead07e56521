//! Inbound update handling.
//!
//! The [`Dispatcher`] owns all mutable display state. Each update is
//! formatted, recorded, run through the selection policy and followed by
//! exactly one publish of whatever is selected afterwards.

use chimelink_common::decode_fields;
use tracing::{debug, info, warn};

use chimelink_bridge_framework::{DisplayContent, Result};

use crate::format::Fields;
use crate::freshness::{FreshnessStore, Timestamp};
use crate::selection::{Selection, SelectionPolicy};
use crate::sink::DisplaySink;
use crate::source::SourceRegistry;

/// Counters kept by the dispatcher.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    /// Updates handled for known sources.
    pub events: u64,
    /// Updates dropped because no source matched.
    pub ignored: u64,
    /// Payloads that could not be decoded into fields.
    pub malformed: u64,
    /// Successful display publishes.
    pub published: u64,
    /// Failed display publishes.
    pub publish_failures: u64,
    /// Times the selection advanced.
    pub cycles: u64,
    /// Cycles that found no fresh source.
    pub all_stale_cycles: u64,
}

/// Routes updates through the store, the policy and the sink.
pub struct Dispatcher<S> {
    registry: SourceRegistry,
    store: FreshnessStore,
    policy: SelectionPolicy,
    sink: S,
    stats: DispatchStats,
}

impl<S: DisplaySink> Dispatcher<S> {
    /// Create a dispatcher; every source starts on its placeholder.
    pub fn new(registry: SourceRegistry, policy: SelectionPolicy, sink: S) -> Self {
        let store = FreshnessStore::from_registry(&registry);
        Self {
            registry,
            store,
            policy,
            sink,
            stats: DispatchStats::default(),
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn store(&self) -> &FreshnessStore {
        &self.store
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Id of the source currently on the display.
    pub fn selected_id(&self) -> Option<&str> {
        self.registry.get(self.policy.selected()).map(|s| s.id())
    }

    /// Content currently on the display.
    pub fn current_content(&self) -> &DisplayContent {
        self.store.content_of(self.policy.selected())
    }

    /// Handle a decoded update for `source_id` that arrived at `now`.
    ///
    /// Returns `Ok(None)` for unknown sources, which are not recorded and do
    /// not publish. A publish failure is returned after the update has been
    /// recorded and the selection evaluated; neither is rolled back.
    pub async fn handle(
        &mut self,
        source_id: &str,
        fields: &Fields,
        now: Timestamp,
    ) -> Result<Option<Selection>> {
        let Some((index, source)) = self.registry.find(source_id) else {
            debug!(source = %source_id, "Ignoring update for unknown source");
            self.stats.ignored += 1;
            return Ok(None);
        };
        let content = source.render(fields);

        self.dispatch(index, content, now).await.map(Some)
    }

    /// Handle a raw payload delivered for `source_id`.
    ///
    /// Payloads that are not JSON or CBOR objects are treated as an update
    /// with no fields, so every value shows as missing.
    pub async fn handle_payload(
        &mut self,
        source_id: &str,
        payload: &[u8],
        now: Timestamp,
    ) -> Result<Option<Selection>> {
        let Some((index, source)) = self.registry.find(source_id) else {
            debug!(source = %source_id, "Ignoring payload for unknown source");
            self.stats.ignored += 1;
            return Ok(None);
        };

        let fields = decode_fields(payload).unwrap_or_else(|e| {
            debug!(source = %source_id, payload_len = payload.len(), error = %e, "Malformed payload");
            self.stats.malformed += 1;
            Fields::new()
        });
        let content = source.render(&fields);

        self.dispatch(index, content, now).await.map(Some)
    }

    async fn dispatch(
        &mut self,
        index: usize,
        content: DisplayContent,
        now: Timestamp,
    ) -> Result<Selection> {
        self.stats.events += 1;

        debug!(
            index,
            graphic = %content.graphic,
            text = %content.text,
            "Recorded update"
        );
        self.store.record(index, content, now);

        let selection = self.policy.on_event(&self.store, now);
        if selection.cycled {
            self.stats.cycles += 1;
            if selection.all_stale {
                self.stats.all_stale_cycles += 1;
            }
            if let Some(shown) = self.registry.get(selection.index) {
                info!(
                    source = %shown.id(),
                    last_update = %format_timestamp(self.store.last_update(selection.index)),
                    all_stale = selection.all_stale,
                    "Display cycled"
                );
            }
        }

        let shown = self.store.content_of(selection.index);
        match self.sink.publish(shown).await {
            Ok(()) => {
                self.stats.published += 1;
                Ok(selection)
            }
            Err(e) => {
                self.stats.publish_failures += 1;
                warn!(error = %e, "Failed to publish display command");
                Err(e)
            }
        }
    }
}

/// Human-readable local time of an update, for logs.
fn format_timestamp(timestamp: Option<Timestamp>) -> String {
    use chrono::{Local, TimeZone};

    match timestamp.map(|ms| Local.timestamp_millis_opt(ms).single()) {
        None => "never".to_string(),
        Some(None) => "invalid".to_string(),
        Some(Some(time)) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}
