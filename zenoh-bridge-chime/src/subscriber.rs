//! Zenoh subscriptions feeding the dispatcher.
//!
//! One subscriber is declared per source. Their callbacks only forward
//! samples into a channel; a single loop drains it, so updates reach the
//! dispatcher strictly one at a time.

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};
use zenoh::pubsub::Subscriber;
use zenoh::sample::SampleKind;

use chimelink_bridge_framework::BridgeError;
use chimelink_common::current_timestamp_millis;

use crate::dispatcher::Dispatcher;
use crate::freshness::Timestamp;
use crate::sink::DisplaySink;

/// A sample received for one source.
#[derive(Debug)]
struct Inbound {
    source_id: String,
    key: String,
    payload: Vec<u8>,
    received_at: Timestamp,
}

/// Subscribes to every source and drives a [`Dispatcher`].
pub struct DisplaySubscriber<S> {
    dispatcher: Dispatcher<S>,
    subscribers: Vec<Subscriber<()>>,
    rx: mpsc::UnboundedReceiver<Inbound>,
}

impl<S: DisplaySink> DisplaySubscriber<S> {
    /// Declare one subscriber per registered source.
    ///
    /// Fails on the first key expression Zenoh refuses; subscribers declared
    /// before it are dropped.
    pub async fn declare(
        session: &zenoh::Session,
        dispatcher: Dispatcher<S>,
    ) -> Result<Self, BridgeError> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut subscribers = Vec::with_capacity(dispatcher.registry().len());
        for source in dispatcher.registry().iter() {
            let tx = tx.clone();
            let source_id = source.id().to_string();

            info!(source = %source_id, key_expr = %source.key_expr(), "Subscribing to source");
            let subscriber = session
                .declare_subscriber(source.key_expr())
                .callback(move |sample| {
                    if sample.kind() == SampleKind::Delete {
                        trace!(key = %sample.key_expr(), "Ignoring delete sample");
                        return;
                    }
                    let inbound = Inbound {
                        source_id: source_id.clone(),
                        key: sample.key_expr().to_string(),
                        payload: sample.payload().to_bytes().into_owned(),
                        received_at: current_timestamp_millis(),
                    };
                    // The loop only stops after the subscribers are undeclared.
                    let _ = tx.send(inbound);
                })
                .await
                .map_err(|e| BridgeError::Subscribe {
                    key: source.key_expr().to_string(),
                    message: e.to_string(),
                })?;
            subscribers.push(subscriber);
        }

        Ok(Self {
            dispatcher,
            subscribers,
            rx,
        })
    }

    /// Number of declared subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Run until the shutdown signal is received.
    ///
    /// Returns the dispatcher so callers can inspect its final state.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Dispatcher<S> {
        let Self {
            mut dispatcher,
            subscribers,
            mut rx,
        } = self;

        info!(
            sources = subscribers.len(),
            "Subscribers started, waiting for telemetry..."
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Shutdown signal received, stopping subscriber");
                        break;
                    }
                }

                inbound = rx.recv() => {
                    let Some(inbound) = inbound else {
                        warn!("All subscriptions closed");
                        break;
                    };
                    debug!(source = %inbound.source_id, key = %inbound.key, "Received update");

                    // Failures are logged by the dispatcher and not retried.
                    let _ = dispatcher
                        .handle_payload(&inbound.source_id, &inbound.payload, inbound.received_at)
                        .await;
                }
            }
        }

        for subscriber in subscribers {
            if let Err(e) = subscriber.undeclare().await {
                warn!(error = %e, "Failed to undeclare subscriber");
            }
        }

        let stats = dispatcher.stats();
        info!(
            events = stats.events,
            ignored = stats.ignored,
            malformed = stats.malformed,
            published = stats.published,
            publish_failures = stats.publish_failures,
            cycles = stats.cycles,
            all_stale_cycles = stats.all_stale_cycles,
            "Final statistics"
        );
        for (index, source) in dispatcher.registry().iter().enumerate() {
            info!(
                source = %source.id(),
                updates = dispatcher.store().update_count(index),
                last_update = ?dispatcher.store().last_update(index),
                "Source summary"
            );
        }

        dispatcher
    }
}
