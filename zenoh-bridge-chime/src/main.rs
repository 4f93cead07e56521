//! Zenoh bridge for a single-slot chime display.
//!
//! Subscribes to sensor sources and publishes display commands that cycle
//! between the freshest ones.

use anyhow::Result;
use chimelink_bridge_framework::{BridgeArgs, BridgeConfig, BridgeRunner};

use zenoh_bridge_chime::config::ChimeBridgeConfig;
use zenoh_bridge_chime::dispatcher::Dispatcher;
use zenoh_bridge_chime::selection::SelectionPolicy;
use zenoh_bridge_chime::sink::DisplayPublisher;
use zenoh_bridge_chime::source::SourceRegistry;
use zenoh_bridge_chime::subscriber::DisplaySubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = BridgeArgs::parse_with_default("chime.json5");

    let config = ChimeBridgeConfig::load(&args.config).map_err(|e| anyhow::anyhow!("{}", e))?;

    let runner = BridgeRunner::new_with_args("chime", config, Some(&args))
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let mut runner = runner.with_status_publishing();

    let chime = runner.config().chime.clone();
    let registry = SourceRegistry::from_config(&chime);
    let policy = SelectionPolicy::new(chime.min_display(), chime.stale_threshold());

    // The command key is absolute, so the publisher carries no prefix.
    let sink = DisplayPublisher::new(
        runner.publisher_with_prefix(""),
        chime.command_key.clone(),
        chime.dry_run,
    );

    tracing::info!(
        "Chime bridge running (command: {}, sources: {}, dwell: {}s, stale after: {}s{})",
        chime.command_key,
        registry.len(),
        chime.min_display_secs,
        chime.stale_threshold_secs,
        if chime.dry_run { ", dry run" } else { "" }
    );

    let dispatcher = Dispatcher::new(registry, policy, sink);

    // Subscription failures are fatal and happen before "running" is published.
    let declared = DisplaySubscriber::declare(runner.session(), dispatcher).await;
    let subscriber = match declared {
        Ok(subscriber) => subscriber,
        Err(e) => {
            let message = format!("Subscription problem: {}", e);
            runner.fail(&message).await;
            return Err(anyhow::anyhow!(message));
        }
    };
    tracing::info!(subscribers = subscriber.len(), "Subscriptions declared");

    let shutdown = runner.shutdown_receiver();
    runner.spawn(async move {
        subscriber.run(shutdown).await;
    });

    let metadata = runner.config().status_metadata();

    runner
        .run_with_metadata(Some(metadata))
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))
}
