//! Chimelink Bridge Framework
//!
//! Lifecycle plumbing for bridges that consume bus telemetry and publish
//! commands back onto Zenoh.
//!
//! # Overview
//!
//! This framework provides:
//! - [`BridgeConfig`] trait for configuration loading and validation
//! - [`BridgeRunner`] for managing bridge lifecycle (startup, shutdown, signal handling)
//! - [`Publisher`] for publishing JSON payloads to Zenoh key expressions
//! - [`BridgeArgs`] for common CLI argument parsing
//! - [`BridgeStatus`] for standardized status reporting
//!
//! # Example
//!
//! ```ignore
//! use chimelink_bridge_framework::{BridgeArgs, BridgeConfig, BridgeRunner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = BridgeArgs::parse_with_default("mybridge.json5");
//!     let config = MyBridgeConfig::load(&args.config)?;
//!
//!     let mut runner = BridgeRunner::new_with_args("mybridge", config, Some(&args)).await?;
//!
//!     let worker = match MyWorker::declare(runner.session()).await {
//!         Ok(worker) => worker,
//!         Err(e) => {
//!             runner.fail(&e).await;
//!             return Err(e.into());
//!         }
//!     };
//!     let shutdown = runner.shutdown_receiver();
//!     runner.spawn(worker.run(shutdown));
//!
//!     // Run until Ctrl+C or SIGTERM
//!     runner.run().await
//! }
//! ```

mod args;
mod config;
mod error;
mod publisher;
mod runner;
mod status;

pub use args::BridgeArgs;
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use publisher::Publisher;
pub use runner::BridgeRunner;
pub use status::{BridgeStatus, StatusPublisher};

// Re-export commonly used types from chimelink-common
pub use chimelink_common::{DisplayContent, Graphic, LoggingConfig, ZenohConfig};
