//! Zenoh bridge for a single-slot chime display.
//!
//! The bridge subscribes to a fixed set of sensor sources, keeps the last
//! reading of each, and cycles the freshest ones onto the display. Every
//! received update republishes the selected source's content so the display
//! always shows its latest reading.
//!
//! # Key Expressions
//!
//! ```text
//! <source key_expr>                          (subscribed, one per source)
//! homeassistant/text/<device>/display/command (published display command)
//! chimelink/chime/@/status                   (bridge status)
//! ```

pub mod config;
pub mod dispatcher;
pub mod format;
pub mod freshness;
pub mod selection;
pub mod sink;
pub mod source;
pub mod subscriber;

pub use config::{ChimeBridgeConfig, ChimeConfig, SourceConfig};
pub use dispatcher::{DispatchStats, Dispatcher};
pub use format::FormatRule;
pub use freshness::{FreshnessStore, Timestamp};
pub use selection::{Selection, SelectionPolicy};
pub use sink::{DisplayPublisher, DisplaySink};
pub use source::{Source, SourceRegistry};
pub use subscriber::DisplaySubscriber;
