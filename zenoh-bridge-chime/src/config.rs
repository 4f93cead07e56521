//! Configuration for the chime display bridge.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use zenoh::key_expr::KeyExpr;

use chimelink_bridge_framework::{
    BridgeConfig, BridgeError, DisplayContent, LoggingConfig, Result, ZenohConfig,
};

use crate::format::FormatRule;

/// Complete bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChimeBridgeConfig {
    /// Zenoh connection settings.
    #[serde(default)]
    pub zenoh: ZenohConfig,

    /// Display cycling settings and tracked sources.
    #[serde(default)]
    pub chime: ChimeConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Display cycling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChimeConfig {
    /// Prefix for the bridge status key (default: "chimelink/chime").
    #[serde(default = "default_status_prefix")]
    pub status_prefix: String,

    /// Key expression the display listens on for commands.
    #[serde(default = "default_command_key")]
    pub command_key: String,

    /// Minimum time a source stays on the display before cycling (default: 60).
    #[serde(default = "default_min_display_secs")]
    pub min_display_secs: u64,

    /// Age after which a source's data is no longer shown (default: 3600).
    #[serde(default = "default_stale_threshold_secs")]
    pub stale_threshold_secs: u64,

    /// Content shown for sources that have not reported yet.
    #[serde(default)]
    pub placeholder: DisplayContent,

    /// Log display commands instead of publishing them.
    #[serde(default)]
    pub dry_run: bool,

    /// Tracked sources, in display cycling order.
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
}

/// One tracked telemetry topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Stable identifier used in logs and status.
    pub id: String,

    /// Key expression the source's state is published on.
    pub key_expr: String,

    /// How the source's fields are laid out on the display.
    pub format: FormatRule,

    /// Overrides the bridge-wide placeholder for this source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<DisplayContent>,
}

impl SourceConfig {
    /// Create a source with the bridge-wide placeholder.
    pub fn new(id: impl Into<String>, key_expr: impl Into<String>, format: FormatRule) -> Self {
        Self {
            id: id.into(),
            key_expr: key_expr.into(),
            format,
            placeholder: None,
        }
    }
}

fn default_status_prefix() -> String {
    "chimelink/chime".to_string()
}

fn default_command_key() -> String {
    "homeassistant/text/featheresp32s2/display/command".to_string()
}

fn default_min_display_secs() -> u64 {
    60
}

fn default_stale_threshold_secs() -> u64 {
    60 * 60
}

/// Air monitor, radiation watcher, outside temperature and thermostat.
fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new(
            "airmonitor",
            "homeassistant/sensor/featherm0/state",
            FormatRule::AirMonitor,
        ),
        SourceConfig::new(
            "radiationwatcher",
            "homeassistant/sensor/esp8266thing/state",
            FormatRule::Radiation,
        ),
        SourceConfig::new(
            "outside_temp",
            "homeassistant/sensor/Acurite-Tower-2782/state",
            FormatRule::OutsideTemp,
        ),
        SourceConfig::new("thermostat", "zigbee2mqtt/thermostat", FormatRule::Thermostat),
    ]
}

impl Default for ChimeConfig {
    fn default() -> Self {
        Self {
            status_prefix: default_status_prefix(),
            command_key: default_command_key(),
            min_display_secs: default_min_display_secs(),
            stale_threshold_secs: default_stale_threshold_secs(),
            placeholder: DisplayContent::default(),
            dry_run: false,
            sources: default_sources(),
        }
    }
}

impl ChimeConfig {
    /// Minimum dwell time as a duration.
    pub fn min_display(&self) -> Duration {
        Duration::from_secs(self.min_display_secs)
    }

    /// Staleness threshold as a duration.
    pub fn stale_threshold(&self) -> Duration {
        Duration::from_secs(self.stale_threshold_secs)
    }

    /// Check the cycling settings and the source list.
    pub fn validate(&self) -> Result<()> {
        if self.min_display_secs == 0 {
            return Err(BridgeError::validation("min_display_secs must be > 0"));
        }
        if self.stale_threshold_secs == 0 {
            return Err(BridgeError::validation("stale_threshold_secs must be > 0"));
        }
        if self.command_key.trim().is_empty() {
            return Err(BridgeError::validation("command_key must not be empty"));
        }
        if self.sources.is_empty() {
            return Err(BridgeError::validation("At least one source is required"));
        }

        let command_key = parse_key_expr("command_key", &self.command_key)?;

        let mut ids = HashSet::new();
        let mut keys: Vec<(&str, KeyExpr<'_>)> = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            if source.id.trim().is_empty() {
                return Err(BridgeError::validation("source id must not be empty"));
            }
            if source.key_expr.trim().is_empty() {
                return Err(BridgeError::validation(format!(
                    "source '{}' has an empty key_expr",
                    source.id
                )));
            }
            if !ids.insert(source.id.as_str()) {
                return Err(BridgeError::validation(format!(
                    "duplicate source id '{}'",
                    source.id
                )));
            }

            let what = format!("source '{}' key_expr", source.id);
            let key = parse_key_expr(&what, &source.key_expr)?;
            for (other, other_key) in &keys {
                if *other_key == key {
                    return Err(BridgeError::validation(format!(
                        "duplicate source key_expr '{}'",
                        source.key_expr
                    )));
                }
                // A sample matching both would be dispatched twice.
                if other_key.intersects(&key) {
                    return Err(BridgeError::validation(format!(
                        "source '{}' key_expr '{}' overlaps source '{}' key_expr '{}'",
                        source.id, source.key_expr, other, other_key
                    )));
                }
            }
            // Publishing onto a subscribed key would feed every command back in.
            if key.intersects(&command_key) {
                return Err(BridgeError::validation(format!(
                    "source '{}' subscribes to the display command key",
                    source.id
                )));
            }
            source.format.validate(&source.id)?;
            keys.push((source.id.as_str(), key));
        }

        Ok(())
    }
}

/// Parse a key expression the way Zenoh will when declaring it.
fn parse_key_expr<'a>(what: &str, key_expr: &'a str) -> Result<KeyExpr<'a>> {
    KeyExpr::try_from(key_expr).map_err(|e| {
        BridgeError::validation(format!(
            "{} '{}' is not a valid key expression: {}",
            what, key_expr, e
        ))
    })
}

impl ChimeBridgeConfig {
    /// Metadata attached to the bridge's "running" status.
    pub fn status_metadata(&self) -> serde_json::Value {
        let sources: Vec<_> = self
            .chime
            .sources
            .iter()
            .map(|s| serde_json::json!({ "id": s.id, "key_expr": s.key_expr }))
            .collect();

        serde_json::json!({
            "command_key": self.chime.command_key,
            "min_display_secs": self.chime.min_display_secs,
            "stale_threshold_secs": self.chime.stale_threshold_secs,
            "dry_run": self.chime.dry_run,
            "sources": sources,
        })
    }
}

impl BridgeConfig for ChimeBridgeConfig {
    fn zenoh(&self) -> &ZenohConfig {
        &self.zenoh
    }

    fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    fn status_prefix(&self) -> &str {
        &self.chime.status_prefix
    }

    fn validate(&self) -> Result<()> {
        self.chime.validate()
    }
}
