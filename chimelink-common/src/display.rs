use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Command payload understood by the chime display.
///
/// Serialized as `{"text": "...", "graphic": "LARGE_TEXT"}`. The text may
/// contain embedded line breaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayContent {
    /// Text body shown on the display.
    pub text: String,

    /// Layout or bitmap to show alongside the text.
    pub graphic: Graphic,
}

impl DisplayContent {
    /// Create a new display command.
    pub fn new(text: impl Into<String>, graphic: Graphic) -> Self {
        Self {
            text: text.into(),
            graphic,
        }
    }

    /// Content shown before any telemetry has arrived.
    pub fn starting() -> Self {
        Self::new("Starting..", Graphic::Alert)
    }
}

impl Default for DisplayContent {
    fn default() -> Self {
        Self::starting()
    }
}

/// Display mode tags accepted by the chime firmware.
///
/// The text-only modes differ in font size; the others draw a bitmap
/// above a small line of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Graphic {
    /// Plain small text.
    None,
    /// Medium-density text layout.
    MediumText,
    /// Large-density text layout.
    LargeText,
    Aqi,
    Fire,
    Co2,
    Radiation,
    Doorbell,
    Garage,
    Safety,
    /// Full-message alert.
    Alert,
    Freeze,
    Gas,
    Water,
    /// Firmware fallback for unrecognized tags.
    #[default]
    Info,
}

impl Graphic {
    /// Get the tag as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Graphic::None => "NONE",
            Graphic::MediumText => "MEDIUM_TEXT",
            Graphic::LargeText => "LARGE_TEXT",
            Graphic::Aqi => "AQI",
            Graphic::Fire => "FIRE",
            Graphic::Co2 => "CO2",
            Graphic::Radiation => "RADIATION",
            Graphic::Doorbell => "DOORBELL",
            Graphic::Garage => "GARAGE",
            Graphic::Safety => "SAFETY",
            Graphic::Alert => "ALERT",
            Graphic::Freeze => "FREEZE",
            Graphic::Gas => "GAS",
            Graphic::Water => "WATER",
            Graphic::Info => "INFO",
        }
    }
}

impl std::fmt::Display for Graphic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Get the current timestamp in milliseconds since Unix epoch.
///
/// Returns 0 if system time is before Unix epoch (should never happen in practice).
pub fn current_timestamp_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
