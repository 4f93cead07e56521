//! Per-source display formatting.
//!
//! Each source turns its latest sensor fields into a [`DisplayContent`].
//! Rendering never fails: a field that is absent or not a scalar is shown
//! as [`MISSING`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use chimelink_bridge_framework::{BridgeError, DisplayContent, Graphic, Result};

/// Decoded top-level fields of a sensor payload.
pub type Fields = Map<String, Value>;

/// Token shown in place of a missing or malformed field.
pub const MISSING: &str = "?";

/// Formatting rule attached to a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormatRule {
    /// Indoor air monitor: temperature, humidity, pressure, CO2 and AQI.
    AirMonitor,
    /// Outdoor temperature/humidity tower.
    OutsideTemp,
    /// Gamma event counter reporting counts per minute.
    Radiation,
    /// Zigbee thermostat setpoint, local temperature and HVAC state.
    Thermostat,
    /// Free-form lines with `{dotted.path}` placeholders.
    Template {
        lines: Vec<String>,
        #[serde(default = "default_template_graphic")]
        graphic: Graphic,
    },
}

fn default_template_graphic() -> Graphic {
    Graphic::MediumText
}

impl FormatRule {
    /// Check rule parameters.
    pub fn validate(&self, source_id: &str) -> Result<()> {
        if let FormatRule::Template { lines, .. } = self {
            if lines.is_empty() {
                return Err(BridgeError::validation(format!(
                    "source '{}' uses a template with no lines",
                    source_id
                )));
            }
        }
        Ok(())
    }

    /// Render fields into display content.
    ///
    /// Deterministic: the same fields always produce the same text.
    pub fn render(&self, source_id: &str, fields: &Fields) -> DisplayContent {
        let reader = FieldReader { source_id, fields };

        match self {
            FormatRule::AirMonitor => DisplayContent::new(
                format!(
                    "{} C\n{} RH%\n{} hPa\n\nCO2: {}\nAQI: {}",
                    reader.text("temperature"),
                    reader.text("humidity"),
                    reader.text("pressure"),
                    reader.text("carbon_dioxide"),
                    reader.text("aqi"),
                ),
                Graphic::MediumText,
            ),
            FormatRule::OutsideTemp => DisplayContent::new(
                format!(
                    "Outside\n\n{} C\n{} RH%\n",
                    reader.text("temperature_C"),
                    reader.text("humidity"),
                ),
                Graphic::LargeText,
            ),
            FormatRule::Radiation => DisplayContent::new(
                format!(
                    "Gamma\nevents\n\n{}\n    CPM",
                    reader.text("frequency_details.cpm")
                ),
                Graphic::LargeText,
            ),
            FormatRule::Thermostat => DisplayContent::new(
                format!(
                    "T:{}C\n  {}C\n\n{}",
                    reader.text("occupied_heating_setpoint"),
                    reader.text("local_temperature"),
                    hvac_state(
                        reader.str("system_mode"),
                        reader.str("running_state"),
                    ),
                ),
                Graphic::LargeText,
            ),
            FormatRule::Template { lines, graphic } => {
                let text = lines
                    .iter()
                    .map(|line| render_line(line, |path| reader.text(path)))
                    .collect::<Vec<_>>()
                    .join("\n");
                DisplayContent::new(text, *graphic)
            }
        }
    }
}

/// Two-line HVAC banner for the thermostat layout.
fn hvac_state(system_mode: Option<&str>, running_state: Option<&str>) -> &'static str {
    let idle = running_state == Some("idle");
    match (system_mode, idle) {
        (Some("heat"), true) => "Furnace\n IDLE  ",
        (Some("heat"), false) => "Furnace\n  ON   ",
        (Some("cool"), true) => "  A/C\n IDLE  ",
        (Some("cool"), false) => "  A/C\n  ON   ",
        _ => "UNKNOWN",
    }
}

/// Substitute `{path}` placeholders in a template line.
///
/// An opening brace without a matching close is kept literally.
fn render_line(line: &str, mut lookup: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                out.push_str(&lookup(after[..end].trim()));
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    out
}

/// Field lookup that reports malformed input at debug level.
struct FieldReader<'a> {
    source_id: &'a str,
    fields: &'a Fields,
}

impl FieldReader<'_> {
    /// Resolve a dotted path such as `frequency_details.cpm`.
    fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        segments.try_fold(self.fields.get(first)?, |value, segment| value.get(segment))
    }

    /// Scalar field as display text, or [`MISSING`].
    fn text(&self, path: &str) -> String {
        match self.get(path) {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(other) => {
                debug!(source = %self.source_id, field = %path, value = %other, "Field is not a scalar");
                MISSING.to_string()
            }
            None => {
                debug!(source = %self.source_id, field = %path, "Field missing from payload");
                MISSING.to_string()
            }
        }
    }

    /// String field, if present.
    fn str(&self, path: &str) -> Option<&str> {
        let value = self.get(path).and_then(Value::as_str);
        if value.is_none() {
            debug!(source = %self.source_id, field = %path, "String field missing from payload");
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("test payload must be an object"),
        }
    }

    #[test]
    fn test_air_monitor() {
        let content = FormatRule::AirMonitor.render(
            "air",
            &fields(json!({
                "temperature": 21.5,
                "humidity": 40,
                "pressure": 1013.2,
                "carbon_dioxide": 612,
                "aqi": 1
            })),
        );
        assert_eq!(
            content.text,
            "21.5 C\n40 RH%\n1013.2 hPa\n\nCO2: 612\nAQI: 1"
        );
        assert_eq!(content.graphic, Graphic::MediumText);
    }

    #[test]
    fn test_outside_temp() {
        let content = FormatRule::OutsideTemp
            .render("out", &fields(json!({ "temperature_C": -3.2, "humidity": 88 })));
        assert_eq!(content.text, "Outside\n\n-3.2 C\n88 RH%\n");
        assert_eq!(content.graphic, Graphic::LargeText);
    }

    #[test]
    fn test_radiation_nested_field() {
        let content = FormatRule::Radiation
            .render("rad", &fields(json!({ "frequency_details": { "cpm": 23 } })));
        assert_eq!(content.text, "Gamma\nevents\n\n23\n    CPM");
    }

    #[test]
    fn test_radiation_missing_parent() {
        let content = FormatRule::Radiation.render("rad", &fields(json!({ "uptime": 5 })));
        assert_eq!(content.text, "Gamma\nevents\n\n?\n    CPM");
    }

    #[test]
    fn test_thermostat_states() {
        let render = |mode: &str, running: &str| {
            FormatRule::Thermostat
                .render(
                    "thermo",
                    &fields(json!({
                        "occupied_heating_setpoint": 20.5,
                        "local_temperature": 19.8,
                        "system_mode": mode,
                        "running_state": running
                    })),
                )
                .text
        };

        assert_eq!(render("heat", "idle"), "T:20.5C\n  19.8C\n\nFurnace\n IDLE  ");
        assert_eq!(render("heat", "heat"), "T:20.5C\n  19.8C\n\nFurnace\n  ON   ");
        assert_eq!(render("cool", "idle"), "T:20.5C\n  19.8C\n\n  A/C\n IDLE  ");
        assert_eq!(render("cool", "cool"), "T:20.5C\n  19.8C\n\n  A/C\n  ON   ");
        assert_eq!(render("off", "idle"), "T:20.5C\n  19.8C\n\nUNKNOWN");
    }

    #[test]
    fn test_missing_fields_use_placeholder() {
        let content = FormatRule::AirMonitor.render(
            "air",
            &fields(json!({ "temperature": 20, "humidity": null, "aqi": [1, 2] })),
        );
        assert_eq!(content.text, "20 C\n? RH%\n? hPa\n\nCO2: ?\nAQI: ?");
    }

    #[test]
    fn test_thermostat_without_fields() {
        let content = FormatRule::Thermostat.render("thermo", &Fields::new());
        assert_eq!(content.text, "T:?C\n  ?C\n\nUNKNOWN");
    }

    #[test]
    fn test_template() {
        let rule = FormatRule::Template {
            lines: vec![
                "Garage".to_string(),
                "door: {door.state}".to_string(),
                "{ battery }% {open".to_string(),
            ],
            graphic: Graphic::Garage,
        };
        let content = rule.render(
            "garage",
            &fields(json!({ "door": { "state": "closed" }, "battery": 97 })),
        );
        assert_eq!(content.text, "Garage\ndoor: closed\n97% {open");
        assert_eq!(content.graphic, Graphic::Garage);
    }

    #[test]
    fn test_template_requires_lines() {
        let rule = FormatRule::Template {
            lines: vec![],
            graphic: Graphic::Info,
        };
        assert!(rule.validate("empty").is_err());
        assert!(FormatRule::AirMonitor.validate("air").is_ok());
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let payload = fields(json!({
            "temperature": 21.25,
            "humidity": 41,
            "pressure": 1009,
            "carbon_dioxide": 700,
            "aqi": 2
        }));
        let first = FormatRule::AirMonitor.render("air", &payload);
        let second = FormatRule::AirMonitor.render("air", &payload.clone());
        assert_eq!(first.text.as_bytes(), second.text.as_bytes());
    }
}
