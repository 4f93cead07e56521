//! Registry of tracked sources.

use chimelink_bridge_framework::DisplayContent;

use crate::config::ChimeConfig;
use crate::format::{Fields, FormatRule};

/// An immutable tracked source.
///
/// Its position in the [`SourceRegistry`] is its cycling order.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    id: String,
    key_expr: String,
    format: FormatRule,
    placeholder: DisplayContent,
}

impl Source {
    /// Create a new source.
    pub fn new(
        id: impl Into<String>,
        key_expr: impl Into<String>,
        format: FormatRule,
        placeholder: DisplayContent,
    ) -> Self {
        Self {
            id: id.into(),
            key_expr: key_expr.into(),
            format,
            placeholder,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn key_expr(&self) -> &str {
        &self.key_expr
    }

    pub fn format(&self) -> &FormatRule {
        &self.format
    }

    /// Content shown before the first update.
    pub fn placeholder(&self) -> &DisplayContent {
        &self.placeholder
    }

    /// Render a payload with this source's rule.
    pub fn render(&self, fields: &Fields) -> DisplayContent {
        self.format.render(&self.id, fields)
    }
}

/// Fixed, ordered list of sources, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    /// Create a registry from sources in cycling order.
    pub fn new(sources: Vec<Source>) -> Self {
        Self { sources }
    }

    /// Build the registry from validated configuration.
    pub fn from_config(config: &ChimeConfig) -> Self {
        let sources = config
            .sources
            .iter()
            .map(|s| {
                Source::new(
                    &s.id,
                    &s.key_expr,
                    s.format.clone(),
                    s.placeholder
                        .clone()
                        .unwrap_or_else(|| config.placeholder.clone()),
                )
            })
            .collect();
        Self::new(sources)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Source> {
        self.sources.get(index)
    }

    /// Position of the source with the given id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.sources.iter().position(|s| s.id == id)
    }

    /// Source with the given id and its position.
    pub fn find(&self, id: &str) -> Option<(usize, &Source)> {
        self.sources.iter().enumerate().find(|(_, s)| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chimelink_bridge_framework::Graphic;

    #[test]
    fn test_registry_from_default_config() {
        let registry = SourceRegistry::from_config(&ChimeConfig::default());

        assert_eq!(registry.len(), 4);
        assert_eq!(registry.index_of("airmonitor"), Some(0));
        assert_eq!(registry.index_of("thermostat"), Some(3));
        assert_eq!(registry.index_of("doorbell"), None);
        assert_eq!(
            registry.find("radiationwatcher").map(|(i, s)| (i, s.key_expr())),
            Some((1, "homeassistant/sensor/esp8266thing/state"))
        );
        assert!(
            registry
                .iter()
                .all(|s| s.placeholder() == &DisplayContent::starting())
        );
    }

    #[test]
    fn test_per_source_placeholder_override() {
        let mut config = ChimeConfig::default();
        config.sources[2].placeholder = Some(DisplayContent::new("No tower", Graphic::None));

        let registry = SourceRegistry::from_config(&config);
        let tower = registry.get(2).unwrap();
        assert_eq!(tower.id(), "outside_temp");
        assert_eq!(tower.placeholder().text, "No tower");
        assert_eq!(registry.get(1).unwrap().placeholder(), &config.placeholder);
    }
}
