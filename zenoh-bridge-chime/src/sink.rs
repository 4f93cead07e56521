//! Outbound display command sinks.

use std::future::Future;

use tracing::{debug, info};

use chimelink_bridge_framework::{DisplayContent, Publisher, Result};

/// Destination for display commands.
///
/// Called exactly once per handled update. Implementations do not retry;
/// a failure is returned to the caller and nothing else changes.
pub trait DisplaySink {
    /// Send one command to the display.
    fn publish(&self, content: &DisplayContent) -> impl Future<Output = Result<()>> + Send;
}

/// Publishes display commands as JSON on a Zenoh key expression.
#[derive(Debug, Clone)]
pub struct DisplayPublisher {
    publisher: Publisher,
    command_key: String,
    dry_run: bool,
}

impl DisplayPublisher {
    /// Create a publisher for the display's command key.
    ///
    /// With `dry_run`, commands are logged and never sent.
    pub fn new(publisher: Publisher, command_key: impl Into<String>, dry_run: bool) -> Self {
        Self {
            publisher,
            command_key: command_key.into(),
            dry_run,
        }
    }

    pub fn command_key(&self) -> &str {
        &self.command_key
    }
}

impl DisplaySink for DisplayPublisher {
    async fn publish(&self, content: &DisplayContent) -> Result<()> {
        if self.dry_run {
            info!(
                key = %self.command_key,
                graphic = %content.graphic,
                text = %content.text,
                "Dry run, not publishing display command"
            );
            return Ok(());
        }

        self.publisher
            .publish_json(&self.command_key, content)
            .await?;

        debug!(key = %self.command_key, graphic = %content.graphic, "Published display command");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) use memory::MemorySink;


#[cfg(test)]
mod tests {
    use super::*;
    use chimelink_bridge_framework::{BridgeError, Graphic};

    #[tokio::test]
    async fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        let handle = sink.clone();

        sink.publish(&DisplayContent::new("one", Graphic::None))
            .await
            .unwrap();
        sink.publish(&DisplayContent::new("two", Graphic::LargeText))
            .await
            .unwrap();

        let texts: Vec<_> = handle.published().into_iter().map(|c| c.text).collect();
        assert_eq!(texts, vec!["one", "two"]);
        assert_eq!(handle.last().unwrap().graphic, Graphic::LargeText);
    }

    #[tokio::test]
    async fn test_memory_sink_failure() {
        let sink = MemorySink::new();
        sink.set_failing(true);

        let result = sink.publish(&DisplayContent::starting()).await;
        assert!(matches!(result, Err(BridgeError::Publish { .. })));
        assert!(sink.published().is_empty());
    }
}
