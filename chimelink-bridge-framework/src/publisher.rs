//! JSON publisher for Zenoh.

use std::sync::Arc;

use serde::Serialize;

use crate::error::{BridgeError, Result};

/// Publisher for sending JSON payloads to Zenoh.
///
/// Wraps a Zenoh session and a key prefix. Keys passed to
/// [`publish_json`](Self::publish_json) are absolute; suffix-based helpers
/// are resolved against the prefix.
#[derive(Clone, Debug)]
pub struct Publisher {
    session: Arc<zenoh::Session>,
    key_prefix: String,
}

impl Publisher {
    /// Create a new publisher.
    pub fn new(session: Arc<zenoh::Session>, key_prefix: impl Into<String>) -> Self {
        Self {
            session,
            key_prefix: key_prefix.into(),
        }
    }

    /// Get the key prefix.
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Get a reference to the Zenoh session.
    pub fn session(&self) -> &Arc<zenoh::Session> {
        &self.session
    }

    /// Build a full key expression from a suffix.
    pub fn build_key(&self, suffix: &str) -> String {
        join_key(&self.key_prefix, suffix)
    }

    /// Publish raw bytes to a key.
    pub async fn publish_raw(&self, key: &str, payload: Vec<u8>) -> Result<()> {
        self.session
            .put(key, payload)
            .await
            .map_err(|e| BridgeError::publish(key, e))?;

        Ok(())
    }

    /// Publish a JSON value to a key.
    pub async fn publish_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let payload = serde_json::to_vec(value)?;
        self.publish_raw(key, payload).await
    }

    /// Publish a JSON value under the publisher's prefix.
    pub async fn publish_json_suffix<T: Serialize>(&self, suffix: &str, value: &T) -> Result<()> {
        let key = self.build_key(suffix);
        self.publish_json(&key, value).await
    }
}

fn join_key(prefix: &str, suffix: &str) -> String {
    match (prefix.is_empty(), suffix.is_empty()) {
        (_, true) => prefix.to_string(),
        (true, false) => suffix.to_string(),
        (false, false) => format!("{}/{}", prefix.trim_end_matches('/'), suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_key() {
        assert_eq!(join_key("chimelink/chime", "@/status"), "chimelink/chime/@/status");
        assert_eq!(join_key("chimelink/chime/", "@/status"), "chimelink/chime/@/status");
        assert_eq!(join_key("chimelink/chime", ""), "chimelink/chime");
        assert_eq!(join_key("", "display/command"), "display/command");
    }
}
