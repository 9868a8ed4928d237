//! Config Store Adapter
//!
//! Applies decoded set/delete commands to the shared map.

use super::SharedConfig;
use crate::protocol::encode_snapshot;

/// Result of applying a config command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Key inserted or overwritten
    Set,

    /// Key removed (or was already absent); `notice` is shown to the user
    Deleted { notice: String },
}

/// Human-readable line reported after a delete
pub fn deleted_notice(key: &str) -> String {
    format!("'{}' delete from config", key)
}

/// Mutates the shared config map on behalf of the session
///
/// Keys and values are never validated; any text is accepted.
#[derive(Clone)]
pub struct ConfigStore {
    config: SharedConfig,
}

impl ConfigStore {
    /// Wrap a shared config map
    pub fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    /// Apply a set (non-empty value) or delete (empty value).
    ///
    /// Both directions are idempotent.
    pub fn apply(&self, key: &str, value: &str) -> ApplyOutcome {
        let mut config = self.config.write();

        if value.is_empty() {
            let existed = config.remove(key).is_some();
            tracing::info!(key, existed, "config entry deleted");
            ApplyOutcome::Deleted {
                notice: deleted_notice(key),
            }
        } else {
            config.insert(key.to_string(), value.to_string());
            tracing::info!(key, value, "config entry set");
            ApplyOutcome::Set
        }
    }

    /// Encode the current map as a snapshot frame.
    ///
    /// The read lock is held for the whole encode so the snapshot never
    /// mixes states.
    pub fn snapshot(&self) -> String {
        let config = self.config.read();
        encode_snapshot(&config)
    }

    /// Number of entries currently stored
    pub fn len(&self) -> usize {
        self.config.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.config.read().is_empty()
    }

    /// The underlying shared handle
    pub fn shared(&self) -> &SharedConfig {
        &self.config
    }
}
