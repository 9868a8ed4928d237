//! Message definitions
//!
//! Classified frames in both directions.

use crate::store::ConfigMap;

/// An inbound frame after classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Well-formed `cfg#key=value`. An empty value means delete.
    Config { key: String, value: String },

    /// Any other frame; handed to the application as raw bytes
    Opaque {
        command: String,
        arguments: Vec<String>,
    },
}

impl Message {
    /// Whether this is a config set/delete the store adapter handles
    pub fn is_config(&self) -> bool {
        matches!(self, Message::Config { .. })
    }
}

/// An outbound frame as seen by a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// Full config snapshot pushed on connect
    Snapshot(ConfigMap),

    /// Status line (`msg#...`)
    Status(String),

    /// Frame with an unrecognized tag
    Unknown(String),
}
