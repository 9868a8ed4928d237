//! Protocol codec
//!
//! Encoding and decoding functions for the text wire protocol.
//!
//! ## Inbound classification
//! ```text
//! split on '#' ──► [tag, payload] with tag == "cfg" ?
//!                      │ yes                 │ no
//!                      ▼                     ▼
//!          split payload on '='          Opaque
//!                      │
//!          exactly [key, value] ? ── no ──► Opaque
//!                      │ yes
//!                      ▼
//!             Config { key, value }
//! ```
//! A frame that does not fit the shape is never an error, it simply belongs
//! to the application handler.

use super::tokenizer::split;
use super::{Message, Update};
use crate::store::ConfigMap;

/// Tag of config snapshot and config set/delete frames
pub const CONFIG_TAG: &str = "cfg";

/// Tag of status frames
pub const STATUS_TAG: &str = "msg";

/// Separates fields within a frame
pub const FIELD_DELIMITER: u8 = b'#';

/// Separates key from value within a config field
pub const PAIR_DELIMITER: u8 = b'=';

// =============================================================================
// Inbound (page → device)
// =============================================================================

/// Classify an inbound text frame
pub fn decode(frame: &[u8]) -> Message {
    let mut fields = split(frame, FIELD_DELIMITER);

    if fields.len() == 2 && fields[0] == CONFIG_TAG {
        let mut pair = split(fields[1].as_bytes(), PAIR_DELIMITER);
        if pair.len() == 2 {
            let value = pair.pop().unwrap_or_default();
            let key = pair.pop().unwrap_or_default();
            return Message::Config { key, value };
        }
    }

    // split always yields at least one field
    let command = fields.remove(0);
    Message::Opaque {
        command,
        arguments: fields,
    }
}

/// Encode a config set (or delete, when `value` is empty)
pub fn encode_config_command(key: &str, value: &str) -> String {
    let mut frame = String::with_capacity(CONFIG_TAG.len() + key.len() + value.len() + 2);
    frame.push_str(CONFIG_TAG);
    frame.push(FIELD_DELIMITER as char);
    frame.push_str(key);
    frame.push(PAIR_DELIMITER as char);
    frame.push_str(value);
    frame
}

// =============================================================================
// Outbound (device → page)
// =============================================================================

/// Encode the full config map as a snapshot frame.
///
/// An empty map encodes to exactly `"cfg"`; see [`is_empty_snapshot`].
pub fn encode_snapshot(config: &ConfigMap) -> String {
    let size = config
        .iter()
        .map(|(k, v)| k.len() + v.len() + 2)
        .sum::<usize>();

    let mut frame = String::with_capacity(CONFIG_TAG.len() + size);
    frame.push_str(CONFIG_TAG);
    for (key, value) in config {
        frame.push(FIELD_DELIMITER as char);
        frame.push_str(key);
        frame.push(PAIR_DELIMITER as char);
        frame.push_str(value);
    }
    frame
}

/// True when a snapshot carries no entries and should not be sent
pub fn is_empty_snapshot(frame: &str) -> bool {
    frame.len() <= CONFIG_TAG.len()
}

/// Encode a status line
pub fn encode_status(text: &str) -> String {
    let mut frame = String::with_capacity(STATUS_TAG.len() + 1 + text.len());
    frame.push_str(STATUS_TAG);
    frame.push(FIELD_DELIMITER as char);
    frame.push_str(text);
    frame
}

/// Decode a frame received from the device (client side).
///
/// Status text is taken verbatim after the first `#`. Snapshot entries that do
/// not split into exactly one key and one value are skipped.
pub fn decode_update(frame: &str) -> Update {
    let (tag, rest) = match frame.split_once(FIELD_DELIMITER as char) {
        Some((tag, rest)) => (tag, Some(rest)),
        None => (frame, None),
    };

    match (tag, rest) {
        (STATUS_TAG, Some(text)) => Update::Status(text.to_string()),
        (CONFIG_TAG, rest) => {
            let mut config = ConfigMap::new();
            if let Some(rest) = rest {
                for entry in split(rest.as_bytes(), FIELD_DELIMITER) {
                    let mut pair = split(entry.as_bytes(), PAIR_DELIMITER);
                    if pair.len() == 2 {
                        let value = pair.pop().unwrap_or_default();
                        let key = pair.pop().unwrap_or_default();
                        config.insert(key, value);
                    }
                }
            }
            Update::Snapshot(config)
        }
        _ => Update::Unknown(frame.to_string()),
    }
}
