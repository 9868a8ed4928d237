//! Protocol Module
//!
//! Text protocol spoken between the browser page and the device.
//!
//! ## Frame Format
//! One WebSocket text frame per logical message, fields joined by `#`,
//! field 0 is the command tag:
//! ```text
//! ┌──────┬───┬─────────┬───┬─────────┬───┬─────
//! │ tag  │ # │ field 1 │ # │ field 2 │ # │ ...
//! └──────┴───┴─────────┴───┴─────────┴───┴─────
//! ```
//!
//! ### Device → Page
//! - `cfg#k1=v1#k2=v2...` : full snapshot, never sent for an empty map
//! - `msg#<text>`         : status line, text is not escaped
//!
//! ### Page → Device
//! - `cfg#<key>=<value>`  : set (empty value deletes)
//! - anything else        : opaque command for the application handler
//!
//! There is no escaping: `#` and `=` cannot appear inside keys or values.

mod tokenizer;
mod message;
mod codec;

pub use tokenizer::{split, Field};
pub use message::{Message, Update};
pub use codec::{
    decode, decode_update, encode_config_command, encode_snapshot, encode_status,
    is_empty_snapshot, CONFIG_TAG, FIELD_DELIMITER, PAIR_DELIMITER, STATUS_TAG,
};
