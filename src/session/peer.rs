//! Peer capability
//!
//! What the session needs from a connected client, independent of transport.

use crate::error::Result;

/// Identifier assigned by the transport to each accepted connection
pub type PeerId = u64;

/// A connected client the session can talk to
pub trait Peer {
    /// Transport-assigned identifier
    fn id(&self) -> PeerId;

    /// Whether the transport still considers the connection open
    fn is_open(&self) -> bool;

    /// Queue one text frame for the client
    fn send_text(&self, text: &str) -> Result<()>;

    /// Close the connection; used by housekeeping, never by the session
    fn close(&self);
}
