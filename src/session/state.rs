//! Session state and dispatch
//!
//! Routes inbound frames to the config store or the application handler and
//! reports back to the connected peer.

use super::{Peer, PeerId};
use crate::network::Frame;
use crate::protocol::{decode, encode_status, is_empty_snapshot, Message};
use crate::store::{ApplyOutcome, ConfigStore};

/// Status text acknowledging every applied config command
pub const DONE_STATUS: &str = "Done";

/// Application callback for frames that are not config commands.
///
/// Receives the raw frame bytes unmodified; the slice length is the frame
/// length.
pub type CommandHandler = Box<dyn FnMut(&[u8]) + Send + 'static>;

/// Observable session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected(PeerId),
}

/// Tracks at most one peer and dispatches its frames
pub struct Session<P: Peer> {
    /// The single active peer; a new connect replaces it
    peer: Option<P>,

    /// Adapter over the shared config map
    store: ConfigStore,

    /// Fallback for opaque frames (last registration wins)
    handler: Option<CommandHandler>,
}

impl<P: Peer> Session<P> {
    /// Create a disconnected session over `store`
    pub fn new(store: ConfigStore) -> Self {
        Self {
            peer: None,
            store,
            handler: None,
        }
    }

    pub fn state(&self) -> SessionState {
        match &self.peer {
            Some(peer) => SessionState::Connected(peer.id()),
            None => SessionState::Disconnected,
        }
    }

    /// The active peer, if any
    pub fn peer(&self) -> Option<&P> {
        self.peer.as_ref()
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Register the fallback handler, replacing any previous one
    pub fn set_handler(&mut self, handler: CommandHandler) {
        if self.handler.is_some() {
            tracing::debug!("Replacing command handler");
        }
        self.handler = Some(handler);
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    // =========================================================================
    // Connection Events
    // =========================================================================

    /// A peer connected: it becomes the active peer and receives a snapshot.
    ///
    /// The previous peer, if any, is returned without being closed or told
    /// it was superseded.
    pub fn on_connect(&mut self, peer: P) -> Option<P> {
        let previous = self.peer.replace(peer);
        if let Some(prev) = &previous {
            tracing::debug!("Peer #{} superseded without close", prev.id());
        }
        self.send_config();
        previous
    }

    /// A peer disconnected.
    ///
    /// Only clears the slot when `id` is the active peer; a superseded peer
    /// going away leaves the current one in place.
    pub fn on_disconnect(&mut self, id: PeerId) -> bool {
        match &self.peer {
            Some(peer) if peer.id() == id => {
                self.peer = None;
                true
            }
            _ => false,
        }
    }

    /// Forget the active peer once the transport reports it closed
    pub fn cleanup(&mut self) -> bool {
        match &self.peer {
            Some(peer) if !peer.is_open() => {
                tracing::debug!("Dropping closed peer #{}", peer.id());
                self.peer = None;
                true
            }
            _ => false,
        }
    }

    // =========================================================================
    // Inbound Dispatch
    // =========================================================================

    /// Dispatch a transport frame.
    ///
    /// Only a single, complete, final text frame is dispatched. Binary,
    /// fragmented and continuation frames are ignored without buffering.
    pub fn on_frame(&mut self, frame: &Frame) {
        if !frame.is_complete_text() {
            tracing::trace!(
                "Ignoring frame opcode={:?} fin={} len={}",
                frame.opcode,
                frame.fin,
                frame.payload.len()
            );
            return;
        }
        self.on_message(&frame.payload);
    }

    /// Dispatch one complete text message
    pub fn on_message(&mut self, data: &[u8]) {
        if self.peer.is_none() {
            tracing::trace!("Message with no connected peer dropped");
            return;
        }

        match decode(data) {
            Message::Config { key, value } => {
                if let ApplyOutcome::Deleted { notice } = self.store.apply(&key, &value) {
                    self.msg(&notice);
                }
                self.msg(DONE_STATUS);
            }
            Message::Opaque { command, .. } => match self.handler.as_mut() {
                Some(handler) => {
                    tracing::trace!("Forwarding command {:?} to handler", command);
                    handler(data);
                }
                None => tracing::trace!("No handler for command {:?}, dropped", command),
            },
        }
    }

    // =========================================================================
    // Outbound
    // =========================================================================

    /// Send a `msg#` status line to the active peer
    pub fn msg(&self, text: &str) {
        self.send(&encode_status(text));
    }

    /// Push the full config snapshot, unless the map is empty
    pub fn send_config(&self) {
        let snapshot = self.store.snapshot();
        if is_empty_snapshot(&snapshot) {
            return;
        }
        self.send(&snapshot);
    }

    /// Send to the active peer; silently skipped when absent or not open
    fn send(&self, text: &str) {
        let Some(peer) = self.peer.as_ref().filter(|p| p.is_open()) else {
            return;
        };
        if let Err(e) = peer.send_text(text) {
            tracing::warn!("Error sending to peer #{}: {}", peer.id(), e);
        }
    }
}
