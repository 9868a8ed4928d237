//! Shared test doubles

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use webconfig::session::{Peer, PeerId};
use webconfig::{Result, WebConfigError};

/// Peer that records every text frame sent to it
#[derive(Clone)]
pub struct RecordingPeer {
    id: PeerId,
    open: Arc<AtomicBool>,
    closed_by_server: Arc<AtomicBool>,
    fail_sends: Arc<AtomicBool>,
    sent: Arc<Mutex<Vec<String>>>,
}

impl RecordingPeer {
    pub fn new(id: PeerId) -> Self {
        Self {
            id,
            open: Arc::new(AtomicBool::new(true)),
            closed_by_server: Arc::new(AtomicBool::new(false)),
            fail_sends: Arc::new(AtomicBool::new(false)),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Frames sent so far
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    /// Frames sent so far, clearing the record
    pub fn take_sent(&self) -> Vec<String> {
        std::mem::take(&mut *self.sent.lock())
    }

    /// Simulate the transport noticing the socket went away
    pub fn drop_connection(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    pub fn was_closed_by_server(&self) -> bool {
        self.closed_by_server.load(Ordering::SeqCst)
    }
}

impl Peer for RecordingPeer {
    fn id(&self) -> PeerId {
        self.id
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn send_text(&self, text: &str) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(WebConfigError::ConnectionClosed);
        }
        self.sent.lock().push(text.to_string());
        Ok(())
    }

    fn close(&self) {
        self.closed_by_server.store(true, Ordering::SeqCst);
        self.open.store(false, Ordering::SeqCst);
    }
}
