//! WebSocket peer handle
//!
//! Cloneable handle to one upgraded connection. The connection thread reads
//! from its own clone of the socket. Writes are queued on a bounded channel
//! and drained by a writer thread per peer, so a peer that stops reading
//! never blocks the dispatcher.

use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};

use super::frame::{write_frame, Frame, OpCode};
use crate::error::{Result, WebConfigError};
use crate::session::{Peer, PeerId};

/// Handle to an upgraded WebSocket connection
#[derive(Clone)]
pub struct WsPeer {
    inner: Arc<PeerInner>,
}

struct PeerInner {
    id: PeerId,

    /// Remote address for logging
    remote_addr: String,

    /// Frames waiting for the writer thread
    outbound: Sender<Frame>,

    /// Socket handle used to shut down a writer stuck on a full send buffer
    socket: TcpStream,

    /// Cleared when a close is sent or seen, or a write fails
    open: Arc<AtomicBool>,
}

impl WsPeer {
    /// Wrap the write half of an upgraded socket and start its writer thread.
    ///
    /// At most `queue_size` frames wait for the socket; a blocked write gives
    /// up after `write_timeout` and closes the peer.
    pub fn spawn(
        id: PeerId,
        stream: TcpStream,
        remote_addr: impl Into<String>,
        queue_size: usize,
        write_timeout: Option<Duration>,
    ) -> Result<Self> {
        stream.set_write_timeout(write_timeout)?;
        let socket = stream.try_clone()?;
        let open = Arc::new(AtomicBool::new(true));
        let (outbound, frames) = bounded(queue_size);

        let writer_open = Arc::clone(&open);
        thread::Builder::new()
            .name(format!("webconfig-write-{}", id))
            .spawn(move || write_loop(id, stream, frames, writer_open))?;

        Ok(Self {
            inner: Arc::new(PeerInner {
                id,
                remote_addr: remote_addr.into(),
                outbound,
                socket,
                open,
            }),
        })
    }

    pub fn remote_addr(&self) -> &str {
        &self.inner.remote_addr
    }

    /// Queue one unmasked frame.
    ///
    /// Fails with `OutboundFull` (the frame is dropped) when the writer is
    /// behind, and with `ConnectionClosed` once the peer is closed.
    pub fn send_frame(&self, frame: &Frame) -> Result<()> {
        if !self.is_open() {
            return Err(WebConfigError::ConnectionClosed);
        }

        match self.inner.outbound.try_send(frame.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(WebConfigError::OutboundFull),
            Err(TrySendError::Disconnected(_)) => {
                self.mark_closed();
                Err(WebConfigError::ConnectionClosed)
            }
        }
    }

    /// Mark closed without writing anything (client already gone)
    pub fn mark_closed(&self) {
        self.inner.open.store(false, Ordering::Release);
    }
}

impl Peer for WsPeer {
    fn id(&self) -> PeerId {
        self.inner.id
    }

    fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::Acquire)
    }

    fn send_text(&self, text: &str) -> Result<()> {
        tracing::trace!("Sending to #{}: {}", self.inner.id, text);
        self.send_frame(&Frame::text(text))
    }

    /// Queue a close frame; the writer shuts the socket down after it, which
    /// wakes the reader thread. A peer whose queue is full is shut down at once.
    fn close(&self) {
        if !self.inner.open.swap(false, Ordering::AcqRel) {
            return;
        }
        if self.inner.outbound.try_send(Frame::close()).is_err() {
            let _ = self.inner.socket.shutdown(Shutdown::Both);
        }
        tracing::debug!("Closed peer #{} ({})", self.inner.id, self.inner.remote_addr);
    }
}

/// Drain queued frames onto the socket until a close frame, a write error,
/// or every handle to the peer is gone
fn write_loop(id: PeerId, mut stream: TcpStream, frames: Receiver<Frame>, open: Arc<AtomicBool>) {
    for frame in frames {
        let closing = frame.opcode == OpCode::Close;
        if let Err(e) = write_frame(&mut stream, &frame, None) {
            tracing::debug!("Write to peer #{} failed: {}", id, e);
            open.store(false, Ordering::Release);
            let _ = stream.shutdown(Shutdown::Both);
            return;
        }
        if closing {
            let _ = stream.shutdown(Shutdown::Both);
            return;
        }
    }
    tracing::trace!("Writer for peer #{} stopped", id);
}
