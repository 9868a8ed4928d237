//! Connection Handler
//!
//! Handles one accepted socket: serves the page, or performs the upgrade and
//! then forwards frames to the dispatcher until the socket ends.

use std::io::{BufReader, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::Sender;

use super::frame::{read_frame, Frame, OpCode};
use super::handshake::{accept_upgrade, authenticate, AUTH_REALM};
use super::http::{HttpRequest, HttpResponse};
use super::page::page_response;
use super::peer::WsPeer;
use crate::config::Config;
use crate::error::{Result, WebConfigError};
use crate::service::Event;
use crate::session::{Peer, PeerId};

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for the request head)
    reader: BufReader<TcpStream>,

    /// Write half, used directly until the upgrade hands it to a `WsPeer`
    writer: TcpStream,

    /// Identifier handed to the session if this becomes a socket
    id: PeerId,

    config: Arc<Config>,

    /// Dispatcher inbox
    events: Sender<Event>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream, id: PeerId, config: Arc<Config>, events: Sender<Event>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm; frames are small and interactive
        stream.set_nodelay(true)?;
        if config.read_timeout_ms > 0 {
            stream.set_read_timeout(Some(Duration::from_millis(config.read_timeout_ms)))?;
        }

        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: stream,
            id,
            config,
            events,
            peer_addr,
        })
    }

    /// Handle the connection (blocking until closed)
    pub fn handle(&mut self) -> Result<()> {
        let request = match HttpRequest::read_from(&mut self.reader) {
            Ok(request) => request,
            Err(WebConfigError::ConnectionClosed) => return Ok(()),
            Err(WebConfigError::Http(msg)) => {
                tracing::debug!("Bad request from {}: {}", self.peer_addr, msg);
                return HttpResponse::bad_request().write_to(&mut self.writer);
            }
            Err(e) => return Err(e),
        };

        tracing::trace!("{} {} from {}", request.method, request.path, self.peer_addr);

        let route = request.route();
        if route == self.config.base_path {
            self.serve_page(&request)
        } else if route == self.config.ws_path() {
            self.serve_socket(&request)
        } else {
            HttpResponse::not_found().write_to(&mut self.writer)
        }
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    fn serve_page(&mut self, request: &HttpRequest) -> Result<()> {
        if !authenticate(request, self.config.credentials.as_ref()) {
            return HttpResponse::unauthorized(AUTH_REALM).write_to(&mut self.writer);
        }
        if request.method != "GET" {
            return HttpResponse::method_not_allowed().write_to(&mut self.writer);
        }
        page_response().write_to(&mut self.writer)
    }

    fn serve_socket(&mut self, request: &HttpRequest) -> Result<()> {
        if !authenticate(request, self.config.credentials.as_ref()) {
            tracing::debug!("Rejected upgrade from {}: bad credentials", self.peer_addr);
            return HttpResponse::unauthorized(AUTH_REALM).write_to(&mut self.writer);
        }

        let response = match accept_upgrade(request) {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Rejected upgrade from {}: {}", self.peer_addr, e);
                return HttpResponse::bad_request().write_to(&mut self.writer);
            }
        };
        response.write_to(&mut self.writer)?;

        let write_timeout = match self.config.write_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        let peer = WsPeer::spawn(
            self.id,
            self.writer.try_clone()?,
            self.peer_addr.clone(),
            self.config.outbound_queue_size,
            write_timeout,
        )?;
        if self.events.send(Event::Connected(peer.clone())).is_err() {
            peer.close();
            return Ok(());
        }

        let result = self.read_frames(&peer);
        let _ = self.events.send(Event::Disconnected(self.id));
        result
    }

    /// Read frames until close, EOF or error
    fn read_frames(&mut self, peer: &WsPeer) -> Result<()> {
        loop {
            let frame = match read_frame(&mut self.reader, self.config.max_frame_size, true) {
                Ok(frame) => frame,
                Err(WebConfigError::Io(ref e)) if is_timeout(e.kind()) => {
                    tracing::debug!("Client {} idle past read timeout", self.peer_addr);
                    peer.close();
                    return Ok(());
                }
                Err(WebConfigError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    peer.mark_closed();
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    peer.close();
                    return Err(e);
                }
            };

            match frame.opcode {
                OpCode::Ping => {
                    if let Err(e) = peer.send_frame(&Frame::pong(frame.payload)) {
                        tracing::debug!("Pong to {} failed: {}", self.peer_addr, e);
                    }
                }
                OpCode::Pong => tracing::trace!("WebSocket pong from {}", self.peer_addr),
                OpCode::Close => {
                    tracing::debug!("Close from {}", self.peer_addr);
                    peer.close();
                    return Ok(());
                }
                OpCode::Text | OpCode::Binary | OpCode::Continuation => {
                    let event = Event::Frame {
                        peer: self.id,
                        frame,
                    };
                    if self.events.send(event).is_err() {
                        peer.close();
                        return Ok(());
                    }
                }
            }
        }
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::NotConnected
    )
}

fn is_timeout(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::WouldBlock | ErrorKind::TimedOut)
}
