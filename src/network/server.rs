//! TCP Server
//!
//! Accepts connections and hands each one to its own thread.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::Sender;

use super::connection::Connection;
use crate::config::Config;
use crate::error::Result;
use crate::service::Event;

/// How often the non-blocking accept loop checks for shutdown
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Listening socket for the page and WebSocket endpoints
pub struct Server {
    config: Arc<Config>,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
    next_id: AtomicU64,
}

impl Server {
    /// Bind to `config.listen_addr`
    pub fn bind(config: Arc<Config>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Flag that stops `run` once set
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Accept connections until the shutdown flag is set (blocking)
    pub fn run(&self, events: Sender<Event>) -> Result<()> {
        while !self.shutdown.load(Ordering::Acquire) {
            let (stream, addr) = match self.listener.accept() {
                Ok(accepted) => accepted,
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                    continue;
                }
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                    continue;
                }
            };

            // Accepted sockets inherit non-blocking mode on some platforms
            if let Err(e) = stream.set_nonblocking(false) {
                tracing::warn!("Dropping connection from {}: {}", addr, e);
                continue;
            }
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let config = Arc::clone(&self.config);
            let events = events.clone();

            tracing::trace!("Accepted connection #{} from {}", id, addr);

            let spawned = thread::Builder::new()
                .name(format!("webconfig-conn-{}", id))
                .spawn(move || match Connection::new(stream, id, config, events) {
                    Ok(mut conn) => {
                        if let Err(e) = conn.handle() {
                            tracing::debug!("Connection #{} from {} ended: {}", id, conn.peer_addr(), e);
                        }
                    }
                    Err(e) => tracing::warn!("Connection #{} setup failed: {}", id, e),
                });
            if let Err(e) = spawned {
                tracing::warn!("Could not spawn connection thread: {}", e);
            }
        }

        tracing::debug!("Acceptor stopped");
        Ok(())
    }
}
