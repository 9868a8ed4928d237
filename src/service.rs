//! Service Module
//!
//! The embedding API. Wires the acceptor, the connection threads and the
//! single dispatcher thread together.
//!
//! ## Threads
//! ```text
//!  acceptor ──spawn──► connection #1 ─┐
//!                      connection #2 ─┼──► Event channel ──► dispatcher
//!  application (msg, on_cmd, cleanup)─┘                      (Session,
//!                                                             PeerRegistry)
//! ```
//! All protocol logic runs on the dispatcher thread, so the session needs no
//! locking of its own. The config map is shared with the application behind
//! a `parking_lot::RwLock`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{unbounded, Receiver, Sender};

use crate::config::Config;
use crate::error::{Result, WebConfigError};
use crate::network::{Frame, PeerRegistry, Server, WsPeer};
use crate::session::{CommandHandler, Peer, PeerId, Session};
use crate::store::{ConfigStore, SharedConfig};

/// Everything the dispatcher thread reacts to
pub enum Event {
    /// Upgrade completed
    Connected(WsPeer),

    /// Data frame read by a connection thread
    Frame { peer: PeerId, frame: Frame },

    /// Connection thread finished
    Disconnected(PeerId),

    /// Application status line for the active peer
    Status(String),

    /// Application asks for the snapshot to be pushed again
    SyncConfig,

    /// Replace the fallback command handler
    SetHandler(CommandHandler),

    /// Periodic housekeeping
    Cleanup,

    Shutdown,
}

/// Cloneable handle for talking to the active peer from any thread,
/// including from inside a command handler.
#[derive(Clone)]
pub struct Notifier {
    events: Sender<Event>,
}

impl Notifier {
    /// Send `msg#<text>` to the active peer, if one is open
    pub fn msg(&self, text: impl Into<String>) {
        self.post(Event::Status(text.into()));
    }

    /// Push the current config snapshot to the active peer
    pub fn send_config(&self) {
        self.post(Event::SyncConfig);
    }

    /// Run housekeeping on the dispatcher
    pub fn cleanup(&self) {
        self.post(Event::Cleanup);
    }

    fn post(&self, event: Event) {
        if self.events.send(event).is_err() {
            tracing::debug!("Dispatcher stopped, event dropped");
        }
    }
}

/// A running config server
///
/// ```no_run
/// use webconfig::{store, Config, ConfigMap, WebConfig};
///
/// let mut map = ConfigMap::new();
/// map.insert("ssid".to_string(), "home".to_string());
/// let shared = store::shared(map);
///
/// let web = WebConfig::begin(Config::default(), shared.clone())?;
/// web.on_cmd(|data| println!("command: {:?}", data));
/// loop {
///     std::thread::sleep(std::time::Duration::from_secs(1));
///     web.cleanup();
/// }
/// # Ok::<(), webconfig::WebConfigError>(())
/// ```
pub struct WebConfig {
    config: Arc<Config>,
    local_addr: SocketAddr,
    store: ConfigStore,
    notifier: Notifier,
    shutdown: Arc<AtomicBool>,
    acceptor: Option<JoinHandle<()>>,
    dispatcher: Option<JoinHandle<()>>,
}

impl WebConfig {
    /// Bind the listener and start serving `map`
    ///
    /// The page is served at `config.base_path`, the socket at
    /// `config.base_path + "ws"`.
    pub fn begin(config: Config, map: SharedConfig) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);

        let server = Server::bind(Arc::clone(&config))?;
        let local_addr = server.local_addr()?;
        let shutdown = server.shutdown_flag();

        let (events, receiver) = unbounded();
        let store = ConfigStore::new(map);

        let dispatcher = Dispatcher::new(store.clone(), config.max_clients);
        let dispatcher = thread::Builder::new()
            .name("webconfig-dispatch".to_string())
            .spawn(move || dispatcher.run(receiver))?;

        let acceptor_events = events.clone();
        let acceptor = thread::Builder::new()
            .name("webconfig-accept".to_string())
            .spawn(move || {
                if let Err(e) = server.run(acceptor_events) {
                    tracing::error!("Acceptor stopped: {}", e);
                }
            })?;

        tracing::info!(
            "Serving config page at http://{}{} (socket {})",
            local_addr,
            config.base_path,
            config.ws_path()
        );

        Ok(Self {
            config,
            local_addr,
            store,
            notifier: Notifier { events },
            shutdown,
            acceptor: Some(acceptor),
            dispatcher: Some(dispatcher),
        })
    }

    /// Register the handler for frames that are not config commands.
    ///
    /// A later registration replaces the earlier one.
    pub fn on_cmd<F>(&self, handler: F)
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        self.notifier.post(Event::SetHandler(Box::new(handler)));
    }

    /// Send `msg#<text>` to the active peer, if one is open
    pub fn msg(&self, text: impl Into<String>) {
        self.notifier.msg(text);
    }

    /// Push the current snapshot again, e.g. after the application edited
    /// the map itself
    pub fn send_config(&self) {
        self.notifier.send_config();
    }

    /// Housekeeping; call on a regular cadence from the main loop
    pub fn cleanup(&self) {
        self.notifier.cleanup();
    }

    /// A handle usable from other threads and from inside handlers
    pub fn notifier(&self) -> Notifier {
        self.notifier.clone()
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The shared config map
    pub fn shared(&self) -> &SharedConfig {
        self.store.shared()
    }

    /// Stop accepting, close every peer and join the service threads
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::Release);
        self.notifier.post(Event::Shutdown);

        let mut result = Ok(());
        for (name, handle) in [("acceptor", self.acceptor.take()), ("dispatcher", self.dispatcher.take())] {
            if let Some(handle) = handle {
                if handle.join().is_err() {
                    result = Err(WebConfigError::Thread(format!("{} thread panicked", name)));
                }
            }
        }
        result
    }
}

impl Drop for WebConfig {
    fn drop(&mut self) {
        if self.acceptor.is_some() || self.dispatcher.is_some() {
            if let Err(e) = self.stop() {
                tracing::warn!("Error stopping webconfig: {}", e);
            }
        }
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Owns the session and the registry; runs on its own thread
struct Dispatcher {
    session: Session<WsPeer>,
    registry: PeerRegistry<WsPeer>,
    max_clients: usize,
}

impl Dispatcher {
    fn new(store: ConfigStore, max_clients: usize) -> Self {
        Self {
            session: Session::new(store),
            registry: PeerRegistry::new(),
            max_clients,
        }
    }

    fn run(mut self, events: Receiver<Event>) {
        for event in events {
            match event {
                Event::Connected(peer) => {
                    tracing::debug!("WebSocket client #{} connected from {}", peer.id(), peer.remote_addr());
                    self.registry.insert(peer.clone());
                    self.session.on_connect(peer);
                    self.housekeeping();
                }
                Event::Disconnected(id) => {
                    tracing::debug!("WebSocket client #{} disconnected", id);
                    self.registry.remove(id);
                    self.session.on_disconnect(id);
                }
                Event::Frame { peer, frame } => {
                    tracing::trace!("WebSocket data received from client #{}", peer);
                    self.session.on_frame(&frame);
                }
                Event::Status(text) => self.session.msg(&text),
                Event::SyncConfig => self.session.send_config(),
                Event::SetHandler(handler) => self.session.set_handler(handler),
                Event::Cleanup => self.housekeeping(),
                Event::Shutdown => break,
            }
        }

        self.registry.close_all();
        tracing::debug!("Dispatcher stopped");
    }

    fn housekeeping(&mut self) {
        let removed = self.registry.cleanup(self.max_clients);
        if removed > 0 {
            tracing::debug!("Housekeeping removed {} peers", removed);
        }
        self.session.cleanup();
    }
}
