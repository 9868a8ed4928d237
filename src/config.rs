//! Configuration for webconfig
//!
//! Centralized configuration with sensible defaults.

use crate::error::{Result, WebConfigError};

/// Suffix appended to the base path to form the WebSocket endpoint
pub const WS_PATH_SUFFIX: &str = "ws";

/// Username/password pair checked on every page request and socket upgrade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Create a credential pair
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Check a presented username/password against this pair
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

/// Main configuration for a webconfig instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Path serving the browser page; the socket lives at `{base_path}ws`
    pub base_path: String,

    /// Optional credential gate. `None` means no check at all.
    pub credentials: Option<Credentials>,

    /// Connection read timeout (milliseconds, 0 = block forever).
    ///
    /// A socket idle for longer is closed with a close frame, so a non-zero
    /// value also disconnects quiet browsers.
    pub read_timeout_ms: u64,

    /// Give up on a blocked socket write after this long and close the peer
    /// (milliseconds, 0 = block forever)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Protocol Limits
    // -------------------------------------------------------------------------
    /// Largest inbound frame payload accepted before the socket is dropped
    pub max_frame_size: usize,

    /// Frames queued per peer before further sends are dropped
    pub outbound_queue_size: usize,

    // -------------------------------------------------------------------------
    // Housekeeping
    // -------------------------------------------------------------------------
    /// Peers kept open by housekeeping; the oldest extras are closed
    pub max_clients: usize,

    /// Suggested cadence for calling `WebConfig::cleanup` (milliseconds)
    pub cleanup_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            base_path: "/config".to_string(),
            credentials: None,
            read_timeout_ms: 0,
            write_timeout_ms: 5000,
            max_frame_size: 64 * 1024, // 64 KB
            outbound_queue_size: 64,
            max_clients: 8,
            cleanup_interval_ms: 1000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Path of the WebSocket endpoint
    pub fn ws_path(&self) -> String {
        format!("{}{}", self.base_path, WS_PATH_SUFFIX)
    }

    /// Whether page requests and upgrades must pass a credential check
    pub fn auth_required(&self) -> bool {
        self.credentials.is_some()
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if !self.base_path.starts_with('/') {
            return Err(WebConfigError::Config(format!(
                "base path must start with '/': {:?}",
                self.base_path
            )));
        }
        if self.max_clients == 0 {
            return Err(WebConfigError::Config(
                "max_clients must be at least 1".to_string(),
            ));
        }
        if self.max_frame_size == 0 {
            return Err(WebConfigError::Config(
                "max_frame_size must be at least 1".to_string(),
            ));
        }
        if self.outbound_queue_size == 0 {
            return Err(WebConfigError::Config(
                "outbound_queue_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the base path of the page endpoint
    pub fn base_path(mut self, path: impl Into<String>) -> Self {
        self.config.base_path = path.into();
        self
    }

    /// Require a username/password.
    ///
    /// An empty username disables the credential check entirely.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        let username = username.into();
        self.config.credentials = if username.is_empty() {
            None
        } else {
            Some(Credentials::new(username, password))
        };
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set how many frames may wait per peer
    pub fn outbound_queue_size(mut self, size: usize) -> Self {
        self.config.outbound_queue_size = size;
        self
    }

    /// Set the largest accepted inbound frame payload (in bytes)
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.config.max_frame_size = size;
        self
    }

    /// Set how many peers housekeeping keeps open
    pub fn max_clients(mut self, count: usize) -> Self {
        self.config.max_clients = count;
        self
    }

    /// Set the housekeeping cadence (in milliseconds)
    pub fn cleanup_interval_ms(mut self, ms: u64) -> Self {
        self.config.cleanup_interval_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

