//! # webconfig
//!
//! A live, browser-editable key/value configuration for a single device:
//! - Gzip-embedded config page served over HTTP
//! - WebSocket text protocol (`cfg#k=v`, `msg#text`)
//! - One active peer at a time, snapshot pushed on connect
//! - Opaque application commands through the same socket
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 HTTP / WebSocket Transport                   │
//! │           (acceptor + one thread per connection)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ events
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                Session / Dispatch                            │
//! │          (single thread, single peer slot)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │ Config Store│          │  Command     │
//!   │  (RwLock)   │          │  Handler     │
//!   └─────────────┘          └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod store;
pub mod session;
pub mod network;
pub mod service;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{WebConfigError, Result};
pub use config::{Config, Credentials};
pub use store::{ConfigMap, SharedConfig};
pub use service::{Notifier, WebConfig};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of webconfig
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
