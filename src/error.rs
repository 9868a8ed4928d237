//! Error types for webconfig
//!
//! The protocol core (tokenizer, codec, store adapter, session) never fails;
//! these errors come from the transport and from configuration validation.

use thiserror::Error;

/// Result type alias using WebConfigError
pub type Result<T> = std::result::Result<T, WebConfigError>;

/// Unified error type for webconfig operations
#[derive(Debug, Error)]
pub enum WebConfigError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // HTTP / Handshake Errors
    // -------------------------------------------------------------------------
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("WebSocket handshake failed: {0}")]
    Handshake(String),

    #[error("Unauthorized")]
    Unauthorized,

    // -------------------------------------------------------------------------
    // Frame Errors
    // -------------------------------------------------------------------------
    #[error("Invalid WebSocket frame: {0}")]
    Frame(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Outbound queue full, frame dropped")]
    OutboundFull,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Thread error: {0}")]
    Thread(String),
}
