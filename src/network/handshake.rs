//! Upgrade handshake and credential check
//!
//! RFC 6455 opening handshake plus HTTP Basic authentication for both the
//! page and the socket endpoint.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha1::{Digest, Sha1};

use super::http::{HttpRequest, HttpResponse};
use crate::config::Credentials;
use crate::error::{Result, WebConfigError};

/// Fixed GUID appended to the client key (RFC 6455 §1.3)
pub const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Only protocol version the server speaks
pub const WEBSOCKET_VERSION: &str = "13";

/// Realm announced in 401 responses
pub const AUTH_REALM: &str = "webconfig";

/// Compute the Sec-WebSocket-Accept value for a client key
pub fn compute_accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Whether the request asks to switch to the WebSocket protocol
pub fn is_upgrade_request(request: &HttpRequest) -> bool {
    request.header_contains("Upgrade", "websocket") && request.header_contains("Connection", "upgrade")
}

/// Validate an upgrade request and build the 101 response
pub fn accept_upgrade(request: &HttpRequest) -> Result<HttpResponse> {
    if request.method != "GET" {
        return Err(WebConfigError::Handshake(format!(
            "Upgrade with method {}",
            request.method
        )));
    }
    if !is_upgrade_request(request) {
        return Err(WebConfigError::Handshake(
            "Missing Upgrade/Connection headers".to_string(),
        ));
    }
    if request.header("Sec-WebSocket-Version") != Some(WEBSOCKET_VERSION) {
        return Err(WebConfigError::Handshake(format!(
            "Unsupported version: {:?}",
            request.header("Sec-WebSocket-Version")
        )));
    }
    let key = request
        .header("Sec-WebSocket-Key")
        .filter(|k| !k.is_empty())
        .ok_or_else(|| WebConfigError::Handshake("Missing Sec-WebSocket-Key".to_string()))?;

    Ok(HttpResponse::switching_protocols(&compute_accept_key(key)))
}

// =============================================================================
// Basic Authentication
// =============================================================================

/// Check the request's Basic credentials.
///
/// With no credentials configured every request passes.
pub fn authenticate(request: &HttpRequest, credentials: Option<&Credentials>) -> bool {
    let Some(expected) = credentials else {
        return true;
    };

    match request.header("Authorization").and_then(parse_basic_auth) {
        Some((username, password)) => expected.matches(&username, &password),
        None => false,
    }
}

/// Decode an `Authorization: Basic ...` value into username and password
pub fn parse_basic_auth(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Build an `Authorization` header value
pub fn basic_auth_header(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", username, password))
    )
}

// =============================================================================
// Client Side
// =============================================================================

/// Random-enough Sec-WebSocket-Key for the client handshake
pub fn generate_client_key() -> String {
    let mut bytes = [0u8; 16];
    for chunk in bytes.chunks_mut(4) {
        chunk.copy_from_slice(&super::frame::generate_mask());
        std::thread::yield_now();
    }
    STANDARD.encode(bytes)
}

/// Client upgrade request text
pub fn client_request(host: &str, path: &str, key: &str, credentials: Option<&Credentials>) -> String {
    let mut request = format!(
        "GET {} HTTP/1.1\r\n\
         Host: {}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: {}\r\n\
         Sec-WebSocket-Version: {}\r\n",
        path, host, key, WEBSOCKET_VERSION
    );
    if let Some(creds) = credentials {
        request.push_str(&format!(
            "Authorization: {}\r\n",
            basic_auth_header(&creds.username, &creds.password)
        ));
    }
    request.push_str("\r\n");
    request
}
