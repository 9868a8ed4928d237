//! Minimal HTTP/1.1
//!
//! Just enough to serve the page and accept the WebSocket upgrade: a request
//! head parser and a response builder. Request bodies are never read.

use std::io::{BufRead, Read, Write};

use crate::error::{Result, WebConfigError};

/// Upper bound on the start line plus headers
pub const MAX_HEAD_SIZE: usize = 8 * 1024;

/// Parsed HTTP request head
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// Read a request head (up to the blank line) from a stream
    pub fn read_from<R: BufRead>(reader: &mut R) -> Result<Self> {
        let mut head_size = 0;
        let mut line = String::new();

        let request_line = read_line(reader, &mut line, &mut head_size)?;
        if request_line.is_empty() {
            return Err(WebConfigError::Http("Empty request".to_string()));
        }
        let (method, path) = parse_request_line(&request_line)?;

        let mut headers = Vec::new();
        loop {
            let header_line = read_line(reader, &mut line, &mut head_size)?;
            if header_line.is_empty() {
                break;
            }
            headers.push(parse_header_line(&header_line)?);
        }

        Ok(Self {
            method,
            path,
            headers,
        })
    }

    /// Get header value by name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether a comma-separated header contains `token` (case-insensitive)
    pub fn header_contains(&self, name: &str, token: &str) -> bool {
        self.header(name)
            .map(|v| v.split(',').any(|t| t.trim().eq_ignore_ascii_case(token)))
            .unwrap_or(false)
    }

    /// Request path without query string
    pub fn route(&self) -> &str {
        self.path.split('?').next().unwrap_or(&self.path)
    }
}

/// Status line and headers of a response (client side)
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: u16,
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    /// Read a response head (up to the blank line) from a stream
    pub fn read_from<R: BufRead>(reader: &mut R) -> Result<Self> {
        let mut head_size = 0;
        let mut line = String::new();

        let status_line = read_line(reader, &mut line, &mut head_size)?;
        let status = status_line
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse::<u16>().ok())
            .filter(|_| status_line.starts_with("HTTP/1."))
            .ok_or_else(|| WebConfigError::Http(format!("Malformed status line: {:?}", status_line)))?;

        let mut headers = Vec::new();
        loop {
            let header_line = read_line(reader, &mut line, &mut head_size)?;
            if header_line.is_empty() {
                break;
            }
            headers.push(parse_header_line(&header_line)?);
        }

        Ok(Self { status, headers })
    }

    /// Get header value by name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn read_line<R: BufRead>(reader: &mut R, buf: &mut String, head_size: &mut usize) -> Result<String> {
    buf.clear();
    // Never buffer more than one byte past the head limit
    let remaining = (MAX_HEAD_SIZE - *head_size + 1) as u64;
    let n = reader.by_ref().take(remaining).read_line(buf)?;
    if n == 0 {
        return Err(WebConfigError::ConnectionClosed);
    }
    *head_size += n;
    if *head_size > MAX_HEAD_SIZE {
        return Err(WebConfigError::Http(format!(
            "Message head too large (max {} bytes)",
            MAX_HEAD_SIZE
        )));
    }
    Ok(buf.trim_end_matches(&['\r', '\n'][..]).to_string())
}

fn parse_request_line(line: &str) -> Result<(String, String)> {
    let mut parts = line.split_whitespace();
    let method = parts.next();
    let path = parts.next();
    let version = parts.next();

    match (method, path, version) {
        (Some(method), Some(path), Some(version)) if version.starts_with("HTTP/1.") => {
            Ok((method.to_string(), path.to_string()))
        }
        _ => Err(WebConfigError::Http(format!(
            "Malformed request line: {:?}",
            line
        ))),
    }
}

fn parse_header_line(line: &str) -> Result<(String, String)> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| WebConfigError::Http(format!("Malformed header: {:?}", line)))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

// =============================================================================
// Response
// =============================================================================

/// HTTP response builder
#[derive(Debug)]
pub struct HttpResponse {
    status: u16,
    status_text: &'static str,
    headers: Vec<(&'static str, String)>,
    body: Vec<u8>,
}

impl HttpResponse {
    fn new(status: u16, status_text: &'static str) -> Self {
        Self {
            status,
            status_text,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200, "OK")
    }

    pub fn bad_request() -> Self {
        Self::new(400, "Bad Request").with_text("Bad Request")
    }

    pub fn not_found() -> Self {
        Self::new(404, "Not Found").with_text("Not Found")
    }

    pub fn method_not_allowed() -> Self {
        Self::new(405, "Method Not Allowed").with_text("Method Not Allowed")
    }

    /// 401 asking the browser for Basic credentials
    pub fn unauthorized(realm: &str) -> Self {
        Self::new(401, "Unauthorized")
            .with_header("WWW-Authenticate", format!("Basic realm=\"{}\"", realm))
            .with_text("Unauthorized")
    }

    /// 101 completing a WebSocket upgrade
    pub fn switching_protocols(accept_key: &str) -> Self {
        Self::new(101, "Switching Protocols")
            .with_header("Upgrade", "websocket")
            .with_header("Connection", "Upgrade")
            .with_header("Sec-WebSocket-Accept", accept_key)
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn with_body(mut self, content_type: &str, body: Vec<u8>) -> Self {
        self.headers.push(("Content-Type", content_type.to_string()));
        self.body = body;
        self
    }

    fn with_text(self, text: &str) -> Self {
        self.with_body("text/plain", text.as_bytes().to_vec())
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Serialize head and body
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128 + self.body.len());
        out.extend_from_slice(format!("HTTP/1.1 {} {}\r\n", self.status, self.status_text).as_bytes());
        for (name, value) in &self.headers {
            out.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }
        if self.status != 101 {
            out.extend_from_slice(format!("Content-Length: {}\r\n", self.body.len()).as_bytes());
            out.extend_from_slice(b"Connection: close\r\n");
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
        out
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        writer.flush()?;
        Ok(())
    }
}
