//! WebSocket client
//!
//! Blocking client for the config socket, used by the CLI and tests.

use std::io::{BufReader, ErrorKind, Write};
use std::net::TcpStream;
use std::time::Duration;

use super::frame::{generate_mask, read_frame, write_frame, Frame, OpCode};
use super::handshake::{client_request, compute_accept_key, generate_client_key};
use super::http::ResponseHead;
use crate::config::Credentials;
use crate::error::{Result, WebConfigError};
use crate::protocol::{decode_update, encode_config_command, Update};

/// Largest frame the client accepts from the device
const CLIENT_MAX_FRAME: usize = 16 * 1024 * 1024;

/// Connected client
pub struct WsClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl WsClient {
    /// Connect to `ws://host[:port]/path` and perform the handshake
    pub fn connect(url: &str, credentials: Option<&Credentials>) -> Result<Self> {
        let (host, port, path) = parse_ws_url(url)?;

        let stream = TcpStream::connect((host.as_str(), port))?;
        stream.set_nodelay(true)?;
        let mut writer = stream.try_clone()?;
        let mut reader = BufReader::new(stream);

        let key = generate_client_key();
        let request = client_request(&format!("{}:{}", host, port), &path, &key, credentials);
        writer.write_all(request.as_bytes())?;
        writer.flush()?;

        let head = ResponseHead::read_from(&mut reader)?;
        match head.status {
            101 => {}
            401 => return Err(WebConfigError::Unauthorized),
            status => {
                return Err(WebConfigError::Handshake(format!(
                    "Server answered {} instead of 101",
                    status
                )))
            }
        }

        if head.header("Sec-WebSocket-Accept") != Some(compute_accept_key(&key).as_str()) {
            return Err(WebConfigError::Handshake(
                "Invalid Sec-WebSocket-Accept".to_string(),
            ));
        }

        Ok(Self { reader, writer })
    }

    /// Send one text frame
    pub fn send_text(&mut self, text: &str) -> Result<()> {
        write_frame(&mut self.writer, &Frame::text(text), Some(generate_mask()))
    }

    /// Send a raw frame (fragments, binary, pings)
    pub fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        write_frame(&mut self.writer, frame, Some(generate_mask()))
    }

    /// Set or delete a config entry
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.send_text(&encode_config_command(key, value))
    }

    /// Wait up to `timeout` for the next text frame.
    ///
    /// Returns `Ok(None)` on timeout. A timeout in the middle of a frame
    /// leaves the stream unusable, so keep timeouts generous.
    pub fn recv_text(&mut self, timeout: Duration) -> Result<Option<String>> {
        self.reader.get_ref().set_read_timeout(Some(timeout))?;

        loop {
            let frame = match read_frame(&mut self.reader, CLIENT_MAX_FRAME, false) {
                Ok(frame) => frame,
                Err(WebConfigError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    return Ok(None)
                }
                Err(WebConfigError::Io(ref e)) if e.kind() == ErrorKind::UnexpectedEof => {
                    return Err(WebConfigError::ConnectionClosed)
                }
                Err(e) => return Err(e),
            };

            match frame.opcode {
                OpCode::Text if frame.fin => {
                    return frame
                        .as_text()
                        .map(|t| Some(t.to_string()))
                        .ok_or_else(|| WebConfigError::Frame("Text frame is not UTF-8".to_string()));
                }
                OpCode::Ping => self.send_frame(&Frame::pong(frame.payload))?,
                OpCode::Close => return Err(WebConfigError::ConnectionClosed),
                _ => continue,
            }
        }
    }

    /// Wait for the next frame and decode it
    pub fn recv_update(&mut self, timeout: Duration) -> Result<Option<Update>> {
        Ok(self.recv_text(timeout)?.map(|text| decode_update(&text)))
    }

    /// Send a close frame and drop the connection
    pub fn close(mut self) -> Result<()> {
        self.send_frame(&Frame::close())?;
        let _ = self.writer.shutdown(std::net::Shutdown::Both);
        Ok(())
    }
}

/// Parse `ws://host[:port]/path`
pub fn parse_ws_url(url: &str) -> Result<(String, u16, String)> {
    let rest = url
        .strip_prefix("ws://")
        .ok_or_else(|| WebConfigError::Config(format!("URL must start with ws://: {}", url)))?;

    let (host_port, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };

    let (host, port) = match host_port.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| WebConfigError::Config(format!("Invalid port in {}", url)))?;
            (host, port)
        }
        None => (host_port, 80),
    };

    if host.is_empty() {
        return Err(WebConfigError::Config(format!("Missing host in {}", url)));
    }

    Ok((host.to_string(), port, path.to_string()))
}
