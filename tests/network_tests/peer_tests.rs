//! Peer Tests
//!
//! Tests for the queued WebSocket peer handle over loopback sockets.

use std::io::BufReader;
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use webconfig::network::frame::{read_frame, OpCode};
use webconfig::network::WsPeer;
use webconfig::session::Peer;
use webconfig::WebConfigError;

// =============================================================================
// Helper Functions
// =============================================================================

/// Returns (server side, client side) of a loopback connection
fn socket_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
    let (server, _) = listener.accept().unwrap();
    (server, client)
}

fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

// =============================================================================
// Delivery Tests
// =============================================================================

#[test]
fn test_queued_frames_reach_client_in_order() {
    let (server, client) = socket_pair();
    let peer = WsPeer::spawn(1, server, "test", 8, None).unwrap();

    peer.send_text("cfg#a=1").unwrap();
    peer.send_text("msg#Done").unwrap();

    let mut reader = BufReader::new(client);
    let first = read_frame(&mut reader, 1024, false).unwrap();
    let second = read_frame(&mut reader, 1024, false).unwrap();
    assert_eq!(first.as_text(), Some("cfg#a=1"));
    assert_eq!(second.as_text(), Some("msg#Done"));
}

#[test]
fn test_close_sends_close_frame_then_shuts_down() {
    let (server, client) = socket_pair();
    let peer = WsPeer::spawn(2, server, "test", 8, None).unwrap();

    peer.close();
    assert!(!peer.is_open());
    assert!(matches!(
        peer.send_text("late"),
        Err(WebConfigError::ConnectionClosed)
    ));

    let mut reader = BufReader::new(client);
    let frame = read_frame(&mut reader, 1024, false).unwrap();
    assert_eq!(frame.opcode, OpCode::Close);
    assert!(read_frame(&mut reader, 1024, false).is_err());
}

// =============================================================================
// Backpressure Tests
// =============================================================================

#[test]
fn test_sends_to_stalled_client_never_block() {
    let (server, _client) = socket_pair();
    let peer = WsPeer::spawn(3, server, "stalled", 4, None).unwrap();
    let payload = "x".repeat(60 * 1024);

    let start = Instant::now();
    let mut dropped = 0;
    for _ in 0..400 {
        match peer.send_text(&payload) {
            Ok(()) => {}
            Err(WebConfigError::OutboundFull) => dropped += 1,
            Err(e) => panic!("unexpected send error: {}", e),
        }
    }

    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(dropped > 0);
    assert!(peer.is_open());

    // Close must not wait on the stuck writer either
    let start = Instant::now();
    peer.close();
    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(!peer.is_open());
}

#[test]
fn test_write_timeout_closes_stalled_peer() {
    let (server, _client) = socket_pair();
    let peer = WsPeer::spawn(4, server, "stalled", 1024, Some(Duration::from_millis(100))).unwrap();
    let payload = "x".repeat(60 * 1024);

    for _ in 0..400 {
        if peer.send_text(&payload).is_err() {
            break;
        }
    }

    assert!(wait_until(Duration::from_secs(10), || !peer.is_open()));
    assert!(matches!(
        peer.send_text("after timeout"),
        Err(WebConfigError::ConnectionClosed)
    ));
}
