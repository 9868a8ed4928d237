//! Session Tests
//!
//! Tests verify:
//! - Snapshot on connect (suppressed for an empty map)
//! - Set/delete acknowledgements
//! - Fallback handler routing
//! - Single-slot replacement on reconnect
//! - Silent skips for absent or closed peers

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use parking_lot::Mutex;
use webconfig::network::Frame;
use webconfig::session::{Peer, Session, SessionState};
use webconfig::store::{self, ConfigStore};
use webconfig::{ConfigMap, SharedConfig};

use common::RecordingPeer;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_session(entries: &[(&str, &str)]) -> (SharedConfig, Session<RecordingPeer>) {
    let map: ConfigMap = entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let shared = store::shared(map);
    let session = Session::new(ConfigStore::new(Arc::clone(&shared)));
    (shared, session)
}

/// Handler that records every invocation
fn recording_handler(session: &mut Session<RecordingPeer>) -> Arc<Mutex<Vec<Vec<u8>>>> {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    session.set_handler(Box::new(move |data: &[u8]| sink.lock().push(data.to_vec())));
    calls
}

// =============================================================================
// Connect / Disconnect Tests
// =============================================================================

#[test]
fn test_new_session_is_disconnected() {
    let (_shared, session) = setup_session(&[]);
    assert_eq!(session.state(), SessionState::Disconnected);
    assert!(session.peer().is_none());
    assert!(!session.has_handler());
}

#[test]
fn test_connect_sends_snapshot() {
    let (_shared, mut session) = setup_session(&[("a", "1"), ("b", "2")]);
    let peer = RecordingPeer::new(1);

    session.on_connect(peer.clone());

    assert_eq!(session.state(), SessionState::Connected(1));
    assert_eq!(peer.sent(), vec!["cfg#a=1#b=2"]);
}

#[test]
fn test_connect_with_empty_map_sends_nothing() {
    let (_shared, mut session) = setup_session(&[]);
    let peer = RecordingPeer::new(1);

    session.on_connect(peer.clone());

    assert_eq!(session.state(), SessionState::Connected(1));
    assert!(peer.sent().is_empty());
}

#[test]
fn test_disconnect_clears_peer() {
    let (_shared, mut session) = setup_session(&[]);
    session.on_connect(RecordingPeer::new(1));

    assert!(session.on_disconnect(1));
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[test]
fn test_second_connect_replaces_without_close() {
    let (_shared, mut session) = setup_session(&[("a", "1")]);
    let first = RecordingPeer::new(1);
    let second = RecordingPeer::new(2);

    session.on_connect(first.clone());
    let previous = session.on_connect(second.clone());

    assert_eq!(previous.map(|p| p.id()), Some(1));
    assert_eq!(session.state(), SessionState::Connected(2));
    assert!(!first.was_closed_by_server());
    assert_eq!(second.sent(), vec!["cfg#a=1"]);

    // Further traffic goes to the new peer only
    first.take_sent();
    session.on_message(b"cfg#b=2");
    assert!(first.sent().is_empty());
    assert_eq!(second.sent(), vec!["cfg#a=1", "msg#Done"]);
}

#[test]
fn test_disconnect_of_superseded_peer_keeps_current() {
    let (_shared, mut session) = setup_session(&[]);
    session.on_connect(RecordingPeer::new(1));
    session.on_connect(RecordingPeer::new(2));

    assert!(!session.on_disconnect(1));
    assert_eq!(session.state(), SessionState::Connected(2));
}

#[test]
fn test_cleanup_drops_closed_peer() {
    let (_shared, mut session) = setup_session(&[]);
    let peer = RecordingPeer::new(7);
    session.on_connect(peer.clone());

    assert!(!session.cleanup());
    peer.drop_connection();
    assert!(session.cleanup());
    assert_eq!(session.state(), SessionState::Disconnected);
}

// =============================================================================
// Config Command Tests
// =============================================================================

#[test]
fn test_end_to_end_scenario() {
    let (shared, mut session) = setup_session(&[("a", "1")]);
    let calls = recording_handler(&mut session);
    let peer = RecordingPeer::new(1);

    session.on_connect(peer.clone());
    assert_eq!(peer.take_sent(), vec!["cfg#a=1"]);

    session.on_message(b"cfg#a=");
    assert!(shared.read().is_empty());
    assert_eq!(
        peer.take_sent(),
        vec!["msg#'a' delete from config", "msg#Done"]
    );

    session.on_message(b"cfg#b=2");
    assert_eq!(shared.read().get("b").map(String::as_str), Some("2"));
    assert_eq!(shared.read().len(), 1);
    assert_eq!(peer.take_sent(), vec!["msg#Done"]);

    session.on_message(b"ping");
    let calls = calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], b"ping");
    assert_eq!(calls[0].len(), 4);
    assert!(peer.sent().is_empty());
}

#[test]
fn test_delete_of_absent_key_still_acknowledged() {
    let (shared, mut session) = setup_session(&[("b", "2")]);
    let peer = RecordingPeer::new(1);
    session.on_connect(peer.clone());
    peer.take_sent();

    session.on_message(b"cfg#x=");

    assert_eq!(shared.read().len(), 1);
    assert_eq!(
        peer.sent(),
        vec!["msg#'x' delete from config", "msg#Done"]
    );
}

#[test]
fn test_config_command_does_not_reach_handler() {
    let (_shared, mut session) = setup_session(&[]);
    let calls = recording_handler(&mut session);
    session.on_connect(RecordingPeer::new(1));

    session.on_message(b"cfg#x=1");

    assert!(calls.lock().is_empty());
}

// =============================================================================
// Fallback Handler Tests
// =============================================================================

#[test]
fn test_malformed_config_falls_through_to_handler() {
    let (shared, mut session) = setup_session(&[]);
    let calls = recording_handler(&mut session);
    let peer = RecordingPeer::new(1);
    session.on_connect(peer.clone());

    session.on_message(b"cfg#x");
    session.on_message(b"cfg#x=1#y=2");
    session.on_message(b"foo#bar");

    assert!(shared.read().is_empty());
    assert_eq!(
        *calls.lock(),
        vec![b"cfg#x".to_vec(), b"cfg#x=1#y=2".to_vec(), b"foo#bar".to_vec()]
    );
    assert!(peer.sent().is_empty());
}

#[test]
fn test_no_handler_drops_silently() {
    let (_shared, mut session) = setup_session(&[]);
    let peer = RecordingPeer::new(1);
    session.on_connect(peer.clone());

    session.on_message(b"reboot");

    assert!(peer.sent().is_empty());
}

#[test]
fn test_handler_registration_last_wins() {
    let (_shared, mut session) = setup_session(&[]);
    let first = recording_handler(&mut session);
    let second = recording_handler(&mut session);
    session.on_connect(RecordingPeer::new(1));

    session.on_message(b"ping");

    assert!(first.lock().is_empty());
    assert_eq!(second.lock().len(), 1);
}

// =============================================================================
// Frame Filtering Tests
// =============================================================================

#[test]
fn test_only_complete_text_frames_dispatched() {
    let (shared, mut session) = setup_session(&[]);
    let calls = recording_handler(&mut session);
    let peer = RecordingPeer::new(1);
    session.on_connect(peer.clone());

    session.on_frame(&Frame::binary(&b"cfg#x=1"[..]));
    session.on_frame(&Frame::text("cfg#y=").fragment());
    session.on_frame(&Frame::continuation(&b"2"[..], true));
    assert!(shared.read().is_empty());
    assert!(calls.lock().is_empty());
    assert!(peer.sent().is_empty());

    session.on_frame(&Frame::text("cfg#z=3"));
    assert_eq!(shared.read().get("z").map(String::as_str), Some("3"));
    assert_eq!(peer.sent(), vec!["msg#Done"]);
}

// =============================================================================
// Skip Conditions Tests
// =============================================================================

#[test]
fn test_frames_while_disconnected_are_noop() {
    let (shared, mut session) = setup_session(&[("a", "1")]);
    let calls = recording_handler(&mut session);

    session.on_message(b"cfg#a=");
    session.on_message(b"ping");

    assert_eq!(shared.read().len(), 1);
    assert!(calls.lock().is_empty());
}

#[test]
fn test_msg_without_peer_is_skipped() {
    let (_shared, session) = setup_session(&[]);
    session.msg("nobody listening");
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[test]
fn test_msg_to_closed_peer_is_skipped() {
    let (_shared, mut session) = setup_session(&[]);
    let peer = RecordingPeer::new(1);
    session.on_connect(peer.clone());
    peer.drop_connection();

    session.msg("hello");
    session.send_config();

    assert!(peer.sent().is_empty());
}

#[test]
fn test_send_failure_is_swallowed() {
    let (shared, mut session) = setup_session(&[]);
    let peer = RecordingPeer::new(1);
    session.on_connect(peer.clone());
    peer.fail_sends();

    session.on_message(b"cfg#x=1");

    assert_eq!(shared.read().len(), 1);
    assert!(peer.sent().is_empty());
}

#[test]
fn test_send_config_reflects_current_map() {
    let (shared, mut session) = setup_session(&[]);
    let peer = RecordingPeer::new(1);
    session.on_connect(peer.clone());

    shared.write().insert("k".to_string(), "v".to_string());
    session.send_config();

    assert_eq!(peer.sent(), vec!["cfg#k=v"]);
}
