//! Session Module
//!
//! Single-slot peer tracking and dispatch of inbound frames.
//!
//! ## State Machine
//! ```text
//!              connect(p)                     frame
//!   ┌──────────────┐ ───────────► ┌──────────────┐ ◄──┐
//!   │ Disconnected │              │ Connected(p) │ ───┘
//!   └──────────────┘ ◄─────────── └──────────────┘
//!                   disconnect(p)      │  ▲
//!                                      └──┘ connect(q): q replaces p
//! ```
//!
//! ## Concurrency
//! A `Session` is owned by exactly one thread (the dispatcher). It holds no
//! locks of its own; the config map lock is taken only inside the store
//! adapter.

mod peer;
mod state;

pub use peer::{Peer, PeerId};
pub use state::{CommandHandler, Session, SessionState, DONE_STATUS};
