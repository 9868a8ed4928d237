//! Network Module
//!
//! HTTP page delivery and the WebSocket transport.
//!
//! ## Architecture
//! - Single acceptor thread (non-blocking accept, polls for shutdown)
//! - One thread per connection: HTTP head, then either the gzip page or the
//!   upgrade followed by a frame read loop
//! - Frames are forwarded to the dispatcher; writes go through `WsPeer`
//!
//! ## Endpoints
//! - `GET {base_path}`   : the browser page (`Content-Encoding: gzip`)
//! - `GET {base_path}ws` : WebSocket upgrade
//!
//! Both are gated by HTTP Basic auth when credentials are configured.

mod server;
mod connection;
mod peer;
mod registry;
mod page;
pub mod frame;
pub mod http;
pub mod handshake;
pub mod client;

pub use server::Server;
pub use connection::Connection;
pub use peer::WsPeer;
pub use registry::PeerRegistry;
pub use page::{page_response, CONFIG_PAGE_GZ};
pub use frame::{Frame, OpCode};
pub use client::WsClient;
