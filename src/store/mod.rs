//! Store Module
//!
//! The in-memory configuration map shared with the embedding application.
//!
//! ## Ownership
//! The application creates the map and keeps a [`SharedConfig`] handle to it;
//! the dispatcher holds a second handle and mutates entries in place. Nothing
//! is ever persisted.
//!
//! ## Data Structure Choice
//! `BTreeMap` keeps snapshots in a stable key order, which makes the page
//! render entries consistently across reconnects.

mod adapter;

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

pub use adapter::{deleted_notice, ApplyOutcome, ConfigStore};

/// Key/value configuration entries
pub type ConfigMap = BTreeMap<String, String>;

/// Handle to a config map shared between the application and the dispatcher
pub type SharedConfig = Arc<RwLock<ConfigMap>>;

/// Wrap a map so it can be shared with the dispatcher
pub fn shared(config: ConfigMap) -> SharedConfig {
    Arc::new(RwLock::new(config))
}
