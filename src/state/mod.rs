//! Sync state module
//!
//! Per-note replication status persisted across runs as a single JSON file.

pub mod models;
pub mod store;

pub use models::{SyncState, SyncStateEntry, STATE_VERSION};
pub use store::StateStore;
