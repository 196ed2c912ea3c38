//! Structured-API replication path (`SYNC_STRATEGY=api`)
//!
//! - `client`: Notion REST calls (reqwest)
//! - `properties`: schema checks and property payloads
//! - `replicator`: `NotionApiReplicator`

pub mod client;
pub mod properties;
pub mod replicator;

pub use client::{NotionClient, DEFAULT_NOTION_API_BASE, NOTION_API_VERSION};
pub use properties::DatabaseSchema;
pub use replicator::NotionApiReplicator;
