//! Notes module
//!
//! Canonical note records and the normalization that produces them from
//! raw recall responses: envelope detection, field aliasing, source
//! identity, deduplication and content fingerprinting.

pub mod hashing;
pub mod models;
pub mod normalize;

pub use hashing::content_hash;
pub use models::*;
pub use normalize::{normalize_items, normalize_payload, recall_items};
