//! Change detection and replication contracts
//!
//! - `changeset`: which notes need replication this pass
//! - `models`: per-note outcomes and pass summaries
//! - `replicator`: the trait both replication strategies implement

pub mod changeset;
pub mod models;
pub mod replicator;

pub use changeset::{compute_change_set, needs_replication, ChangeSet};
pub use models::{NoteOutcome, PassSummary, ReconciliationResult, ReplicationMode};
pub use replicator::Replicator;
