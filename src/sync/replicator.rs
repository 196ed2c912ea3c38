//! Replicator trait definition
//!
//! The seam shared by both replication strategies: the browser-driven
//! [`UiReplicator`](crate::reconcile::UiReplicator) and the structured
//! [`NotionApiReplicator`](crate::notion::NotionApiReplicator). Both take
//! the same notes and the same read-only state and report per-note
//! outcomes; neither writes the state itself.

use async_trait::async_trait;

use super::models::NoteOutcome;
use crate::error::Result;
use crate::notes::Note;
use crate::state::SyncState;

#[async_trait]
pub trait Replicator: Send + Sync {
    /// Replicate `notes` in order and report one outcome per note, in the
    /// same order.
    ///
    /// # Errors
    ///
    /// Only pass-fatal conditions (see [`SyncError::is_pass_fatal`]) and
    /// session setup failures are returned as `Err`; every other failure is
    /// reported as [`NoteOutcome::Failed`] for the note it concerns.
    ///
    /// [`SyncError::is_pass_fatal`]: crate::error::SyncError::is_pass_fatal
    async fn replicate(&self, notes: &[Note], state: &SyncState) -> Result<Vec<NoteOutcome>>;

    /// Strategy name for logs.
    fn name(&self) -> &'static str;
}
