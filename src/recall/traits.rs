//! NoteSource trait definition
//!
//! Abstract interface for whatever produces the canonical notes of a pass.
//! Same shape as the other service seams of the crate: async trait +
//! `Send + Sync` so it can be shared as `Arc<dyn NoteSource>`.

use crate::error::Result;
use crate::notes::Note;
use async_trait::async_trait;

/// Produces the normalized, deduplicated notes for one pass.
///
/// # Implementations
///
/// - [`HttpRecallClient`](super::HttpRecallClient): the knowledge-recall HTTP API
/// - [`MockNoteSource`](super::MockNoteSource): in-memory notes for tests
#[async_trait]
pub trait NoteSource: Send + Sync {
    /// Fetch all notes currently recalled, at most one per `source_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream request fails or answers with a
    /// non-success status. An empty recall is `Ok(vec![])`.
    async fn fetch(&self) -> Result<Vec<Note>>;
}
