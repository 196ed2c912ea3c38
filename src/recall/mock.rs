//! Mock note source for tests

use super::traits::NoteSource;
use crate::error::{Result, SyncError};
use crate::notes::Note;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory `NoteSource` returning a replaceable set of notes.
///
/// # Example
///
/// ```rust
/// use recall_sync::recall::{MockNoteSource, NoteSource};
///
/// # tokio_test::block_on(async {
/// let source = MockNoteSource::new(vec![]);
/// assert!(source.fetch().await.unwrap().is_empty());
/// assert_eq!(source.fetch_count(), 1);
/// # });
/// ```
pub struct MockNoteSource {
    notes: RwLock<Vec<Note>>,
    fail_with: RwLock<Option<String>>,
    fetches: AtomicUsize,
}

impl MockNoteSource {
    pub fn new(notes: Vec<Note>) -> Self {
        Self {
            notes: RwLock::new(notes),
            fail_with: RwLock::new(None),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Replace the notes returned by subsequent fetches.
    pub async fn set_notes(&self, notes: Vec<Note>) {
        *self.notes.write().await = notes;
    }

    /// Make subsequent fetches fail with an upstream error (`None` clears it).
    pub async fn set_failure(&self, message: Option<&str>) {
        *self.fail_with.write().await = message.map(str::to_string);
    }

    /// Number of `fetch` calls so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Default for MockNoteSource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl NoteSource for MockNoteSource {
    async fn fetch(&self) -> Result<Vec<Note>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fail_with.read().await.clone() {
            return Err(SyncError::RecallApi {
                status: 503,
                body: message,
            });
        }
        Ok(self.notes.read().await.clone())
    }
}
