//! Change-set computation
//!
//! A note needs replication when the state has no entry for its
//! `source_id` or the stored hash differs from the note's current hash.
//! Nothing else is compared: the hash is the only change oracle.

use crate::notes::Note;
use crate::state::SyncState;

/// Notes selected for one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Changed notes in their original order, capped at the per-pass maximum
    pub notes: Vec<Note>,
    /// Number of changed notes before the cap was applied
    pub total_changed: usize,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Changed notes left for a later pass.
    pub fn deferred(&self) -> usize {
        self.total_changed - self.notes.len()
    }
}

/// Whether a note differs from what was last replicated.
pub fn needs_replication(note: &Note, state: &SyncState) -> bool {
    state
        .entry(&note.source_id)
        .map_or(true, |entry| entry.content_hash != note.content_hash)
}

/// Select the notes to replicate this pass.
///
/// Keeps the input order and takes at most `max_per_run` notes.
pub fn compute_change_set(notes: &[Note], state: &SyncState, max_per_run: usize) -> ChangeSet {
    let changed: Vec<&Note> = notes
        .iter()
        .filter(|note| needs_replication(note, state))
        .collect();

    ChangeSet {
        total_changed: changed.len(),
        notes: changed.into_iter().take(max_per_run).cloned().collect(),
    }
}
