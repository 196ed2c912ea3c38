//! Persisted replication state
//!
//! The state file records, per `source_id`, the content hash that was last
//! written to the target and the page it was written to. It is loaded once
//! per pass, mutated in memory, and written back once at the end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::notes::Note;
use crate::sync::NoteOutcome;

/// The only state file format version written by this crate.
pub const STATE_VERSION: u32 = 1;

fn default_version() -> u32 {
    STATE_VERSION
}

/// Last known replication outcome of one note.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncStateEntry {
    pub source_id: String,
    pub title: String,
    /// Hash of the content that was actually written to the target
    pub content_hash: String,
    /// Empty if the page identity could not be resolved
    pub page_url: String,
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// The whole state file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: BTreeMap<String, SyncStateEntry>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: None,
            notes: BTreeMap::new(),
        }
    }
}

impl SyncState {
    pub fn entry(&self, source_id: &str) -> Option<&SyncStateEntry> {
        self.notes.get(source_id)
    }

    /// Stored page URL for a note, if it has a non-empty one.
    pub fn page_url(&self, source_id: &str) -> Option<&str> {
        self.entry(source_id)
            .map(|e| e.page_url.as_str())
            .filter(|url| !url.is_empty())
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Fold one pass's outcomes into the state, in outcome order.
    ///
    /// Only successful outcomes write an entry; failed notes keep whatever
    /// entry they had before the pass so the hash mismatch retries them next
    /// time. When a success carries no page URL, the previous one is kept.
    ///
    /// Returns the number of entries written.
    pub fn apply_outcomes(
        &mut self,
        notes: &[Note],
        outcomes: &[NoteOutcome],
        now: DateTime<Utc>,
    ) -> usize {
        let mut written = 0;

        for outcome in outcomes {
            let Some((source_id, page_url)) = outcome.written_page() else {
                continue;
            };
            let Some(note) = notes.iter().find(|n| n.source_id == source_id) else {
                tracing::warn!(source_id, "Outcome for a note outside the change set, ignoring");
                continue;
            };

            let page_url = if page_url.is_empty() {
                self.entry(source_id)
                    .map(|e| e.page_url.clone())
                    .unwrap_or_default()
            } else {
                page_url.to_string()
            };

            self.notes.insert(
                note.source_id.clone(),
                SyncStateEntry {
                    source_id: note.source_id.clone(),
                    title: note.title.clone(),
                    content_hash: note.content_hash.clone(),
                    page_url,
                    last_synced_at: Some(now),
                },
            );
            written += 1;
        }

        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::sync::{ReconciliationResult, ReplicationMode};

    fn note(id: &str, content: &str) -> Note {
        Note::new("NOTE", id, format!("title {}", id), content, 1.0, Utc::now())
    }

    fn replicated(source_id: &str, mode: ReplicationMode, page_url: &str) -> NoteOutcome {
        NoteOutcome::Replicated {
            result: ReconciliationResult {
                source_id: source_id.to_string(),
                mode,
                page_url: page_url.to_string(),
            },
            update_error: None,
        }
    }

    #[test]
    fn test_default_state() {
        let state = SyncState::default();
        assert_eq!(state.version, 1);
        assert!(state.is_empty());
        assert!(state.updated_at.is_none());
    }

    #[test]
    fn test_deserialize_file_format() {
        let raw = r#"{
            "version": 1,
            "updatedAt": "2026-01-02T03:04:05Z",
            "notes": {
                "NOTE:7": {
                    "sourceId": "NOTE:7",
                    "title": "X",
                    "contentHash": "abc",
                    "pageUrl": "https://www.notion.so/X-123",
                    "lastSyncedAt": "2026-01-02T03:04:05Z"
                }
            }
        }"#;
        let state: SyncState = serde_json::from_str(raw).unwrap();
        assert_eq!(state.len(), 1);
        assert_eq!(state.page_url("NOTE:7"), Some("https://www.notion.so/X-123"));
        assert_eq!(state.entry("NOTE:7").unwrap().content_hash, "abc");
    }

    #[test]
    fn test_deserialize_missing_sections() {
        let state: SyncState = serde_json::from_str("{}").unwrap();
        assert_eq!(state.version, 1);
        assert!(state.is_empty());

        let state: SyncState =
            serde_json::from_str(r#"{"notes": {"A:1": {"contentHash": "h"}}}"#).unwrap();
        assert_eq!(state.entry("A:1").unwrap().page_url, "");
        assert_eq!(state.page_url("A:1"), None);
    }

    #[test]
    fn test_apply_outcomes_writes_successes_only() {
        let notes = vec![note("a", "1"), note("b", "2")];
        let mut state = SyncState::default();
        state.notes.insert(
            "NOTE:b".into(),
            SyncStateEntry {
                source_id: "NOTE:b".into(),
                title: "old".into(),
                content_hash: "old-hash".into(),
                page_url: "https://old".into(),
                last_synced_at: None,
            },
        );
        let before_b = state.entry("NOTE:b").cloned();

        let outcomes = vec![
            replicated("NOTE:a", ReplicationMode::Created, "https://new-a"),
            NoteOutcome::Failed {
                source_id: "NOTE:b".into(),
                error: SyncError::LocatorNotFound {
                    target: "new item action".into(),
                },
            },
        ];

        let now = Utc::now();
        let written = state.apply_outcomes(&notes, &outcomes, now);
        assert_eq!(written, 1);

        let a = state.entry("NOTE:a").unwrap();
        assert_eq!(a.content_hash, notes[0].content_hash);
        assert_eq!(a.page_url, "https://new-a");
        assert_eq!(a.last_synced_at, Some(now));
        assert_eq!(state.entry("NOTE:b").cloned(), before_b);
    }

    #[test]
    fn test_apply_outcomes_keeps_previous_url_when_unresolved() {
        let notes = vec![note("a", "new content")];
        let mut state = SyncState::default();
        state.notes.insert(
            "NOTE:a".into(),
            SyncStateEntry {
                source_id: "NOTE:a".into(),
                page_url: "https://kept".into(),
                ..Default::default()
            },
        );

        let outcomes = vec![replicated("NOTE:a", ReplicationMode::Updated, "")];
        state.apply_outcomes(&notes, &outcomes, Utc::now());

        let a = state.entry("NOTE:a").unwrap();
        assert_eq!(a.page_url, "https://kept");
        assert_eq!(a.content_hash, notes[0].content_hash);
    }

    #[test]
    fn test_apply_outcomes_records_unchanged() {
        let notes = vec![note("a", "x")];
        let mut state = SyncState::default();
        let outcomes = vec![NoteOutcome::Unchanged {
            source_id: "NOTE:a".into(),
            page_url: "https://remote".into(),
        }];
        assert_eq!(state.apply_outcomes(&notes, &outcomes, Utc::now()), 1);
        assert_eq!(state.page_url("NOTE:a"), Some("https://remote"));
    }

    #[test]
    fn test_apply_outcomes_ignores_unknown_notes() {
        let mut state = SyncState::default();
        let outcomes = vec![replicated("NOTE:ghost", ReplicationMode::Created, "https://x")];
        assert_eq!(state.apply_outcomes(&[], &outcomes, Utc::now()), 0);
        assert!(state.is_empty());
    }
}
