//! Replication results and pass summaries

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SyncError;

/// How a note reached the target during a pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationMode {
    /// A new page was created
    Created,
    /// The previously recorded page was updated in place
    Updated,
}

impl fmt::Display for ReplicationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
        }
    }
}

impl FromStr for ReplicationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "created" => Ok(Self::Created),
            "updated" => Ok(Self::Updated),
            _ => Err(format!("Unknown replication mode: {}", s)),
        }
    }
}

/// Result of successfully replicating one note. Never persisted directly;
/// the runner folds it into the sync state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    pub source_id: String,
    pub mode: ReplicationMode,
    /// Empty when the page identity could not be resolved
    pub page_url: String,
}

/// Per-note outcome reported by a replicator.
#[derive(Debug)]
pub enum NoteOutcome {
    /// Content was written to the target.
    Replicated {
        result: ReconciliationResult,
        /// Why the in-place update was abandoned, when the note fell back to
        /// creating a new page
        update_error: Option<String>,
    },
    /// The target already held this exact content (structured API only).
    Unchanged { source_id: String, page_url: String },
    /// Nothing was written for this note; its state entry stays as it was.
    Failed { source_id: String, error: SyncError },
}

impl NoteOutcome {
    pub fn source_id(&self) -> &str {
        match self {
            Self::Replicated { result, .. } => &result.source_id,
            Self::Unchanged { source_id, .. } | Self::Failed { source_id, .. } => source_id,
        }
    }

    /// `(source_id, page_url)` when the target is known to hold the note's
    /// current content.
    pub fn written_page(&self) -> Option<(&str, &str)> {
        match self {
            Self::Replicated { result, .. } => Some((&result.source_id, &result.page_url)),
            Self::Unchanged {
                source_id,
                page_url,
            } => Some((source_id, page_url)),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Counts reported at the end of each pass.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct PassSummary {
    /// Notes returned by the source
    pub fetched: usize,
    /// Notes attempted this pass (change set after the cap)
    pub changed: usize,
    /// Changed notes left for a later pass because of the per-pass cap
    pub deferred: usize,
    pub created: usize,
    pub updated: usize,
    /// Unchanged notes seen by a pass that replicated something, by stored
    /// hash or by the target's own hash. Zero for a no-op pass.
    pub skipped: usize,
    pub failed: usize,
    /// Creates that happened because an in-place update failed
    pub fallbacks: usize,
}

impl PassSummary {
    /// Summary of a pass that found nothing to replicate: every count is zero.
    pub fn no_op(fetched: usize) -> Self {
        Self {
            fetched,
            ..Default::default()
        }
    }

    /// Tally outcomes of a pass.
    ///
    /// `total_changed` is the change-set size before the per-pass cap.
    pub fn from_outcomes(fetched: usize, total_changed: usize, outcomes: &[NoteOutcome]) -> Self {
        let mut summary = Self {
            fetched,
            changed: outcomes.len(),
            deferred: total_changed.saturating_sub(outcomes.len()),
            skipped: fetched.saturating_sub(total_changed),
            ..Default::default()
        };

        for outcome in outcomes {
            match outcome {
                NoteOutcome::Replicated {
                    result,
                    update_error,
                } => {
                    match result.mode {
                        ReplicationMode::Created => summary.created += 1,
                        ReplicationMode::Updated => summary.updated += 1,
                    }
                    if update_error.is_some() {
                        summary.fallbacks += 1;
                    }
                }
                NoteOutcome::Unchanged { .. } => summary.skipped += 1,
                NoteOutcome::Failed { .. } => summary.failed += 1,
            }
        }

        summary
    }

    /// No note failed.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for PassSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created={}, updated={}, skipped={}, failed={}, deferred={}, fallbacks={}, total={}",
            self.created,
            self.updated,
            self.skipped,
            self.failed,
            self.deferred,
            self.fallbacks,
            self.fetched
        )
    }
}
