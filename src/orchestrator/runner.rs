//! One replication pass
//!
//! load state → fetch notes → compute change set → replicate → fold
//! outcomes → save state. The runner is the only writer of the state.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::recall::NoteSource;
use crate::state::StateStore;
use crate::sync::{compute_change_set, ChangeSet, PassSummary, Replicator};

/// Anything the scheduler can run repeatedly.
#[async_trait]
pub trait PassRunner: Send + Sync {
    async fn run_pass(&self) -> Result<PassSummary>;
}

/// Wires a note source, a replicator and the state store together.
pub struct SyncRunner {
    source: Arc<dyn NoteSource>,
    replicator: Arc<dyn Replicator>,
    store: StateStore,
    max_per_run: usize,
}

impl SyncRunner {
    pub fn new(
        source: Arc<dyn NoteSource>,
        replicator: Arc<dyn Replicator>,
        store: StateStore,
        max_per_run: usize,
    ) -> Self {
        Self {
            source,
            replicator,
            store,
            max_per_run: max_per_run.max(1),
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Compute the change set without touching the target or the state.
    pub async fn dry_run(&self) -> Result<(usize, ChangeSet)> {
        let state = self.store.load().await;
        let notes = self
            .source
            .fetch()
            .await
            .context("Failed to fetch notes from recall API")?;
        let change_set = compute_change_set(&notes, &state, self.max_per_run);
        Ok((notes.len(), change_set))
    }
}

#[async_trait]
impl PassRunner for SyncRunner {
    async fn run_pass(&self) -> Result<PassSummary> {
        let mut state = self.store.load().await;
        let notes = self
            .source
            .fetch()
            .await
            .context("Failed to fetch notes from recall API")?;

        let change_set = compute_change_set(&notes, &state, self.max_per_run);
        if change_set.is_empty() {
            tracing::info!(fetched = notes.len(), "No changed notes, nothing to sync");
            return Ok(PassSummary::no_op(notes.len()));
        }

        tracing::info!(
            strategy = self.replicator.name(),
            fetched = notes.len(),
            changed = change_set.len(),
            deferred = change_set.deferred(),
            "Starting sync pass"
        );

        let outcomes = self
            .replicator
            .replicate(&change_set.notes, &state)
            .await
            .with_context(|| format!("Sync pass aborted ({} strategy)", self.replicator.name()))?;

        let written = state.apply_outcomes(&change_set.notes, &outcomes, Utc::now());
        self.store
            .save(&mut state)
            .await
            .with_context(|| format!("Failed to save state to {}", self.store.path().display()))?;

        let summary = PassSummary::from_outcomes(notes.len(), change_set.total_changed, &outcomes);
        tracing::info!(entries_written = written, "Sync done. {}", summary);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::MockLauncher;
    use crate::reconcile::UiReplicator;
    use crate::recall::MockNoteSource;
    use crate::test_helpers::{mock_ui, sample_note, ui_settings};

    fn runner(
        source: Arc<MockNoteSource>,
        ui: Arc<crate::browser::MockUi>,
        dir: &tempfile::TempDir,
        max: usize,
    ) -> SyncRunner {
        let replicator = UiReplicator::new(Arc::new(MockLauncher::new(ui)), ui_settings());
        SyncRunner::new(
            source,
            Arc::new(replicator),
            StateStore::new(dir.path().join("state.json")),
            max,
        )
    }

    #[tokio::test]
    async fn test_first_pass_creates_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MockNoteSource::default());
        source.set_notes(vec![sample_note("7", "hi")]).await;
        let ui = mock_ui();
        let runner = runner(source, ui.clone(), &dir, 20);

        let summary = runner.run_pass().await.unwrap();
        assert_eq!(summary.created, 1);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.failed, 0);

        let state = runner.store().load().await;
        let entry = state.entry("NOTE:7").unwrap();
        assert_eq!(entry.content_hash, sample_note("7", "hi").content_hash);
        assert!(!entry.page_url.is_empty());
    }

    #[tokio::test]
    async fn test_second_pass_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MockNoteSource::default());
        source.set_notes(vec![sample_note("7", "hi")]).await;
        let ui = mock_ui();
        let runner = runner(source, ui.clone(), &dir, 20);

        runner.run_pass().await.unwrap();
        let saved = std::fs::read_to_string(dir.path().join("state.json")).unwrap();

        let summary = runner.run_pass().await.unwrap();
        assert_eq!(summary.created + summary.updated + summary.failed, 0);
        assert_eq!(summary.skipped, 0);
        // One session for the first pass only
        assert_eq!(ui.launch_count(), 1);
        let after = std::fs::read_to_string(dir.path().join("state.json")).unwrap();
        assert_eq!(saved, after);
    }

    #[tokio::test]
    async fn test_changed_note_updates_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MockNoteSource::default());
        source.set_notes(vec![sample_note("7", "hi")]).await;
        let ui = mock_ui();
        let runner = runner(source.clone(), ui.clone(), &dir, 20);

        runner.run_pass().await.unwrap();
        let first_url = runner.store().load().await.page_url("NOTE:7").unwrap().to_string();

        source.set_notes(vec![sample_note("7", "hi, edited")]).await;
        let summary = runner.run_pass().await.unwrap();
        assert_eq!(summary.updated, 1);
        assert_eq!(ui.pages_created(), 1);

        let state = runner.store().load().await;
        assert_eq!(state.page_url("NOTE:7"), Some(first_url.as_str()));
        assert_eq!(
            state.entry("NOTE:7").unwrap().content_hash,
            sample_note("7", "hi, edited").content_hash
        );
    }

    #[tokio::test]
    async fn test_cap_defers_remaining_notes() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MockNoteSource::default());
        source
            .set_notes((0..5).map(|i| sample_note(&i.to_string(), "x")).collect())
            .await;
        let runner = runner(source, mock_ui(), &dir, 2);

        let summary = runner.run_pass().await.unwrap();
        assert_eq!(summary.created, 2);
        assert_eq!(summary.deferred, 3);
        let state = runner.store().load().await;
        assert!(state.entry("NOTE:0").is_some());
        assert!(state.entry("NOTE:1").is_some());
        assert!(state.entry("NOTE:2").is_none());
    }

    #[tokio::test]
    async fn test_failed_note_keeps_previous_entry() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MockNoteSource::default());
        source
            .set_notes(vec![sample_note("a", "1"), sample_note("b", "2")])
            .await;
        let ui = mock_ui();
        ui.fail_next_creates(1);
        let runner = runner(source, ui, &dir, 20);

        let summary = runner.run_pass().await.unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.created, 1);
        assert!(!summary.is_clean());

        let state = runner.store().load().await;
        assert!(state.entry("NOTE:a").is_none());
        assert!(state.entry("NOTE:b").is_some());
    }

    #[tokio::test]
    async fn test_auth_abort_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MockNoteSource::default());
        source.set_notes(vec![sample_note("a", "1")]).await;
        let ui = mock_ui();
        ui.set_logged_out(true);
        let runner = runner(source, ui, &dir, 20);

        let err = runner.run_pass().await.unwrap_err();
        assert!(format!("{:#}", err).contains("recall-sync login"));
        assert!(!dir.path().join("state.json").exists());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MockNoteSource::default());
        source.set_failure(Some("upstream down")).await;
        let ui = mock_ui();
        let runner = runner(source, ui.clone(), &dir, 20);

        assert!(runner.run_pass().await.is_err());
        assert_eq!(ui.launch_count(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MockNoteSource::default());
        source
            .set_notes(vec![sample_note("a", "1"), sample_note("b", "2")])
            .await;
        let ui = mock_ui();
        let runner = runner(source, ui.clone(), &dir, 1);

        let (fetched, change_set) = runner.dry_run().await.unwrap();
        assert_eq!(fetched, 2);
        assert_eq!(change_set.len(), 1);
        assert_eq!(change_set.deferred(), 1);
        assert_eq!(ui.launch_count(), 0);
        assert!(!dir.path().join("state.json").exists());
    }
}
