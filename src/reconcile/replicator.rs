//! Browser-driven replicator
//!
//! Opens one session per pass, reconciles every note on it in order, and
//! always closes the session, including when the pass aborts.

use async_trait::async_trait;
use std::sync::Arc;

use super::engine::{PageReconciler, ReconcileSettings};
use crate::browser::SessionLauncher;
use crate::error::Result;
use crate::notes::Note;
use crate::state::SyncState;
use crate::sync::{NoteOutcome, Replicator};

pub struct UiReplicator {
    launcher: Arc<dyn SessionLauncher>,
    settings: ReconcileSettings,
}

impl UiReplicator {
    pub fn new(launcher: Arc<dyn SessionLauncher>, settings: ReconcileSettings) -> Self {
        Self { launcher, settings }
    }

    pub fn settings(&self) -> &ReconcileSettings {
        &self.settings
    }
}

#[async_trait]
impl Replicator for UiReplicator {
    async fn replicate(&self, notes: &[Note], state: &SyncState) -> Result<Vec<NoteOutcome>> {
        let session = self.launcher.launch().await?;

        let result = async {
            let reconciler = PageReconciler::new(session.as_ref(), &self.settings);
            reconciler.open_collection().await?;
            reconciler.reconcile_all(notes, state).await
        }
        .await;

        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close browser session: {}", e);
        }
        result
    }

    fn name(&self) -> &'static str {
        "ui"
    }
}
