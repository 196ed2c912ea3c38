//! State file persistence
//!
//! Loading is tolerant: a missing, unreadable or unparsable file yields an
//! empty version-1 state, never an error. Saving replaces the whole file
//! atomically:
//! 1. serialize to a temporary file next to the target
//! 2. flush it to disk
//! 3. rename it over the target

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use super::models::{SyncState, STATE_VERSION};

/// Reads and writes the sync state file at a fixed path.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state, defaulting to empty on any failure.
    pub async fn load(&self) -> SyncState {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No state file at {}, starting empty", self.path.display());
                return SyncState::default();
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read state file {}: {}. Starting empty.",
                    self.path.display(),
                    e
                );
                return SyncState::default();
            }
        };

        match serde_json::from_str::<SyncState>(&raw) {
            Ok(state) => {
                tracing::debug!(entries = state.len(), "Loaded state from {}", self.path.display());
                state
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse state file {}: {}. Starting empty.",
                    self.path.display(),
                    e
                );
                SyncState::default()
            }
        }
    }

    /// Persist the whole state, stamping `version` and `updated_at`.
    pub async fn save(&self, state: &mut SyncState) -> Result<()> {
        state.version = STATE_VERSION;
        state.updated_at = Some(Utc::now());
        let payload = serde_json::to_string_pretty(state).context("Failed to serialize state")?;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&parent)
            .await
            .with_context(|| format!("Failed to create state directory {}", parent.display()))?;

        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| anyhow!("State path has no file name: {}", self.path.display()))?;
        let temp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

        {
            let mut file = tokio::fs::File::create(&temp_path)
                .await
                .context("Failed to create temporary state file")?;
            file.write_all(payload.as_bytes()).await?;
            file.flush().await?;
            file.sync_all().await?;
        }

        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e).with_context(|| {
                format!("Failed to move state file into place at {}", self.path.display())
            });
        }

        tracing::debug!(entries = state.len(), "Saved state to {}", self.path.display());
        Ok(())
    }
}
