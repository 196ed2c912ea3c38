//! Structured-API replicator
//!
//! Same create-or-update contract as the browser path, keyed by the page's
//! `SourceId` property instead of a stored URL. When the remote page already
//! carries the note's `ContentHash` nothing is written.

use async_trait::async_trait;

use super::client::{page_url, NotionClient};
use super::properties::{page_properties, stored_hash, DatabaseSchema, CONTENT_HASH};
use crate::error::{Result, SyncError};
use crate::notes::Note;
use crate::state::SyncState;
use crate::sync::{NoteOutcome, ReconciliationResult, ReplicationMode, Replicator};
use crate::TargetConfig;

pub struct NotionApiReplicator {
    client: NotionClient,
    database_id: String,
}

impl NotionApiReplicator {
    pub fn new(client: NotionClient, database_id: impl Into<String>) -> Self {
        Self {
            client,
            database_id: database_id.into(),
        }
    }

    pub fn from_config(config: &TargetConfig) -> Result<Self> {
        let token = config
            .token
            .as_deref()
            .ok_or_else(|| SyncError::Config("Missing required environment variable: NOTION_TOKEN".into()))?;
        let database_id = config.database_id.clone().ok_or_else(|| {
            SyncError::Config("Missing required environment variable: NOTION_DATABASE_ID".into())
        })?;
        Ok(Self::new(NotionClient::new(&config.api_base, token)?, database_id))
    }

    async fn sync_note(&self, note: &Note, schema: &DatabaseSchema) -> Result<NoteOutcome> {
        let properties = page_properties(note, schema);
        let existing = self
            .client
            .find_by_source_id(&self.database_id, &note.source_id)
            .await?;

        let Some(existing) = existing else {
            let page = self.client.create_page(&self.database_id, properties).await?;
            return Ok(replicated(note, ReplicationMode::Created, &page));
        };

        if schema.has(CONTENT_HASH, "rich_text") {
            let remote = stored_hash(&existing);
            if !remote.is_empty() && remote == note.content_hash {
                return Ok(NoteOutcome::Unchanged {
                    source_id: note.source_id.clone(),
                    page_url: page_url(&existing),
                });
            }
        }

        let page_id = existing
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SyncError::Schema("Query result has no page id".into()))?;
        let page = self.client.update_page(page_id, properties).await?;
        Ok(replicated(note, ReplicationMode::Updated, &page))
    }
}

fn replicated(note: &Note, mode: ReplicationMode, page: &serde_json::Value) -> NoteOutcome {
    NoteOutcome::Replicated {
        result: ReconciliationResult {
            source_id: note.source_id.clone(),
            mode,
            page_url: page_url(page),
        },
        update_error: None,
    }
}

#[async_trait]
impl Replicator for NotionApiReplicator {
    async fn replicate(&self, notes: &[Note], _state: &SyncState) -> Result<Vec<NoteOutcome>> {
        let database = self.client.retrieve_database(&self.database_id).await?;
        let schema = DatabaseSchema::from_database(&database);
        schema.validate()?;

        let mut outcomes = Vec::with_capacity(notes.len());
        for note in notes {
            let outcome = match self.sync_note(note, &schema).await {
                Ok(outcome) => outcome,
                Err(error) => {
                    tracing::error!(source_id = %note.source_id, reason = error.kind(), "Failed syncing note: {}", error);
                    NoteOutcome::Failed {
                        source_id: note.source_id.clone(),
                        error,
                    }
                }
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    fn name(&self) -> &'static str {
        "api"
    }
}
