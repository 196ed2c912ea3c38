//! Page reconciliation state machine
//!
//! Each note walks an explicit state machine against one shared session:
//!
//! ```text
//! Start ──(stored page url)──▶ AttemptUpdate ──ok──▶ Done(updated)
//!   │                               │
//!   │                            failure
//!   ▼                               ▼
//! AttemptCreate ◀───────────────────┘
//!   │ ok ──▶ Done(created)
//!   │ failure ──▶ Failed (this note only)
//! ```
//!
//! A login redirect at any point aborts the whole pass instead.

use std::time::Duration;

use super::render::{render_body, render_title, render_update_block};
use super::targets::{append_body, click_new_item, replace_title};
use crate::browser::{BrowserSession, Key};
use crate::error::{Result, SyncError};
use crate::notes::Note;
use crate::state::SyncState;
use crate::sync::{NoteOutcome, ReconciliationResult, ReplicationMode};

/// First path segment of the target's login surface (`https://www.notion.so/login?...`).
pub const LOGIN_SEGMENT: &str = "login";

/// Pauses that let the target UI settle, and per-key typing delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiTimings {
    pub after_new_item: Duration,
    pub after_create: Duration,
    pub after_update: Duration,
    pub title_key_delay: Duration,
    pub body_key_delay: Duration,
}

impl Default for UiTimings {
    fn default() -> Self {
        Self {
            after_new_item: Duration::from_millis(1200),
            after_create: Duration::from_millis(500),
            after_update: Duration::from_millis(300),
            title_key_delay: Duration::from_millis(5),
            body_key_delay: Duration::from_millis(2),
        }
    }
}

impl UiTimings {
    /// No pauses at all.
    pub fn instant() -> Self {
        Self {
            after_new_item: Duration::ZERO,
            after_create: Duration::ZERO,
            after_update: Duration::ZERO,
            title_key_delay: Duration::ZERO,
            body_key_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    /// Collection (database) view where new pages are created
    pub collection_url: String,
    pub title_max_chars: usize,
    pub body_max_chars: usize,
    /// Modifier for the select-all chord that replaces the title
    pub select_all: Key,
    pub timings: UiTimings,
}

impl ReconcileSettings {
    pub fn from_config(config: &crate::Config) -> Self {
        Self {
            collection_url: config.target.database_url.clone(),
            title_max_chars: config.sync.title_max_chars,
            body_max_chars: config.sync.body_max_chars,
            select_all: config.browser.select_all_modifier,
            timings: UiTimings::default(),
        }
    }
}

/// One state of the per-note machine.
#[derive(Debug)]
pub enum ReconcileStep {
    Start,
    AttemptUpdate {
        page_url: String,
    },
    AttemptCreate {
        /// Why the update attempt was abandoned, if there was one
        update_error: Option<String>,
    },
    Done {
        result: ReconciliationResult,
        update_error: Option<String>,
    },
    Failed(SyncError),
}

/// True only when the first path segment is exactly `login`.
///
/// Page slugs such as `/acme/login-checklist-0123...` are ordinary pages.
pub fn is_login_url(url: &str) -> bool {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return false;
    };
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next())
        .is_some_and(|first| first == LOGIN_SEGMENT)
}

/// Fail with `NotAuthenticated` if the session sits on the login surface.
pub async fn ensure_logged_in(session: &dyn BrowserSession) -> Result<()> {
    let url = session.current_url().await?;
    if is_login_url(&url) {
        return Err(SyncError::NotAuthenticated { url });
    }
    Ok(())
}

async fn settle(pause: Duration) {
    if !pause.is_zero() {
        tokio::time::sleep(pause).await;
    }
}

/// Drives notes through the state machine on one session.
pub struct PageReconciler<'a> {
    session: &'a dyn BrowserSession,
    settings: &'a ReconcileSettings,
}

impl<'a> PageReconciler<'a> {
    pub fn new(session: &'a dyn BrowserSession, settings: &'a ReconcileSettings) -> Self {
        Self { session, settings }
    }

    /// Open the collection view and check the login once, before any note.
    pub async fn open_collection(&self) -> Result<()> {
        self.session.goto(&self.settings.collection_url).await?;
        ensure_logged_in(self.session).await
    }

    /// Reconcile notes in order.
    ///
    /// Returns `Err` only when the pass must abort; every other failure is
    /// recorded against its note and the next note is attempted.
    pub async fn reconcile_all(&self, notes: &[Note], state: &SyncState) -> Result<Vec<NoteOutcome>> {
        let mut outcomes = Vec::with_capacity(notes.len());
        for note in notes {
            outcomes.push(self.reconcile(note, state).await?);
        }
        Ok(outcomes)
    }

    /// Run one note to a terminal state.
    pub async fn reconcile(&self, note: &Note, state: &SyncState) -> Result<NoteOutcome> {
        let mut step = ReconcileStep::Start;
        loop {
            step = match step {
                ReconcileStep::Start => match state.page_url(&note.source_id) {
                    Some(url) => ReconcileStep::AttemptUpdate {
                        page_url: url.to_string(),
                    },
                    None => ReconcileStep::AttemptCreate { update_error: None },
                },

                ReconcileStep::AttemptUpdate { page_url } => {
                    match self.update_page(&page_url, note).await {
                        Ok(url) => ReconcileStep::Done {
                            result: ReconciliationResult {
                                source_id: note.source_id.clone(),
                                mode: ReplicationMode::Updated,
                                page_url: url,
                            },
                            update_error: None,
                        },
                        Err(e) if e.is_pass_fatal() => return Err(e),
                        Err(e) => {
                            tracing::warn!(
                                source_id = %note.source_id,
                                page_url = %page_url,
                                reason = e.kind(),
                                "Update failed, creating a new page: {}",
                                e
                            );
                            ReconcileStep::AttemptCreate {
                                update_error: Some(format!("{}: {}", e.kind(), e)),
                            }
                        }
                    }
                }

                ReconcileStep::AttemptCreate { update_error } => {
                    match self.create_page(note).await {
                        Ok(url) => ReconcileStep::Done {
                            result: ReconciliationResult {
                                source_id: note.source_id.clone(),
                                mode: ReplicationMode::Created,
                                page_url: url,
                            },
                            update_error,
                        },
                        Err(e) if e.is_pass_fatal() => return Err(e),
                        Err(e) => ReconcileStep::Failed(e),
                    }
                }

                ReconcileStep::Done {
                    result,
                    update_error,
                } => {
                    tracing::info!(
                        source_id = %result.source_id,
                        mode = %result.mode,
                        page_url = %result.page_url,
                        "Note replicated"
                    );
                    return Ok(NoteOutcome::Replicated {
                        result,
                        update_error,
                    });
                }

                ReconcileStep::Failed(error) => {
                    tracing::error!(source_id = %note.source_id, reason = error.kind(), "Note failed: {}", error);
                    return Ok(NoteOutcome::Failed {
                        source_id: note.source_id.clone(),
                        error,
                    });
                }
            };
        }
    }

    async fn update_page(&self, page_url: &str, note: &Note) -> Result<String> {
        let timings = &self.settings.timings;
        self.session.goto(page_url).await?;
        ensure_logged_in(self.session).await?;

        let title = render_title(note, self.settings.title_max_chars);
        replace_title(
            self.session,
            &title,
            self.settings.select_all,
            timings.title_key_delay,
        ).await?;

        let block = render_update_block(note, self.settings.body_max_chars);
        append_body(self.session, &block, timings.body_key_delay).await?;

        settle(timings.after_update).await;
        self.session.current_url().await
    }

    async fn create_page(&self, note: &Note) -> Result<String> {
        let timings = &self.settings.timings;
        self.session.goto(&self.settings.collection_url).await?;
        ensure_logged_in(self.session).await?;

        click_new_item(self.session).await?;
        settle(timings.after_new_item).await;

        let title = render_title(note, self.settings.title_max_chars);
        replace_title(
            self.session,
            &title,
            self.settings.select_all,
            timings.title_key_delay,
        ).await?;

        let body = render_body(note, self.settings.body_max_chars);
        append_body(self.session, &body, timings.body_key_delay).await?;

        settle(timings.after_create).await;
        let url = self.session.current_url().await?;
        if url == self.settings.collection_url {
            tracing::debug!(source_id = %note.source_id, "New page opened without its own URL");
            return Ok(String::new());
        }
        Ok(url)
    }
}
