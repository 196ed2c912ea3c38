//! Scripted in-memory browser for tests
//!
//! `MockUi` models a tiny slice of the target UI: one collection view, the
//! pages reachable from it, and which locators match on each kind of view.
//! Clicking the configured "new item" element opens a fresh page. Every
//! interaction is recorded so tests can assert on what was typed where.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::locator::Locator;
use super::traits::{BrowserSession, ElementRef, Key, SessionLauncher};
use crate::error::{Result, SyncError};

pub const MOCK_LOGIN_URL: &str = "https://www.notion.so/login";

/// One recorded browser interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Goto(String),
    Click(String),
    Press(Vec<Key>),
    Type(String),
}

#[derive(Debug, Default)]
struct UiState {
    current_url: String,
    collection_elements: Vec<(Locator, usize)>,
    page_elements: Vec<(Locator, usize)>,
    new_item: Option<Locator>,
    pages: HashSet<String>,
    broken: HashSet<String>,
    logged_out: bool,
    failing_creates: usize,
    create_keeps_url: bool,
    created: usize,
    interactions: Vec<Interaction>,
}

/// Shared model of the target UI, observed by every session it launches.
#[derive(Debug)]
pub struct MockUi {
    collection_url: String,
    state: Mutex<UiState>,
    launches: AtomicUsize,
    closes: AtomicUsize,
}

impl MockUi {
    pub fn new(collection_url: impl Into<String>) -> Self {
        Self {
            collection_url: collection_url.into(),
            state: Mutex::new(UiState::default()),
            launches: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, UiState> {
        // A panicking test thread must not poison the rest of the test
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn collection_url(&self) -> &str {
        &self.collection_url
    }

    // ========================================================================
    // Builders
    // ========================================================================

    /// `count` elements matching `locator` on the collection view.
    pub fn with_collection_element(self, locator: Locator, count: usize) -> Self {
        self.lock().collection_elements.push((locator, count));
        self
    }

    /// `count` elements matching `locator` on every page view.
    pub fn with_page_element(self, locator: Locator, count: usize) -> Self {
        self.lock().page_elements.push((locator, count));
        self
    }

    /// Clicking the element matching `locator` on the collection creates a page.
    pub fn with_new_item(self, locator: Locator) -> Self {
        {
            let mut state = self.lock();
            state.collection_elements.push((locator.clone(), 1));
            state.new_item = Some(locator);
        }
        self
    }

    /// An already existing page.
    pub fn with_page(self, url: impl Into<String>) -> Self {
        self.lock().pages.insert(url.into());
        self
    }

    // ========================================================================
    // Runtime controls
    // ========================================================================

    /// Navigation to `url` fails.
    pub fn break_page(&self, url: &str) {
        self.lock().broken.insert(url.to_string());
    }

    /// Every navigation lands on the login page.
    pub fn set_logged_out(&self, logged_out: bool) {
        self.lock().logged_out = logged_out;
    }

    /// The next `n` clicks on the new-item action fail.
    pub fn fail_next_creates(&self, n: usize) {
        self.lock().failing_creates = n;
    }

    /// New pages open without changing the URL.
    pub fn set_create_keeps_url(&self, keep: bool) {
        self.lock().create_keeps_url = keep;
    }

    // ========================================================================
    // Observations
    // ========================================================================

    pub fn interactions(&self) -> Vec<Interaction> {
        self.lock().interactions.clone()
    }

    /// Text typed, in order.
    pub fn typed(&self) -> Vec<String> {
        self.lock()
            .interactions
            .iter()
            .filter_map(|i| match i {
                Interaction::Type(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    /// URLs visited, in order.
    pub fn visited(&self) -> Vec<String> {
        self.lock()
            .interactions
            .iter()
            .filter_map(|i| match i {
                Interaction::Goto(u) => Some(u.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn pages_created(&self) -> usize {
        self.lock().created
    }

    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn clear_interactions(&self) {
        self.lock().interactions.clear();
    }
}

fn element_id(locator: &Locator, index: usize) -> String {
    format!("{}#{}", locator, index)
}

/// A session over a shared [`MockUi`].
pub struct MockBrowser {
    ui: Arc<MockUi>,
}

impl MockBrowser {
    pub fn new(ui: Arc<MockUi>) -> Self {
        Self { ui }
    }
}

#[async_trait]
impl BrowserSession for MockBrowser {
    async fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.ui.lock();
        state.interactions.push(Interaction::Goto(url.to_string()));

        if state.broken.contains(url) {
            return Err(SyncError::WebDriver {
                command: "goto".to_string(),
                error: "unknown error".to_string(),
                message: "net::ERR_CONNECTION_RESET".to_string(),
            });
        }
        state.current_url = if state.logged_out {
            MOCK_LOGIN_URL.to_string()
        } else {
            url.to_string()
        };
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.ui.lock().current_url.clone())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>> {
        let state = self.ui.lock();
        let view = if state.current_url == self.ui.collection_url {
            &state.collection_elements
        } else if state.pages.contains(&state.current_url) {
            &state.page_elements
        } else {
            return Ok(Vec::new());
        };

        let count: usize = view
            .iter()
            .filter(|(l, _)| l == locator)
            .map(|(_, n)| *n)
            .sum();
        Ok((0..count)
            .map(|i| ElementRef(element_id(locator, i)))
            .collect())
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        let mut state = self.ui.lock();
        state
            .interactions
            .push(Interaction::Click(element.id().to_string()));

        let is_new_item = state
            .new_item
            .as_ref()
            .is_some_and(|l| element.id().starts_with(&format!("{}#", l)));
        if !is_new_item || state.current_url != self.ui.collection_url {
            return Ok(());
        }

        if state.failing_creates > 0 {
            state.failing_creates -= 1;
            return Err(SyncError::WebDriver {
                command: "click".to_string(),
                error: "element click intercepted".to_string(),
                message: "another element would receive the click".to_string(),
            });
        }

        state.created += 1;
        if !state.create_keeps_url {
            let url = format!(
                "{}/p/{}",
                self.ui.collection_url.trim_end_matches('/'),
                state.created
            );
            state.pages.insert(url.clone());
            state.current_url = url;
        }
        Ok(())
    }

    async fn press(&self, chord: &[Key]) -> Result<()> {
        self.ui
            .lock()
            .interactions
            .push(Interaction::Press(chord.to_vec()));
        Ok(())
    }

    async fn type_text(&self, text: &str, _delay: Duration) -> Result<()> {
        self.ui
            .lock()
            .interactions
            .push(Interaction::Type(text.to_string()));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.ui.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Launches [`MockBrowser`] sessions over one shared UI.
pub struct MockLauncher {
    ui: Arc<MockUi>,
    fail_launch: bool,
}

impl MockLauncher {
    pub fn new(ui: Arc<MockUi>) -> Self {
        Self {
            ui,
            fail_launch: false,
        }
    }

    /// A launcher whose sessions never start (driver not running).
    pub fn unavailable(ui: Arc<MockUi>) -> Self {
        Self {
            ui,
            fail_launch: true,
        }
    }
}

#[async_trait]
impl SessionLauncher for MockLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        self.ui.launches.fetch_add(1, Ordering::SeqCst);
        if self.fail_launch {
            return Err(SyncError::WebDriver {
                command: "new session".to_string(),
                error: "session not created".to_string(),
                message: "driver unavailable".to_string(),
            });
        }
        Ok(Box::new(MockBrowser::new(self.ui.clone())))
    }
}
