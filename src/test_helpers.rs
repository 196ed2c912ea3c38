//! Test helper factories
//!
//! Sample notes and a mock Notion-like UI wired with the real locator chains.
#![allow(dead_code)]

use crate::browser::{Key, MockUi};
use crate::notes::Note;
use crate::reconcile::{targets, ReconcileSettings, UiTimings};
use chrono::Utc;
use std::sync::Arc;

pub const COLLECTION_URL: &str = "https://mock.notion/db";

// ============================================================================
// Notes
// ============================================================================

/// A `NOTE`-typed note titled "Note {id}".
pub fn sample_note(id: &str, content: &str) -> Note {
    Note::new("NOTE", id, format!("Note {}", id), content, 1.0, Utc::now())
}

// ============================================================================
// Mock UI
// ============================================================================

/// A collection with a "New" button whose pages have a title and two body blocks.
pub fn notion_like_ui() -> MockUi {
    MockUi::new(COLLECTION_URL)
        .with_new_item(targets::new_item_chain().candidates[0].clone())
        .with_page_element(targets::title_chain().candidates[0].clone(), 1)
        .with_page_element(targets::body_chain().candidates[0].clone(), 2)
}

pub fn mock_ui() -> Arc<MockUi> {
    Arc::new(notion_like_ui())
}

pub fn ui_settings() -> ReconcileSettings {
    ReconcileSettings {
        collection_url: COLLECTION_URL.to_string(),
        title_max_chars: 200,
        body_max_chars: 12000,
        select_all: Key::Control,
        timings: UiTimings::instant(),
    }
}
