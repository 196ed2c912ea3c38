//! Logical UI targets of the database page
//!
//! Candidates cover the English and Chinese UI plus older markup variants.
//! Order matters: the first candidate with a match wins.

use std::time::Duration;

use crate::browser::{BrowserSession, Key, Locator, LocatorChain, Pick, Resolution};
use crate::error::Result;

pub const NEW_ITEM: &str = "New/新建";
pub const TITLE_FIELD: &str = "title field";
pub const BODY_FIELD: &str = "page body";

/// The collection's "new item" button. Required.
pub fn new_item_chain() -> LocatorChain {
    LocatorChain::required(
        NEW_ITEM,
        vec![
            Locator::button_named("New"),
            Locator::button_named("新建"),
            Locator::button_containing("New"),
            Locator::button_containing("新建"),
        ],
    )
}

/// The page title editor. Best effort; the first match is used.
pub fn title_chain() -> LocatorChain {
    LocatorChain::best_effort(
        TITLE_FIELD,
        vec![
            Locator::css("[aria-label='Page title']"),
            Locator::css("textarea[placeholder='Untitled']"),
            Locator::css("div[contenteditable='true'][data-placeholder='Untitled']"),
            Locator::css("div[contenteditable='true'][placeholder='Untitled']"),
            Locator::css("div[contenteditable='true'][aria-label='标题']"),
            Locator::css("textarea[placeholder='无标题']"),
        ],
    )
}

/// The page body. Best effort; the last editable block is used.
pub fn body_chain() -> LocatorChain {
    LocatorChain::best_effort(
        BODY_FIELD,
        vec![
            Locator::css("main [contenteditable='true']"),
            Locator::css("div.notion-page-content [contenteditable='true']"),
        ],
    )
    .pick(Pick::Last)
}

// ============================================================================
// Combined resolve + act
// ============================================================================

/// Click the collection's "new item" button.
pub async fn click_new_item(session: &dyn BrowserSession) -> Result<()> {
    match new_item_chain().resolve(session).await? {
        Resolution::Found { element, .. } => session.click(&element).await,
        // A required chain never falls back
        Resolution::Fallback => Ok(()),
    }
}

/// Replace the page title with `title`.
///
/// Without a title element the page is assumed to have focus on its title
/// already (which is where a freshly created page puts the caret).
pub async fn replace_title(
    session: &dyn BrowserSession,
    title: &str,
    select_all: Key,
    delay: Duration,
) -> Result<()> {
    let select_all = [select_all, Key::Char('a')];
    if let Resolution::Found { element, .. } = title_chain().resolve(session).await? {
        session.click(&element).await?;
    }
    session.press(&select_all).await?;
    session.type_text(title, delay).await
}

/// Append `text` as a new block at the end of the page body.
///
/// Without a body element, `Tab` moves focus from the title into the body.
pub async fn append_body(session: &dyn BrowserSession, text: &str, delay: Duration) -> Result<()> {
    match body_chain().resolve(session).await? {
        Resolution::Found { element, .. } => {
            session.click(&element).await?;
            session.press(&[Key::End]).await?;
            session.press(&[Key::Enter]).await?;
        }
        Resolution::Fallback => {
            session.press(&[Key::Tab]).await?;
        }
    }
    session.type_text(text, delay).await
}
