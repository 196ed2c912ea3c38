//! BrowserSession / SessionLauncher trait definitions
//!
//! The reconciliation engine only needs a handful of primitives from a live
//! browser: navigate, read the URL, find elements, click, press keys and
//! type. Everything is async and bounded by timeouts in the implementation.

use async_trait::async_trait;
use std::str::FromStr;
use std::time::Duration;

use super::locator::Locator;
use crate::error::Result;

/// Opaque handle to an element found in the current page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

impl ElementRef {
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Keys the engine presses, mapped to W3C WebDriver key codepoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Control,
    Meta,
    Enter,
    End,
    Tab,
    Char(char),
}

impl Key {
    /// The WebDriver `value` for this key.
    pub fn code(&self) -> char {
        match self {
            Self::Control => '\u{E009}',
            Self::Meta => '\u{E03D}',
            Self::Enter => '\u{E007}',
            Self::End => '\u{E010}',
            Self::Tab => '\u{E004}',
            Self::Char(c) => *c,
        }
    }

    /// The modifier used for "select all" when the browser runs on this host.
    ///
    /// A remote WebDriver on another OS needs an explicit override.
    pub fn select_all_modifier() -> Self {
        if cfg!(target_os = "macos") {
            Self::Meta
        } else {
            Self::Control
        }
    }
}

/// Parses modifier names only: `control`/`ctrl` and `meta`/`cmd`/`command`.
impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "control" | "ctrl" => Ok(Self::Control),
            "meta" | "cmd" | "command" => Ok(Self::Meta),
            _ => Err(format!(
                "Unknown select-all modifier: {} (expected control or meta)",
                s
            )),
        }
    }
}

/// One live browser session with a single active page.
///
/// Implementations must be `Send + Sync`; callers still drive a session
/// strictly sequentially because the page has one focus context.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate and wait for the document to be interactive.
    async fn goto(&self, url: &str) -> Result<()>;

    /// URL of the active page (after redirects).
    async fn current_url(&self) -> Result<String>;

    /// All elements currently matching `locator`, in document order.
    /// No match is `Ok(vec![])`.
    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>>;

    /// Click an element (which also focuses it).
    async fn click(&self, element: &ElementRef) -> Result<()>;

    /// Press a key chord: keys go down in order and come up in reverse.
    async fn press(&self, chord: &[Key]) -> Result<()>;

    /// Type text into whatever has focus, pausing `delay` between keys.
    async fn type_text(&self, text: &str, delay: Duration) -> Result<()>;

    /// End the session. Further calls are invalid.
    async fn close(&self) -> Result<()>;
}

/// Opens browser sessions against the persistent profile.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>>;
}
