//! Element locators and priority-ordered resolution chains
//!
//! The target UI changes its markup with display language, release version
//! and account settings, so one logical target (the title field, the page
//! body, the "new item" button) is described by an ordered list of
//! candidate locators. Resolution walks the list and the first candidate
//! with at least one match wins.
//!
//! When nothing matches, a `Required` target fails with
//! `SyncError::LocatorNotFound`; a `BestEffort` target resolves to
//! [`Resolution::Fallback`] and the caller drives the keyboard instead.

use std::fmt;

use super::traits::{BrowserSession, ElementRef};
use crate::error::{Result, SyncError};

/// How to find elements in the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// W3C WebDriver location strategy name.
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Css(_) => "css selector",
            Self::XPath(_) => "xpath",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) => s,
        }
    }

    /// A button (or `role=button`) whose text or aria-label equals `name`,
    /// ignoring ASCII case and surrounding whitespace.
    pub fn button_named(name: &str) -> Self {
        let upper = name.to_uppercase();
        let lower = name.to_lowercase();
        let folded = |expr: &str| {
            format!(
                "translate(normalize-space({}), {}, {})",
                expr,
                xpath_literal(&upper),
                xpath_literal(&lower)
            )
        };
        Self::XPath(format!(
            "//*[self::button or @role='button'][{} = {} or {} = {}]",
            folded("string(.)"),
            xpath_literal(&lower),
            folded("@aria-label"),
            xpath_literal(&lower),
        ))
    }

    /// A `<button>` whose text contains `text`, ignoring ASCII case.
    pub fn button_containing(text: &str) -> Self {
        let upper = text.to_uppercase();
        let lower = text.to_lowercase();
        Self::XPath(format!(
            "//button[contains(translate(normalize-space(string(.)), {}, {}), {})]",
            xpath_literal(&upper),
            xpath_literal(&lower),
            xpath_literal(&lower),
        ))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={}", s),
            Self::XPath(s) => write!(f, "xpath={}", s),
        }
    }
}

/// Quote a string for use inside an XPath expression.
fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{}'", s)
    } else if !s.contains('"') {
        format!("\"{}\"", s)
    } else {
        let parts: Vec<String> = s.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// Whether an unresolved target is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Required,
    BestEffort,
}

/// Which of several matching elements to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    First,
    Last,
}

/// Outcome of resolving a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found {
        /// Index of the winning candidate in the chain
        candidate: usize,
        element: ElementRef,
    },
    /// Best-effort target with no match
    Fallback,
}

/// Ordered candidates for one logical UI target.
#[derive(Debug, Clone)]
pub struct LocatorChain {
    pub target: &'static str,
    pub candidates: Vec<Locator>,
    pub requirement: Requirement,
    pub pick: Pick,
}

impl LocatorChain {
    pub fn required(target: &'static str, candidates: Vec<Locator>) -> Self {
        Self {
            target,
            candidates,
            requirement: Requirement::Required,
            pick: Pick::First,
        }
    }

    pub fn best_effort(target: &'static str, candidates: Vec<Locator>) -> Self {
        Self {
            target,
            candidates,
            requirement: Requirement::BestEffort,
            pick: Pick::First,
        }
    }

    pub fn pick(mut self, pick: Pick) -> Self {
        self.pick = pick;
        self
    }

    /// Walk the candidates in order against the live page.
    pub async fn resolve(&self, session: &dyn BrowserSession) -> Result<Resolution> {
        for (index, locator) in self.candidates.iter().enumerate() {
            let elements = session.find_all(locator).await?;
            let chosen = match self.pick {
                Pick::First => elements.into_iter().next(),
                Pick::Last => elements.into_iter().last(),
            };
            if let Some(element) = chosen {
                tracing::debug!(target_name = self.target, candidate = index, locator = %locator, "Resolved UI target");
                return Ok(Resolution::Found {
                    candidate: index,
                    element,
                });
            }
        }

        match self.requirement {
            Requirement::Required => Err(SyncError::LocatorNotFound {
                target: self.target.to_string(),
            }),
            Requirement::BestEffort => {
                tracing::debug!(target_name = self.target, "No candidate matched, using keyboard fallback");
                Ok(Resolution::Fallback)
            }
        }
    }
}
