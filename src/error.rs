//! Error taxonomy for replication passes
//!
//! Errors are classified by how far they propagate:
//! - configuration errors abort the process before any side effect
//! - authentication errors abort the whole pass
//! - everything else is local to one note (and, during an update attempt,
//!   triggers the fallback to creating a fresh page)

use std::time::Duration;

/// Errors raised while fetching, diffing, or replicating notes.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(
        "Target session is not logged in (redirected to {url}). \
         Run `recall-sync login` with a visible browser and log in once."
    )]
    NotAuthenticated { url: String },

    #[error("No locator candidate matched for {target}")]
    LocatorNotFound { target: String },

    #[error("Timed out after {timeout:?} while {action}")]
    Timeout { action: String, timeout: Duration },

    #[error("WebDriver command `{command}` failed: {error}: {message}")]
    WebDriver {
        command: String,
        error: String,
        message: String,
    },

    #[error("Recall API returned {status}: {body}")]
    RecallApi { status: u16, body: String },

    #[error("Target API returned {status}: {body}")]
    TargetApi { status: u16, body: String },

    #[error("Target schema error: {0}")]
    Schema(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Whether this error invalidates the whole pass rather than a single note.
    ///
    /// Only a lost/missing login qualifies: no later note can succeed either.
    pub fn is_pass_fatal(&self) -> bool {
        matches!(self, Self::NotAuthenticated { .. })
    }

    /// Short machine-friendly label, used in logs and update-fallback reasons.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::NotAuthenticated { .. } => "not_authenticated",
            Self::LocatorNotFound { .. } => "locator_not_found",
            Self::Timeout { .. } => "timeout",
            Self::WebDriver { .. } => "webdriver",
            Self::RecallApi { .. } => "recall_api",
            Self::TargetApi { .. } => "target_api",
            Self::Schema(_) => "schema",
            Self::Http(_) => "http",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_auth_is_pass_fatal() {
        let auth = SyncError::NotAuthenticated {
            url: "https://www.notion.so/login".into(),
        };
        assert!(auth.is_pass_fatal());

        let locator = SyncError::LocatorNotFound {
            target: "new item action".into(),
        };
        assert!(!locator.is_pass_fatal());

        let timeout = SyncError::Timeout {
            action: "navigating".into(),
            timeout: Duration::from_secs(60),
        };
        assert!(!timeout.is_pass_fatal());
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(SyncError::Config("x".into()).kind(), "config");
        assert_eq!(
            SyncError::LocatorNotFound { target: "t".into() }.kind(),
            "locator_not_found"
        );
    }

    #[test]
    fn test_display_mentions_login_command() {
        let err = SyncError::NotAuthenticated {
            url: "https://www.notion.so/login?redirect=x".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("recall-sync login"));
        assert!(msg.contains("/login"));
    }
}
