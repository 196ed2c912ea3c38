//! Note models
//!
//! A `Note` is the canonical replication unit derived from one recalled
//! knowledge item. Both replication paths (browser UI and structured API)
//! consume the same shape, so they are interchangeable at this boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::hashing::content_hash;

/// Fallback source type for items without one.
pub const UNKNOWN_SOURCE_TYPE: &str = "UNKNOWN";
/// Fallback title for items without one.
pub const UNTITLED: &str = "(Untitled)";

// ============================================================================
// Core Enums
// ============================================================================

/// Which raw values count as "missing" when normalizing a recall item.
///
/// The two replication paths historically disagreed here: the API path only
/// substituted defaults for absent/null fields, while the UI path also
/// replaced empty strings, zeros and `false`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FieldFallback {
    /// Absent, null, empty string, `0` and `false` all fall back to defaults
    #[default]
    Falsy,
    /// Only absent or null fields fall back to defaults
    NullOnly,
}

impl fmt::Display for FieldFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Falsy => write!(f, "falsy"),
            Self::NullOnly => write!(f, "null_only"),
        }
    }
}

impl FromStr for FieldFallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "falsy" => Ok(Self::Falsy),
            "null_only" | "null-only" | "nullonly" => Ok(Self::NullOnly),
            _ => Err(format!("Unknown field fallback policy: {}", s)),
        }
    }
}

// ============================================================================
// Note
// ============================================================================

/// Canonical unit of replication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Stable identity, `"{source_type}:{raw_id}"`
    pub source_id: String,
    pub source_type: String,
    pub title: String,
    pub content: String,
    /// Recall rank; only used to break ties between duplicates
    pub score: f64,
    /// SHA-256 over title, content and type; the sole change oracle
    pub content_hash: String,
    /// When this note was normalized
    pub synced_at: DateTime<Utc>,
}

impl Note {
    /// Build a note, deriving `source_id` and `content_hash` from the parts.
    pub fn new(
        source_type: impl Into<String>,
        raw_id: &str,
        title: impl Into<String>,
        content: impl Into<String>,
        score: f64,
        synced_at: DateTime<Utc>,
    ) -> Self {
        let source_type = source_type.into();
        let title = title.into();
        let content = content.into();
        let content_hash = content_hash(&title, &content, &source_type);
        Self {
            source_id: source_id(&source_type, raw_id),
            source_type,
            title,
            content,
            score,
            content_hash,
            synced_at,
        }
    }
}

/// Compose the stable source identity.
pub fn source_id(source_type: &str, raw_id: &str) -> String {
    format!("{}:{}", source_type, raw_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_fallback_roundtrip() {
        for policy in [FieldFallback::Falsy, FieldFallback::NullOnly] {
            let parsed: FieldFallback = policy.to_string().parse().unwrap();
            assert_eq!(parsed, policy);
        }
        assert_eq!(
            "NULL-ONLY".parse::<FieldFallback>().unwrap(),
            FieldFallback::NullOnly
        );
        assert!("sometimes".parse::<FieldFallback>().is_err());
    }

    #[test]
    fn test_note_new_derives_identity_and_hash() {
        let now = Utc::now();
        let note = Note::new("NOTE", "7", "X", "hi", 1.0, now);
        assert_eq!(note.source_id, "NOTE:7");
        assert_eq!(note.content_hash, content_hash("X", "hi", "NOTE"));
        assert_eq!(note.synced_at, now);
    }

    #[test]
    fn test_note_serializes_camel_case() {
        let note = Note::new("NOTE", "1", "t", "c", 0.5, Utc::now());
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["sourceId"], "NOTE:1");
        assert!(json["contentHash"].is_string());
        assert!(json.get("source_id").is_none());
    }
}
