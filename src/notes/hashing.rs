//! Content fingerprinting for change detection
//!
//! The content hash is the only signal used to decide whether a note needs
//! to be replicated again. It covers title, content and source type, joined
//! by newlines, so fields outside that set (score, timestamps) never trigger
//! a rewrite.
//!
//! The join is unescaped: moving a newline across a field boundary
//! (`"a\nb" + "c"` vs `"a" + "b\nc"`) yields the same hash. That edit goes
//! undetected until some other change to the note. Stored state files hold
//! hashes in this exact form; a new format would rewrite every page once.

use sha2::{Digest, Sha256};

/// Hash a note's replicated fields (title + content + source type).
pub fn content_hash(title: &str, content: &str, source_type: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"\n");
    hasher.update(content.as_bytes());
    hasher.update(b"\n");
    hasher.update(source_type.as_bytes());
    hex::encode(hasher.finalize())
}
