//! Text typed into the target page

use chrono::SecondsFormat;

use crate::notes::Note;

/// Marker line separating an in-place update from earlier content.
pub const AUTO_UPDATE_MARKER: &str = "[Auto update]";

/// First `max_chars` characters of `s`.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

pub fn render_title(note: &Note, max_chars: usize) -> String {
    truncate_chars(&note.title, max_chars).to_string()
}

/// Metadata header, a blank line, then the note content.
pub fn render_body(note: &Note, max_chars: usize) -> String {
    let body = [
        format!("SourceId: {}", note.source_id),
        format!("SourceType: {}", note.source_type),
        format!("Score: {}", note.score),
        format!(
            "SyncedAt: {}",
            note.synced_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        ),
        String::new(),
        note.content.clone(),
    ]
    .join("\n");
    truncate_chars(&body, max_chars).to_string()
}

/// Block appended to an existing page on update.
pub fn render_update_block(note: &Note, max_chars: usize) -> String {
    format!("\n{}\n{}", AUTO_UPDATE_MARKER, render_body(note, max_chars))
}
