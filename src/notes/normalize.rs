//! Recall response normalization
//!
//! Turns a raw recall API payload into canonical [`Note`]s:
//! 1. locate the item array in one of the known envelopes
//!    (`c.data`, top-level `data`, `result.data`)
//! 2. read each item's fields, accepting the aliases different API
//!    versions use, and substitute defaults for missing values
//! 3. build `source_id = "{type}:{id}"` (falling back to `idx-{index}`)
//! 4. deduplicate by `source_id`, keeping the highest score; equal scores
//!    resolve to the last one seen. Output keeps the position where each
//!    `source_id` first appeared.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

use super::models::{FieldFallback, Note, UNKNOWN_SOURCE_TYPE, UNTITLED};

const ID_FIELDS: &[&str] = &["id", "note_id", "noteId"];
const TYPE_FIELDS: &[&str] = &["type", "source_type", "note_type"];
const TITLE_FIELDS: &[&str] = &["title", "name"];
const CONTENT_FIELDS: &[&str] = &["content", "text", "body"];
const SCORE_FIELDS: &[&str] = &["score", "similarity"];

/// Extract the recall item array from any of the known response envelopes.
///
/// Unknown shapes yield an empty slice rather than an error: an empty recall
/// is a valid (no-op) pass.
pub fn recall_items(payload: &Value) -> &[Value] {
    let candidates = [
        payload.get("c").and_then(|c| c.get("data")),
        payload.get("data"),
        payload.get("result").and_then(|r| r.get("data")),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Normalize raw recall items into deduplicated notes.
pub fn normalize_items(items: &[Value], policy: FieldFallback, now: DateTime<Utc>) -> Vec<Note> {
    let mut notes: Vec<Note> = Vec::with_capacity(items.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (index, item) in items.iter().enumerate() {
        let note = normalize_item(item, index, policy, now);

        match positions.get(&note.source_id) {
            Some(&pos) => {
                // Ties go to the later item
                if note.score >= notes[pos].score {
                    notes[pos] = note;
                }
            }
            None => {
                positions.insert(note.source_id.clone(), notes.len());
                notes.push(note);
            }
        }
    }

    notes
}

/// Normalize a full recall payload (envelope included).
pub fn normalize_payload(payload: &Value, policy: FieldFallback, now: DateTime<Utc>) -> Vec<Note> {
    normalize_items(recall_items(payload), policy, now)
}

fn normalize_item(item: &Value, index: usize, policy: FieldFallback, now: DateTime<Utc>) -> Note {
    let raw_id = text_field(item, ID_FIELDS, policy).unwrap_or_else(|| format!("idx-{}", index));
    let source_type =
        text_field(item, TYPE_FIELDS, policy).unwrap_or_else(|| UNKNOWN_SOURCE_TYPE.to_string());
    let title = text_field(item, TITLE_FIELDS, policy).unwrap_or_else(|| UNTITLED.to_string());
    let content = text_field(item, CONTENT_FIELDS, policy).unwrap_or_default();
    let score = score_field(item);

    Note::new(source_type, &raw_id, title, content, score, now)
}

/// First non-null alias of a field.
fn lookup<'a>(item: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| item.get(*name))
        .find(|v| !v.is_null())
}

fn text_field(item: &Value, names: &[&str], policy: FieldFallback) -> Option<String> {
    let value = lookup(item, names)?;
    if policy == FieldFallback::Falsy && is_falsy(value) {
        return None;
    }
    Some(value_to_text(value))
}

fn score_field(item: &Value) -> f64 {
    let score = match lookup(item, SCORE_FIELDS) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        _ => 0.0,
    };
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f == 0.0 || f.is_nan()).unwrap_or(false),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
