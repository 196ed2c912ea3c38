//! Database schema inspection and page property payloads

use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::error::{Result, SyncError};
use crate::notes::Note;
use crate::reconcile::truncate_chars;

pub const NAME: &str = "Name";
pub const CONTENT: &str = "Content";
pub const SOURCE_ID: &str = "SourceId";
pub const UPDATED_AT: &str = "UpdatedAt";
pub const CONTENT_HASH: &str = "ContentHash";
pub const SOURCE_TYPE: &str = "SourceType";
pub const SCORE: &str = "Score";

/// Characters per rich-text chunk.
const CHUNK_CHARS: usize = 1900;
/// Rich-text chunks per property.
const MAX_CHUNKS: usize = 20;
const NAME_MAX_CHARS: usize = 200;

/// Property name → property type of the target database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseSchema {
    properties: HashMap<String, String>,
}

impl DatabaseSchema {
    /// Read the schema from a `GET /databases/{id}` response.
    pub fn from_database(database: &Value) -> Self {
        let properties = database
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .filter_map(|(name, prop)| {
                        prop.get("type")
                            .and_then(Value::as_str)
                            .map(|t| (name.clone(), t.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { properties }
    }

    pub fn has(&self, name: &str, kind: &str) -> bool {
        self.properties.get(name).is_some_and(|t| t == kind)
    }

    /// The properties every synced database needs.
    pub fn validate(&self) -> Result<()> {
        if !self.has(SOURCE_ID, "rich_text") {
            return Err(SyncError::Schema(format!(
                "Notion database must contain property \"{}\" (Rich text)",
                SOURCE_ID
            )));
        }
        if !self.has(NAME, "title") {
            return Err(SyncError::Schema(format!(
                "Notion database must contain property \"{}\" (Title)",
                NAME
            )));
        }
        Ok(())
    }
}

fn text(content: &str) -> Value {
    json!([{ "text": { "content": content } }])
}

/// Split text into at most 20 rich-text chunks of 1900 characters.
pub fn rich_text_chunks(content: &str) -> Value {
    let chars: Vec<char> = content.chars().collect();
    let chunks: Vec<Value> = chars
        .chunks(CHUNK_CHARS)
        .take(MAX_CHUNKS)
        .map(|chunk| json!({ "text": { "content": chunk.iter().collect::<String>() } }))
        .collect();
    Value::Array(chunks)
}

/// Page properties for `note`, limited to what the schema declares.
pub fn page_properties(note: &Note, schema: &DatabaseSchema) -> Value {
    let mut props = Map::new();

    if schema.has(NAME, "title") {
        props.insert(
            NAME.into(),
            json!({ "title": text(truncate_chars(&note.title, NAME_MAX_CHARS)) }),
        );
    }
    if schema.has(CONTENT, "rich_text") {
        props.insert(
            CONTENT.into(),
            json!({ "rich_text": rich_text_chunks(&note.content) }),
        );
    }
    if schema.has(SOURCE_ID, "rich_text") {
        props.insert(SOURCE_ID.into(), json!({ "rich_text": text(&note.source_id) }));
    }
    if schema.has(UPDATED_AT, "date") {
        props.insert(
            UPDATED_AT.into(),
            json!({ "date": { "start": note.synced_at.to_rfc3339() } }),
        );
    }
    if schema.has(CONTENT_HASH, "rich_text") {
        props.insert(
            CONTENT_HASH.into(),
            json!({ "rich_text": text(&note.content_hash) }),
        );
    }
    if schema.has(SOURCE_TYPE, "rich_text") {
        props.insert(
            SOURCE_TYPE.into(),
            json!({ "rich_text": text(&note.source_type) }),
        );
    }
    if schema.has(SCORE, "number") {
        props.insert(SCORE.into(), json!({ "number": note.score }));
    }

    Value::Object(props)
}

/// The `ContentHash` stored on an existing page, or `""`.
pub fn stored_hash(page: &Value) -> String {
    let prop = &page["properties"][CONTENT_HASH];
    if prop.get("type").and_then(Value::as_str) != Some("rich_text") {
        return String::new();
    }
    prop["rich_text"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .map(|p| p.get("plain_text").and_then(Value::as_str).unwrap_or_default())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn full_schema() -> DatabaseSchema {
        DatabaseSchema::from_database(&json!({
            "properties": {
                "Name": { "type": "title" },
                "Content": { "type": "rich_text" },
                "SourceId": { "type": "rich_text" },
                "UpdatedAt": { "type": "date" },
                "ContentHash": { "type": "rich_text" },
                "SourceType": { "type": "rich_text" },
                "Score": { "type": "number" }
            }
        }))
    }

    #[test]
    fn test_schema_validation() {
        assert!(full_schema().validate().is_ok());

        let missing_source = DatabaseSchema::from_database(&json!({
            "properties": { "Name": { "type": "title" } }
        }));
        let err = missing_source.validate().unwrap_err();
        assert!(err.to_string().contains("SourceId"));

        let wrong_name = DatabaseSchema::from_database(&json!({
            "properties": {
                "Name": { "type": "rich_text" },
                "SourceId": { "type": "rich_text" }
            }
        }));
        assert!(wrong_name.validate().unwrap_err().to_string().contains("Name"));
    }

    #[test]
    fn test_properties_follow_schema() {
        let note = Note::new("NOTE", "7", "X", "hi", 1.0, Utc::now());
        let props = page_properties(&note, &full_schema());
        assert_eq!(props["Name"]["title"][0]["text"]["content"], "X");
        assert_eq!(props["SourceId"]["rich_text"][0]["text"]["content"], "NOTE:7");
        assert_eq!(props["ContentHash"]["rich_text"][0]["text"]["content"], note.content_hash.as_str());
        assert_eq!(props["Score"]["number"], 1.0);

        let minimal = DatabaseSchema::from_database(&json!({
            "properties": {
                "Name": { "type": "title" },
                "SourceId": { "type": "rich_text" },
                "Score": { "type": "rich_text" }
            }
        }));
        let props = page_properties(&note, &minimal);
        let keys: Vec<&String> = props.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 2);
        assert!(props.get("Score").is_none());
    }

    #[test]
    fn test_rich_text_chunking() {
        let long = "a".repeat(1900 * 25);
        let chunks = rich_text_chunks(&long);
        let chunks = chunks.as_array().unwrap();
        assert_eq!(chunks.len(), 20);
        assert_eq!(chunks[0]["text"]["content"].as_str().unwrap().len(), 1900);

        assert_eq!(rich_text_chunks(""), json!([]));
        assert_eq!(rich_text_chunks("short").as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_stored_hash() {
        let page = json!({
            "properties": {
                "ContentHash": {
                    "type": "rich_text",
                    "rich_text": [{ "plain_text": "ab" }, { "plain_text": "cd" }]
                }
            }
        });
        assert_eq!(stored_hash(&page), "abcd");
        assert_eq!(stored_hash(&json!({ "properties": {} })), "");
    }
}
