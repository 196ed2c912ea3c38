//! HTTP recall client
//!
//! Implements `NoteSource` against the knowledge-recall endpoint
//! (`POST {api_base}/knowledge/search/recall`).
//!
//! Configuration comes from [`RecallConfig`](crate::RecallConfig):
//! - `GET_API_KEY` (required)
//! - `GET_API_BASE` (default: `https://open-api.biji.com/getnote/openapi`)
//! - `GET_SYNC_QUERY`, `GET_TOP_K`
//! - `GET_TOPIC_ID` or `GET_TOPIC_IDS` (one of them required)

use super::traits::NoteSource;
use crate::error::{Result, SyncError};
use crate::notes::{normalize_payload, FieldFallback, Note};
use crate::{RecallConfig, TopicSelector};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::time::Duration;

pub const RECALL_PATH: &str = "/knowledge/search/recall";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Recall API client. Cheap to clone (shares the reqwest client).
#[derive(Clone)]
pub struct HttpRecallClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    question: String,
    top_k: u32,
    topics: TopicSelector,
    field_fallback: FieldFallback,
}

#[derive(Debug, Serialize)]
struct RecallRequest<'a> {
    question: &'a str,
    top_k: u32,
    intent_rewrite: bool,
    select_matrix: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic_ids: Option<&'a [String]>,
}

impl HttpRecallClient {
    /// Build a client from validated recall configuration.
    pub fn from_config(config: &RecallConfig) -> Result<Self> {
        let topics = config.topics.clone().ok_or_else(|| {
            SyncError::Config("Missing GET_TOPIC_ID (or GET_TOPIC_IDS)".to_string())
        })?;
        if config.api_key.is_empty() {
            return Err(SyncError::Config(
                "Missing required environment variable: GET_API_KEY".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", config.api_base.trim_end_matches('/'), RECALL_PATH),
            api_key: config.api_key.clone(),
            question: config.query.clone(),
            top_k: config.top_k,
            topics,
            field_fallback: config.field_fallback,
        })
    }

    /// The full recall endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(&self) -> RecallRequest<'_> {
        let (topic_id, topic_ids) = match &self.topics {
            TopicSelector::Single(id) => (Some(id.as_str()), None),
            TopicSelector::Many(ids) => (None, Some(ids.as_slice())),
        };
        RecallRequest {
            question: &self.question,
            top_k: self.top_k,
            intent_rewrite: false,
            select_matrix: false,
            topic_id,
            topic_ids,
        }
    }
}

#[async_trait]
impl NoteSource for HttpRecallClient {
    async fn fetch(&self) -> Result<Vec<Note>> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("X-OAuth-Version", "1")
            .json(&self.request_body())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::RecallApi {
                status: status.as_u16(),
                body,
            });
        }

        let payload: serde_json::Value = response.json().await?;
        let notes = normalize_payload(&payload, self.field_fallback, Utc::now());
        tracing::debug!(count = notes.len(), "Recalled notes");
        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base: &str, topics: Option<TopicSelector>) -> RecallConfig {
        RecallConfig {
            api_base: base.to_string(),
            api_key: "test-key".to_string(),
            query: "recent notes".to_string(),
            top_k: 5,
            topics,
            field_fallback: FieldFallback::Falsy,
        }
    }

    #[test]
    fn test_from_config_requires_topics() {
        let err = HttpRecallClient::from_config(&config("http://x", None))
            .err()
            .expect("missing topics must fail");
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let mut cfg = config("http://x", Some(TopicSelector::Single("t".into())));
        cfg.api_key.clear();
        assert!(HttpRecallClient::from_config(&cfg).is_err());
    }

    #[test]
    fn test_endpoint_joins_base() {
        let client = HttpRecallClient::from_config(&config(
            "https://api.example.com/openapi/",
            Some(TopicSelector::Single("t".into())),
        ))
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://api.example.com/openapi/knowledge/search/recall"
        );
    }

    #[test]
    fn test_request_body_topic_variants() {
        let single = HttpRecallClient::from_config(&config(
            "http://x",
            Some(TopicSelector::Single("t1".into())),
        ))
        .unwrap();
        let body = serde_json::to_value(single.request_body()).unwrap();
        assert_eq!(body["topic_id"], "t1");
        assert!(body.get("topic_ids").is_none());
        assert_eq!(body["intent_rewrite"], false);
        assert_eq!(body["top_k"], 5);

        let many = HttpRecallClient::from_config(&config(
            "http://x",
            Some(TopicSelector::Many(vec!["a".into(), "b".into()])),
        ))
        .unwrap();
        let body = serde_json::to_value(many.request_body()).unwrap();
        assert_eq!(body["topic_ids"], json!(["a", "b"]));
        assert!(body.get("topic_id").is_none());
    }

    #[tokio::test]
    async fn test_fetch_normalizes_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/knowledge/search/recall"))
            .and(header("Authorization", "Bearer test-key"))
            .and(header("X-OAuth-Version", "1"))
            .and(body_partial_json(json!({ "topic_id": "t1", "select_matrix": false })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "c": { "data": [
                    { "id": "7", "type": "NOTE", "title": "X", "content": "hi", "score": 1 },
                    { "id": "7", "type": "NOTE", "title": "X-old", "content": "hi", "score": 0.2 }
                ]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpRecallClient::from_config(&config(
            &server.uri(),
            Some(TopicSelector::Single("t1".into())),
        ))
        .unwrap();

        let notes = client.fetch().await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].source_id, "NOTE:7");
        assert_eq!(notes[0].title, "X");
    }

    #[tokio::test]
    async fn test_fetch_maps_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/knowledge/search/recall"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let client = HttpRecallClient::from_config(&config(
            &server.uri(),
            Some(TopicSelector::Single("t1".into())),
        ))
        .unwrap();

        match client.fetch().await {
            Err(SyncError::RecallApi { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad token");
            }
            other => panic!("expected RecallApi error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_unknown_envelope_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .mount(&server)
            .await;

        let client = HttpRecallClient::from_config(&config(
            &server.uri(),
            Some(TopicSelector::Many(vec!["a".into()])),
        ))
        .unwrap();
        assert!(client.fetch().await.unwrap().is_empty());
    }
}
