//! Notion REST client
//!
//! Only the four calls replication needs: retrieve the database, query it
//! by `SourceId`, create a page, update a page's properties.

use reqwest::Method;
use serde_json::{json, Value};
use std::time::Duration;

use super::properties::SOURCE_ID;
use crate::error::{Result, SyncError};

pub const NOTION_API_VERSION: &str = "2022-06-28";
pub const DEFAULT_NOTION_API_BASE: &str = "https://api.notion.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct NotionClient {
    client: reqwest::Client,
    base: String,
    token: String,
}

impl NotionClient {
    pub fn new(base: &str, token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let mut req = self
            .client
            .request(method, format!("{}{}", self.base, path))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_API_VERSION);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::TargetApi {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    pub async fn retrieve_database(&self, database_id: &str) -> Result<Value> {
        self.request(Method::GET, &format!("/databases/{}", database_id), None)
            .await
    }

    /// The first page whose `SourceId` equals `source_id`.
    pub async fn find_by_source_id(&self, database_id: &str, source_id: &str) -> Result<Option<Value>> {
        let body = json!({
            "filter": {
                "property": SOURCE_ID,
                "rich_text": { "equals": source_id }
            },
            "page_size": 1
        });
        let response = self
            .request(
                Method::POST,
                &format!("/databases/{}/query", database_id),
                Some(body),
            )
            .await?;
        Ok(response["results"]
            .as_array()
            .and_then(|results| results.first())
            .cloned())
    }

    pub async fn create_page(&self, database_id: &str, properties: Value) -> Result<Value> {
        let body = json!({
            "parent": { "database_id": database_id },
            "properties": properties
        });
        self.request(Method::POST, "/pages", Some(body)).await
    }

    pub async fn update_page(&self, page_id: &str, properties: Value) -> Result<Value> {
        self.request(
            Method::PATCH,
            &format!("/pages/{}", page_id),
            Some(json!({ "properties": properties })),
        )
        .await
    }
}

/// Public URL of a page object, falling back to its id.
pub fn page_url(page: &Value) -> String {
    page.get("url")
        .and_then(Value::as_str)
        .or_else(|| page.get("id").and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}
