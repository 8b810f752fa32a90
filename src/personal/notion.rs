//! Notion REST client.
//!
//! Two endpoints are used:
//!
//! - `POST /v1/search` filtered to pages, to list what the integration can see
//! - `GET /v1/blocks/{id}/children`, to read a page's top-level blocks

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::blocks::page_title;
use super::{DocumentRef, PersonalSource};
use crate::config::PersonalConfig;
use crate::credentials::Credential;
use crate::error::{KenningError, Result};

/// API version header sent with every request.
pub const NOTION_VERSION: &str = "2022-06-28";

/// Client for the Notion API.
pub struct NotionClient {
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl NotionClient {
    /// Build a client from the `[personal]` config table.
    ///
    /// # Errors
    ///
    /// Returns [`KenningError::Config`] if the HTTP client cannot be built.
    pub fn from_config(config: &PersonalConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| KenningError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.notion_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder, credential: &Credential) -> Result<Value> {
        let response = request
            .bearer_auth(credential.expose())
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    KenningError::Timeout(format!("Notion request timed out: {e}"))
                } else {
                    KenningError::Request(format!("Notion request failed: {e}"))
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(KenningError::PersonalSourceUnavailable(format!(
                "Notion refused the credential (HTTP {})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KenningError::Request(format!(
                "Notion returned HTTP {}: {}",
                status.as_u16(),
                extract_notion_message(&body)
            )));
        }

        response
            .json()
            .await
            .map_err(|e| KenningError::Request(format!("invalid Notion response body: {e}")))
    }
}

fn extract_notion_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| body.to_string())
}

fn results_array(body: Value) -> Result<Vec<Value>> {
    match body {
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(KenningError::Request("Notion response has no results array".into())),
        },
        _ => Err(KenningError::Request("Notion response is not an object".into())),
    }
}

/// Map one page object from `/v1/search` to a [`DocumentRef`].
pub(crate) fn document_ref(page: &Value) -> Option<DocumentRef> {
    let id = page.get("id").and_then(Value::as_str)?.to_string();
    let url = page
        .get("url")
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| format!("https://notion.so/{}", id.replace('-', "")));
    Some(DocumentRef {
        title: page_title(page),
        id,
        url,
    })
}

#[async_trait]
impl PersonalSource for NotionClient {
    fn name(&self) -> &str {
        "notion"
    }

    async fn list_documents(&self, credential: &Credential, limit: usize) -> Result<Vec<DocumentRef>> {
        let body = serde_json::json!({
            "filter": {"value": "page", "property": "object"},
            "page_size": limit.clamp(1, 100),
        });
        let request = self
            .client
            .post(format!("{}/v1/search", self.base_url))
            .json(&body);
        let pages = results_array(self.send(request, credential).await?)?;
        let docs: Vec<DocumentRef> = pages.iter().filter_map(document_ref).take(limit).collect();
        tracing::debug!(count = docs.len(), "listed Notion pages");
        Ok(docs)
    }

    async fn fetch_blocks(&self, credential: &Credential, id: &str) -> Result<Vec<Value>> {
        let request = self
            .client
            .get(format!("{}/v1/blocks/{id}/children", self.base_url));
        results_array(self.send(request, credential).await?)
    }
}
