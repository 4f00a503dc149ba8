//! Notion REST client

use crate::core::error::SyncError;
use crate::notion::error::NotionError;
use crate::notion::PageApi;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::env;
use tracing::debug;

/// API version sent with every request
pub const NOTION_VERSION: &str = "2022-06-28";
pub const DEFAULT_API_BASE: &str = "https://api.notion.com/v1";
/// Integration token variable
pub const TOKEN_VAR: &str = "NOTION_TOKEN";
/// Optional base URL override, mostly for tests against a local server
pub const API_BASE_VAR: &str = "NOTION_API_BASE";
/// Most children accepted by a single create or append request
pub const MAX_BLOCKS_PER_REQUEST: usize = 100;

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ChildrenPage {
    results: Vec<BlockRef>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BlockRef {
    id: String,
}

/// Authenticated API client
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct NotionClient {
    pub(crate) http: reqwest::Client,
    token: String,
    base_url: String,
}

impl NotionClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, DEFAULT_API_BASE)
    }

    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build a client from `NOTION_TOKEN` and the optional `NOTION_API_BASE`
    ///
    /// # Errors
    ///
    /// [`SyncError::MissingCredential`] when the token is unset or empty.
    pub fn from_env() -> Result<Self, SyncError> {
        let token = env::var(TOKEN_VAR)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| SyncError::MissingCredential {
                var: TOKEN_VAR.to_string(),
            })?;
        let base = env::var(API_BASE_VAR).unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        Ok(Self::with_base_url(token, base))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request with authentication and version headers set
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        self.http
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    /// Send a request and decode the JSON body, mapping API errors
    pub(crate) async fn send_json(&self, request: RequestBuilder) -> Result<Value, NotionError> {
        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn decode(response: Response) -> Result<Value, NotionError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or(ApiErrorBody {
            code: String::new(),
            message: text,
        });
        Err(NotionError::Api {
            status: status.as_u16(),
            code: body.code,
            message: if body.message.is_empty() {
                format!("HTTP {}", status)
            } else {
                body.message
            },
        })
    }

    async fn append_batch(&self, block_id: &str, children: &[Value]) -> Result<(), NotionError> {
        let request = self
            .request(Method::PATCH, &format!("blocks/{}/children", block_id))
            .json(&json!({ "children": children }));
        self.send_json(request).await?;
        Ok(())
    }
}

/// Id field of a created object
pub(crate) fn object_id(value: &Value) -> Result<String, NotionError> {
    value["id"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| NotionError::malformed("response has no id"))
}

#[async_trait]
impl PageApi for NotionClient {
    async fn create_page(&self, parent_id: &str, title: &str, children: Vec<Value>) -> Result<String> {
        let split = children.len().min(MAX_BLOCKS_PER_REQUEST);
        let (first, rest) = children.split_at(split);

        let body = json!({
            "parent": { "page_id": parent_id },
            "properties": {
                "title": { "title": [{ "type": "text", "text": { "content": title } }] }
            },
            "children": first,
        });
        let page = self.send_json(self.request(Method::POST, "pages").json(&body)).await?;
        let page_id = object_id(&page)?;
        debug!("Created page {} ({})", title, page_id);

        if !rest.is_empty() {
            for batch in rest.chunks(MAX_BLOCKS_PER_REQUEST) {
                self.append_batch(&page_id, batch).await?;
            }
        }
        Ok(page_id)
    }

    async fn append_children(&self, block_id: &str, children: Vec<Value>) -> Result<()> {
        for batch in children.chunks(MAX_BLOCKS_PER_REQUEST) {
            self.append_batch(block_id, batch).await?;
        }
        Ok(())
    }

    async fn list_children(&self, block_id: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = vec![("page_size", MAX_BLOCKS_PER_REQUEST.to_string())];
            if let Some(c) = &cursor {
                query.push(("start_cursor", c.clone()));
            }
            let request = self
                .request(Method::GET, &format!("blocks/{}/children", block_id))
                .query(&query);
            let value = self.send_json(request).await?;
            let page: ChildrenPage =
                serde_json::from_value(value).map_err(|e| NotionError::malformed(e.to_string()))?;

            ids.extend(page.results.into_iter().map(|b| b.id));
            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }
        Ok(ids)
    }

    async fn delete_block(&self, block_id: &str) -> Result<()> {
        self.send_json(self.request(Method::DELETE, &format!("blocks/{}", block_id)))
            .await?;
        Ok(())
    }
}
