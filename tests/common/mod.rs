//! In-memory Notion stand-ins for integration tests

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use vault2notion::notion::{FileUploader, PageApi};

/// Recorded remote call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreatePage { parent: String, title: String },
    Append { block: String, count: usize },
    List(String),
    Delete(String),
    Upload(PathBuf),
}

/// Page store recording every call
#[derive(Default)]
pub struct MockApi {
    calls: Mutex<Vec<Call>>,
    pages: Mutex<HashMap<String, Vec<Value>>>,
    titles: Mutex<HashMap<String, String>>,
    /// `create_page` fails with this message for the given title
    fail: Option<(String, String)>,
    /// Every `append_children` fails with this message while set
    fail_append: Mutex<Option<String>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(title: &str, message: &str) -> Self {
        Self {
            fail: Some((title.to_string(), message.to_string())),
            ..Self::default()
        }
    }

    pub fn fail_appends(&self, message: &str) {
        *self.fail_append.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Titles of created pages, in creation order
    pub fn created_titles(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CreatePage { title, .. } => Some(title),
                _ => None,
            })
            .collect()
    }

    /// Current children of a page
    pub fn children(&self, page_id: &str) -> Vec<Value> {
        self.pages.lock().unwrap().get(page_id).cloned().unwrap_or_default()
    }

    /// Page id by title
    pub fn page_id(&self, title: &str) -> Option<String> {
        self.titles.lock().unwrap().get(title).cloned()
    }

    /// Concatenated plain text of a page's top-level blocks
    pub fn page_text(&self, page_id: &str) -> String {
        self.children(page_id)
            .iter()
            .map(|block| {
                let kind = block["type"].as_str().unwrap_or_default();
                block[kind]["rich_text"]
                    .as_array()
                    .map(|parts| {
                        parts
                            .iter()
                            .map(|p| p["text"]["content"].as_str().unwrap_or_default())
                            .collect::<String>()
                    })
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PageApi for MockApi {
    async fn create_page(&self, parent_id: &str, title: &str, children: Vec<Value>) -> Result<String> {
        self.record(Call::CreatePage {
            parent: parent_id.to_string(),
            title: title.to_string(),
        });
        if let Some((fail_title, message)) = &self.fail {
            if fail_title == title {
                bail!("{}", message);
            }
        }

        let mut pages = self.pages.lock().unwrap();
        let page_id = format!("page-{}", pages.len() + 1);
        pages.insert(page_id.clone(), children);
        self.titles.lock().unwrap().insert(title.to_string(), page_id.clone());
        Ok(page_id)
    }

    async fn append_children(&self, block_id: &str, children: Vec<Value>) -> Result<()> {
        self.record(Call::Append {
            block: block_id.to_string(),
            count: children.len(),
        });
        if let Some(message) = self.fail_append.lock().unwrap().clone() {
            bail!("{}", message);
        }
        self.pages
            .lock()
            .unwrap()
            .entry(block_id.to_string())
            .or_default()
            .extend(children);
        Ok(())
    }

    async fn list_children(&self, block_id: &str) -> Result<Vec<String>> {
        self.record(Call::List(block_id.to_string()));
        let count = self.children(block_id).len();
        Ok((0..count).map(|i| format!("{}:{}", block_id, i)).collect())
    }

    async fn delete_block(&self, block_id: &str) -> Result<()> {
        self.record(Call::Delete(block_id.to_string()));
        if let Some((page, _)) = block_id.split_once(':') {
            if let Some(children) = self.pages.lock().unwrap().get_mut(page) {
                children.pop();
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FileUploader for MockApi {
    async fn upload(&self, path: &Path) -> Result<String> {
        self.record(Call::Upload(path.to_path_buf()));
        Ok(format!("upload-{}", path.file_name().unwrap().to_string_lossy()))
    }
}
