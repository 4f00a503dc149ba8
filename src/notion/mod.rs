//! Notion adapter
//!
//! The sync engine talks to the remote workspace only through the traits
//! defined here, so tests can substitute an in-memory implementation.
//!
//! ## Module structure
//!
//! - [`client`](client::NotionClient) - REST client implementing both traits
//! - [`upload`] - single- and multi-part file uploads
//! - [`render`] - conversion of parsed blocks to API block objects
//! - [`error`](error::NotionError) - API error type

pub mod client;
pub mod error;
pub mod render;
pub mod upload;

pub use client::NotionClient;
pub use error::NotionError;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

/// Page and block operations
///
/// Children are API block objects as produced by [`render`].
#[async_trait]
pub trait PageApi: Send + Sync {
    /// Create a page under `parent_id`
    ///
    /// # Returns
    ///
    /// The id of the new page
    async fn create_page(&self, parent_id: &str, title: &str, children: Vec<Value>) -> Result<String>;

    /// Append children to a block or page
    ///
    /// Implementations split long lists into requests of at most 100 blocks.
    async fn append_children(&self, block_id: &str, children: Vec<Value>) -> Result<()>;

    /// Ids of a block's direct children, across all result pages
    async fn list_children(&self, block_id: &str) -> Result<Vec<String>>;

    /// Delete (archive) a block
    async fn delete_block(&self, block_id: &str) -> Result<()>;
}

/// File upload
#[async_trait]
pub trait FileUploader: Send + Sync {
    /// Upload a local file
    ///
    /// # Returns
    ///
    /// An upload id usable as an image block's file reference
    async fn upload(&self, path: &Path) -> Result<String>;
}

/// Replace a page's content with new blocks
///
/// Deletes every existing child, then appends `children`.
pub async fn replace_page_content(api: &dyn PageApi, page_id: &str, children: Vec<Value>) -> Result<()> {
    let existing = api.list_children(page_id).await?;
    tracing::debug!("Deleting {} existing blocks of {}", existing.len(), page_id);
    for block_id in existing {
        api.delete_block(&block_id).await?;
    }
    api.append_children(page_id, children).await
}
