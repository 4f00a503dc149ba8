//! File uploads
//!
//! Small files go up in one request. Files above [`SINGLE_PART_LIMIT`] use
//! the multi-part protocol: parts of [`PART_SIZE`] bytes are sent
//! concurrently, then the upload is completed.

use crate::notion::client::{object_id, NotionClient};
use crate::notion::error::NotionError;
use crate::notion::FileUploader;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde_json::json;
use std::path::Path;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Largest file sent as a single part
pub const SINGLE_PART_LIMIT: u64 = 20 * 1024 * 1024;
/// Part size for multi-part uploads
pub const PART_SIZE: usize = 10 * 1024 * 1024;

/// MIME type from a file extension
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "ico" => "image/vnd.microsoft.icon",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Number of parts needed for `len` bytes
pub fn part_count(len: usize) -> usize {
    len.div_ceil(PART_SIZE).max(1)
}

impl NotionClient {
    async fn create_upload(&self, body: serde_json::Value) -> Result<String, NotionError> {
        let value = self
            .send_json(self.request(Method::POST, "file_uploads").json(&body))
            .await?;
        object_id(&value)
    }

    async fn send_part(
        &self,
        upload_id: &str,
        data: Vec<u8>,
        filename: String,
        mime: &'static str,
        part_number: Option<usize>,
    ) -> Result<(), NotionError> {
        let part = Part::bytes(data).file_name(filename).mime_str(mime)?;
        let mut form = Form::new().part("file", part);
        if let Some(n) = part_number {
            form = form.text("part_number", n.to_string());
        }
        let request = self
            .request(Method::POST, &format!("file_uploads/{}/send", upload_id))
            .multipart(form);
        self.send_json(request).await?;
        Ok(())
    }

    async fn upload_single(&self, data: Vec<u8>, filename: String, mime: &'static str) -> Result<String, NotionError> {
        let upload_id = self.create_upload(json!({})).await?;
        self.send_part(&upload_id, data, filename, mime, None).await?;
        Ok(upload_id)
    }

    async fn upload_multi(&self, data: Vec<u8>, filename: String, mime: &'static str) -> Result<String, NotionError> {
        let parts = part_count(data.len());
        let upload_id = self
            .create_upload(json!({
                "mode": "multi_part",
                "number_of_parts": parts,
                "filename": filename,
                "content_type": mime,
            }))
            .await?;
        info!("Uploading {} in {} parts", filename, parts);

        let mut tasks = JoinSet::new();
        for (index, chunk) in data.chunks(PART_SIZE).enumerate() {
            let client = self.clone();
            let id = upload_id.clone();
            let name = filename.clone();
            let chunk = chunk.to_vec();
            tasks.spawn(async move { client.send_part(&id, chunk, name, mime, Some(index + 1)).await });
        }
        while let Some(joined) = tasks.join_next().await {
            joined??;
        }

        self.send_json(self.request(Method::POST, &format!("file_uploads/{}/complete", upload_id)))
            .await?;
        Ok(upload_id)
    }
}

#[async_trait]
impl FileUploader for NotionClient {
    async fn upload(&self, path: &Path) -> Result<String> {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {:?}", path))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime = content_type(path);
        debug!("Uploading {:?} ({} bytes, {})", path, data.len(), mime);

        let id = if data.len() as u64 > SINGLE_PART_LIMIT {
            self.upload_multi(data, filename, mime).await?
        } else {
            self.upload_single(data, filename, mime).await?
        };
        Ok(id)
    }
}
