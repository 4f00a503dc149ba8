//! Notion API error types

use thiserror::Error;

/// Errors raised by [`NotionClient`](super::NotionClient)
#[derive(Error, Debug)]
pub enum NotionError {
    /// Transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error object
    #[error("{message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Local file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A concurrent upload task panicked or was cancelled
    #[error("Upload task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Response did not have the expected shape
    #[error("Malformed API response: {0}")]
    MalformedResponse(String),
}

impl NotionError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }
}
