//! Sync error types

use thiserror::Error;

/// Fatal synchronization errors
///
/// Any of these aborts the run. Progress already written to the state file
/// stays valid, so re-running resumes where the failure happened.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Required credential missing from the environment
    #[error("{var} environment variable is not set")]
    MissingCredential { var: String },

    /// State file belongs to another destination page
    #[error(
        "State file is bound to destination {stored}, not {requested}. \
         Delete the state file to start over."
    )]
    DestinationMismatch { stored: String, requested: String },

    /// A directory or document has no recorded parent page
    #[error("Missing parent page for {path}")]
    MissingParent { path: String },

    /// Processing a single document failed
    #[error("Error processing {path}: {source}")]
    Document {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// Reading or writing the state file failed
    #[error("Sync state error: {0}")]
    State(#[source] anyhow::Error),

    /// A remote call outside document processing failed
    #[error("Remote error: {0}")]
    Remote(#[source] anyhow::Error),
}

impl SyncError {
    pub fn missing_parent(path: impl Into<String>) -> Self {
        Self::MissingParent { path: path.into() }
    }

    pub fn document(path: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Document {
            path: path.into(),
            source,
        }
    }
}
