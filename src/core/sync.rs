//! Synchronization engine
//!
//! Mirrors a scanned vault under a destination page.
//!
//! ## Flow
//!
//! 1. Load state and check it belongs to the destination
//! 2. Materialise directory pages, parents before children
//! 3. For each document: hash, decide create / update / skip, parse,
//!    render, write, record, save
//!
//! State is saved after every page written, so an interrupted run resumes
//! without duplicating pages. Documents are processed strictly in scan
//! order; a failure stops the run.

use crate::core::error::SyncError;
use crate::core::hashing::hash_file;
use crate::core::links::LinkIndex;
use crate::core::parser::parse_markdown;
use crate::core::scanner::{parent_key, sort_parents_first, ScanResult, ROOT_KEY};
use crate::core::sync_state::{FileEntry, StateStore, SyncState};
use crate::notion::render::{upload_images, Renderer};
use crate::notion::{replace_page_content, FileUploader, PageApi};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

/// Run options
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Rewrite every document even if unchanged
    pub force: bool,
    /// Report planned actions without remote calls or state writes
    pub dry_run: bool,
}

/// Outcome for one document
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// A new page was created
    Created { path: String, page_id: String },
    /// An existing page's content was replaced
    Updated { path: String, page_id: String },
    /// Content hash unchanged
    Skipped(String),
    /// Dry run: the document would have been created or updated
    Planned { path: String, update: bool },
}

/// Totals for a run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    pub directories_created: usize,
    pub pages_created: usize,
    pub pages_updated: usize,
    pub skipped: usize,
    pub planned: usize,
}

impl SyncSummary {
    pub fn add(&mut self, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Created { .. } => self.pages_created += 1,
            SyncOutcome::Updated { .. } => self.pages_updated += 1,
            SyncOutcome::Skipped(_) => self.skipped += 1,
            SyncOutcome::Planned { .. } => self.planned += 1,
        }
    }

    /// Number of documents seen
    pub fn documents(&self) -> usize {
        self.pages_created + self.pages_updated + self.skipped + self.planned
    }
}

impl std::fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} directories created, {} pages created, {} updated, {} unchanged",
            self.directories_created, self.pages_created, self.pages_updated, self.skipped
        )?;
        if self.planned > 0 {
            write!(f, ", {} planned", self.planned)?;
        }
        Ok(())
    }
}

/// Sync engine
///
/// Holds the remote and state seams only; all run data lives in
/// [`Synchronizer::run`].
pub struct Synchronizer<'a> {
    api: &'a dyn PageApi,
    uploader: &'a dyn FileUploader,
    store: &'a dyn StateStore,
    options: SyncOptions,
}

impl<'a> Synchronizer<'a> {
    /// Create an engine
    ///
    /// # Arguments
    ///
    /// * `api` - page operations
    /// * `uploader` - image uploads
    /// * `store` - state persistence
    /// * `options` - force / dry-run flags
    pub fn new(
        api: &'a dyn PageApi,
        uploader: &'a dyn FileUploader,
        store: &'a dyn StateStore,
        options: SyncOptions,
    ) -> Self {
        Self {
            api,
            uploader,
            store,
            options,
        }
    }

    /// Sync a scan result under `destination`
    ///
    /// # Returns
    ///
    /// Totals for the run, or the first fatal error
    pub async fn run(&self, scan: &ScanResult, destination: &str) -> Result<SyncSummary, SyncError> {
        let mut state = self.store.load(destination)?;
        let mut summary = SyncSummary::default();

        if scan.is_directory_import() {
            summary.directories_created = self.materialize_directories(scan, &mut state).await?;
        }

        let mut links = LinkIndex::from_state(&state);
        for doc in &scan.documents {
            let outcome = self.sync_document(scan, doc, &mut state, &mut links).await?;
            summary.add(&outcome);
        }

        Ok(summary)
    }

    /// Create a page for every directory not yet in state
    ///
    /// # Returns
    ///
    /// Number of directory pages created
    async fn materialize_directories(&self, scan: &ScanResult, state: &mut SyncState) -> Result<usize, SyncError> {
        let mut created = 0;
        let destination = state.destination_page_id.clone();

        if !scan.needs_wrapper_page {
            if state.directory_page(ROOT_KEY) != Some(destination.as_str()) {
                state.record_directory(ROOT_KEY, destination.as_str());
                self.persist(state)?;
            }
        } else if state.directory_page(ROOT_KEY).is_none() {
            let page_id = self.create_directory_page(&destination, &scan.root_name).await?;
            state.record_directory(ROOT_KEY, page_id);
            self.persist(state)?;
            created += 1;
        }

        let mut directories = scan.directories.clone();
        sort_parents_first(&mut directories);

        for rel_dir in &directories {
            if state.directory_page(rel_dir).is_some() {
                continue;
            }
            let parent_id = state
                .directory_page(&parent_key(rel_dir))
                .ok_or_else(|| SyncError::missing_parent(rel_dir.as_str()))?
                .to_string();
            let title = rel_dir.rsplit('/').next().unwrap_or(rel_dir);

            let page_id = self.create_directory_page(&parent_id, title).await?;
            state.record_directory(rel_dir.as_str(), page_id);
            self.persist(state)?;
            created += 1;
        }

        Ok(created)
    }

    async fn create_directory_page(&self, parent_id: &str, title: &str) -> Result<String, SyncError> {
        if self.options.dry_run {
            info!("Would create directory page {}", title);
            return Ok(format!("dry-run-{}", Uuid::new_v4()));
        }

        let page_id = self
            .api
            .create_page(parent_id, title, Vec::new())
            .await
            .map_err(SyncError::Remote)?;
        info!("Created directory page {}", title);
        Ok(page_id)
    }

    async fn sync_document(
        &self,
        scan: &ScanResult,
        path: &Path,
        state: &mut SyncState,
        links: &mut LinkIndex,
    ) -> Result<SyncOutcome, SyncError> {
        let rel_path = scan.relative_path(path);
        let (hash, bytes) = hash_file(path).map_err(|e| SyncError::document(rel_path.as_str(), e))?;

        let existing = state.file(&rel_path).cloned();
        let changed = existing.as_ref().map_or(true, |e| e.content_hash != hash);
        if !self.options.force && !changed {
            debug!("Unchanged: {}", rel_path);
            return Ok(SyncOutcome::Skipped(rel_path));
        }

        if self.options.dry_run {
            let update = existing.is_some();
            info!("Would {} {}", if update { "update" } else { "create" }, rel_path);
            return Ok(SyncOutcome::Planned { path: rel_path, update });
        }

        let parent_id = if scan.is_directory_import() {
            state
                .directory_page(&parent_key(&rel_path))
                .ok_or_else(|| SyncError::missing_parent(rel_path.as_str()))?
                .to_string()
        } else {
            state.destination_page_id.clone()
        };

        let page_id = self
            .write_document(path, &bytes, &parent_id, existing.as_ref(), links)
            .await
            .map_err(|e| SyncError::document(rel_path.as_str(), e))?;

        state.record_file(
            rel_path.as_str(),
            FileEntry {
                page_id: page_id.clone(),
                content_hash: hash,
                last_synced: chrono::Utc::now().to_rfc3339(),
            },
        );
        links.register(&rel_path, &page_id);
        self.persist(state)?;

        Ok(match existing {
            Some(_) => {
                info!("Updated {}", rel_path);
                SyncOutcome::Updated { path: rel_path, page_id }
            }
            None => {
                info!("Created {}", rel_path);
                SyncOutcome::Created { path: rel_path, page_id }
            }
        })
    }

    /// Parse, render and write one document
    ///
    /// # Returns
    ///
    /// The page id holding the document
    async fn write_document(
        &self,
        path: &Path,
        bytes: &[u8],
        parent_id: &str,
        existing: Option<&FileEntry>,
        links: &LinkIndex,
    ) -> anyhow::Result<String> {
        let content = String::from_utf8_lossy(bytes);
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let doc = parse_markdown(&content, base_dir);

        let images = upload_images(&doc.blocks, self.uploader).await?;
        let children = Renderer::new(&images, links).render(&doc.blocks);

        match existing {
            Some(entry) => {
                replace_page_content(self.api, &entry.page_id, children).await?;
                Ok(entry.page_id.clone())
            }
            None => {
                let title = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.api.create_page(parent_id, &title, children).await
            }
        }
    }

    fn persist(&self, state: &SyncState) -> Result<(), SyncError> {
        if self.options.dry_run {
            return Ok(());
        }
        self.store.save(state)
    }
}
