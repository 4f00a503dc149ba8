//! Wiki-link resolution
//!
//! Maps document identities to the pages created for them. Links resolve to
//! whatever has been registered so far: documents synced in earlier runs and
//! documents already processed in this one. A link to a document that has
//! not been synced yet stays unresolved and renders as styled text.

use crate::core::parser::wiki_link::{normalize_target, target_stem};
use crate::core::sync_state::SyncState;
use std::collections::HashMap;

/// Resolves a wiki-link target to a page id
pub trait LinkResolver {
    fn resolve(&self, target: &str) -> Option<String>;
}

/// Lookup table from document identity to page id
///
/// Keys are case-sensitive: the relative path with and without `.md`, and
/// the bare file stem. When two documents share a stem the first one
/// registered keeps it.
#[derive(Debug, Default, Clone)]
pub struct LinkIndex {
    by_path: HashMap<String, String>,
    by_stem: HashMap<String, String>,
}

impl LinkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index seeded with every document in persisted state
    pub fn from_state(state: &SyncState) -> Self {
        let mut index = Self::new();
        for (rel_path, entry) in &state.files {
            index.register(rel_path, &entry.page_id);
        }
        index
    }

    /// Register a document's page
    pub fn register(&mut self, rel_path: &str, page_id: &str) {
        let key = normalize_target(rel_path);
        self.by_stem
            .entry(target_stem(&key).to_string())
            .or_insert_with(|| page_id.to_string());
        self.by_path.insert(key, page_id.to_string());
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

impl LinkResolver for LinkIndex {
    fn resolve(&self, target: &str) -> Option<String> {
        let key = normalize_target(target);
        if key.is_empty() {
            return None;
        }

        self.by_path
            .get(&key)
            .or_else(|| self.by_stem.get(target_stem(&key)))
            .cloned()
    }
}
