//! Scan filter configuration
//!
//! Whitelist and blacklist glob patterns deciding which files of a vault are
//! imported.
//!
//! ## Config format (`vault2notion.toml`)
//!
//! ```toml
//! whitelist = ["*.md"]
//! blacklist = [".git/**/*", "drafts/**/*"]
//! ```

use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the current directory
pub const CONFIG_FILE: &str = "vault2notion.toml";

/// Scan filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// File patterns to import
    ///
    /// An empty list allows every file.
    #[serde(default)]
    pub whitelist: Vec<String>,

    /// Patterns excluded even when whitelisted
    #[serde(default)]
    pub blacklist: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanConfig {
    /// Default configuration
    ///
    /// Imports `.md` files and skips vault metadata, VCS directories and
    /// temporary files.
    pub fn new() -> Self {
        Self {
            whitelist: vec!["*.md".to_string()],
            blacklist: vec![
                ".git/**/*".to_string(),
                ".obsidian/**/*".to_string(),
                ".trash/**/*".to_string(),
                "*.tmp".to_string(),
                "*.bak".to_string(),
                ".DS_Store".to_string(),
            ],
        }
    }

    /// Load configuration from a TOML file
    ///
    /// # Returns
    ///
    /// The loaded configuration, or the defaults when the file is missing or
    /// does not parse
    pub fn from_file(path: &Path) -> Self {
        if !path.exists() {
            return Self::new();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid {:?}: {}", path, e);
                Self::new()
            }),
            Err(_) => Self::new(),
        }
    }

    /// Compile the patterns into a filter
    ///
    /// Invalid patterns are skipped with a warning.
    pub fn filter(&self) -> ScanFilter {
        ScanFilter {
            whitelist: compile_all(&self.whitelist),
            blacklist: compile_all(&self.blacklist)
                .into_iter()
                // patterns with a separator match the whole path, others the file name
                .map(|p| (p.as_str().contains('/'), p))
                .collect(),
        }
    }
}

fn compile_all(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                tracing::warn!("Ignoring invalid pattern {:?}: {}", p, e);
                None
            }
        })
        .collect()
}

/// Compiled scan filter
#[derive(Debug, Clone)]
pub struct ScanFilter {
    whitelist: Vec<Pattern>,
    /// `(matches_whole_path, pattern)`
    blacklist: Vec<(bool, Pattern)>,
}

impl ScanFilter {
    /// Check whether a file should be imported
    ///
    /// `path` is relative to the scan root, so directory patterns such as
    /// `.git/**/*` apply to the vault's own layout.
    pub fn is_allowed(&self, path: &Path) -> bool {
        if self.is_blacklisted(path) {
            return false;
        }

        if self.whitelist.is_empty() {
            return true;
        }

        self.is_whitelisted(path)
    }

    /// Check whether a directory should be descended into
    pub fn is_dir_allowed(&self, path: &Path) -> bool {
        // `dir/**/*` excludes the directory itself as well
        let child = path.join("_");
        !self.is_blacklisted(&child)
    }

    pub fn is_whitelisted(&self, path: &Path) -> bool {
        let (path_str, file_name) = match_targets(path);
        self.whitelist
            .iter()
            .any(|pattern| pattern.matches(&path_str) || pattern.matches(&file_name))
    }

    pub fn is_blacklisted(&self, path: &Path) -> bool {
        let (path_str, file_name) = match_targets(path);
        self.blacklist.iter().any(|(whole_path, pattern)| {
            if *whole_path {
                pattern.matches(&path_str)
            } else {
                pattern.matches(&file_name)
            }
        })
    }
}

fn match_targets(path: &Path) -> (String, String) {
    let path_str = path.to_string_lossy().replace('\\', "/");
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (path_str, file_name)
}
