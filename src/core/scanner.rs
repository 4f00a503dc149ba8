//! Input path scanning
//!
//! Resolves the command-line input paths into the set of documents and
//! directories to mirror, all expressed relative to a single root.
//!
//! - one directory: the directory is the root and gets its own wrapper page
//! - one file: its parent is the root, no directory pages at all
//! - several paths: their common ancestor is the root, used only to make
//!   paths relative; no wrapper page is created for it

use crate::core::scan_config::{ScanConfig, ScanFilter};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// State key of the scan root directory
pub const ROOT_KEY: &str = ".";

/// Result of scanning the input paths
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Absolute root all relative paths are computed from
    pub root_dir: PathBuf,
    /// Title for the root wrapper page
    pub root_name: String,
    /// Absolute paths of the documents, in walk order
    pub documents: Vec<PathBuf>,
    /// Relative directory paths (forward slashes), root excluded
    pub directories: Vec<String>,
    /// Whether a page must be created to stand for the root directory
    pub needs_wrapper_page: bool,
    /// A single file was given; documents go directly under the destination
    pub single_file: bool,
}

impl ScanResult {
    /// Relative, forward-slash path of an absolute path under the root
    pub fn relative_path(&self, path: &Path) -> String {
        relative_to(&self.root_dir, path)
    }

    /// Directory pages are only materialised for directory imports
    pub fn is_directory_import(&self) -> bool {
        !self.single_file
    }
}

/// Relative, forward-slash path of `path` under `root`
pub fn relative_to(root: &Path, path: &Path) -> String {
    let rel = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf());
    let rel = rel.to_string_lossy().replace('\\', "/");
    if rel.is_empty() {
        ROOT_KEY.to_string()
    } else {
        rel
    }
}

/// Relative directory containing a relative document path
///
/// `"a/b/note.md"` gives `"a/b"`, `"note.md"` gives the root key.
pub fn parent_key(rel_path: &str) -> String {
    match rel_path.rsplit_once('/') {
        Some((parent, _)) if !parent.is_empty() => parent.to_string(),
        _ => ROOT_KEY.to_string(),
    }
}

/// Sort directories so every parent precedes its children
pub fn sort_parents_first(directories: &mut [String]) {
    directories.sort_by(|a, b| {
        let depth = |s: &str| s.split('/').count();
        depth(a).cmp(&depth(b)).then_with(|| a.cmp(b))
    });
}

/// Path scanner
pub struct Scanner {
    filter: ScanFilter,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            filter: config.filter(),
        }
    }

    /// Scan input paths
    ///
    /// # Arguments
    ///
    /// * `inputs` - files and/or directories given on the command line
    ///
    /// # Returns
    ///
    /// The scan result, or an error if an input does not exist
    pub fn scan(&self, inputs: &[PathBuf]) -> Result<ScanResult> {
        if inputs.is_empty() {
            anyhow::bail!("No input paths given");
        }

        let resolved = inputs
            .iter()
            .map(|p| fs::canonicalize(p).with_context(|| format!("Input path not found: {:?}", p)))
            .collect::<Result<Vec<_>>>()?;

        if let [only] = resolved.as_slice() {
            if only.is_file() {
                return Ok(self.scan_single_file(only));
            }
            return self.scan_directory_inputs(only.clone(), &resolved, true);
        }

        let root = common_ancestor(&resolved);
        self.scan_directory_inputs(root, &resolved, false)
    }

    fn scan_single_file(&self, file: &Path) -> ScanResult {
        let root_dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
        ScanResult {
            root_name: dir_name(&root_dir),
            root_dir,
            documents: vec![file.to_path_buf()],
            directories: Vec::new(),
            needs_wrapper_page: false,
            single_file: true,
        }
    }

    fn scan_directory_inputs(&self, root: PathBuf, inputs: &[PathBuf], wrapper: bool) -> Result<ScanResult> {
        let mut documents = Vec::new();
        let mut seen = BTreeSet::new();
        let mut directories = BTreeSet::new();

        for input in inputs {
            if input.is_file() {
                if seen.insert(input.clone()) {
                    documents.push(input.clone());
                }
                continue;
            }

            if input != &root {
                directories.insert(relative_to(&root, input));
            }

            let walker = WalkDir::new(input)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| {
                    if entry.depth() == 0 || !entry.file_type().is_dir() {
                        return true;
                    }
                    let hidden = entry.file_name().to_string_lossy().starts_with('.');
                    !hidden && self.filter.is_dir_allowed(Path::new(&relative_to(&root, entry.path())))
                });

            for entry in walker {
                let entry = entry.with_context(|| format!("Failed to walk {:?}", input))?;
                let path = entry.path();
                let rel = relative_to(&root, path);

                if entry.file_type().is_dir() {
                    if entry.depth() > 0 {
                        directories.insert(rel);
                    }
                    continue;
                }

                if !self.filter.is_allowed(Path::new(&rel)) {
                    continue;
                }
                if seen.insert(path.to_path_buf()) {
                    documents.push(path.to_path_buf());
                }
            }
        }

        // every ancestor of a document must have a page to hang from
        for doc in &documents {
            let mut parent = parent_key(&relative_to(&root, doc));
            while parent != ROOT_KEY {
                let next = parent_key(&parent);
                directories.insert(parent);
                parent = next;
            }
        }
        directories.remove(ROOT_KEY);

        let mut directories: Vec<String> = directories.into_iter().collect();
        sort_parents_first(&mut directories);

        Ok(ScanResult {
            root_name: dir_name(&root),
            root_dir: root,
            documents,
            directories,
            needs_wrapper_page: wrapper,
            single_file: false,
        })
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(ScanConfig::new())
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Deepest directory containing every path
fn common_ancestor(paths: &[PathBuf]) -> PathBuf {
    let dir_of = |p: &PathBuf| {
        if p.is_dir() {
            p.clone()
        } else {
            p.parent().map(Path::to_path_buf).unwrap_or_default()
        }
    };

    let mut ancestor = match paths.first() {
        Some(first) => dir_of(first),
        None => return PathBuf::new(),
    };

    for path in &paths[1..] {
        let dir = dir_of(path);
        while !dir.starts_with(&ancestor) {
            match ancestor.parent() {
                Some(parent) => ancestor = parent.to_path_buf(),
                None => break,
            }
        }
    }

    ancestor
}
