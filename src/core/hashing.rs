use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Lowercase hex SHA-256 of raw bytes
pub fn hash_content(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Read a file and hash its bytes
///
/// Returns the bytes too, so callers parse exactly what was hashed.
pub fn hash_file(path: &Path) -> Result<(String, Vec<u8>)> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    Ok((hash_content(&bytes), bytes))
}
