//! YAML frontmatter stripping
//!
//! Separates a leading metadata block from the document body.
//!
//! ## Frontmatter format
//!
//! ```yaml
//! ---
//! title: Ignored, page titles come from file names
//! tags: [a, b]
//! ---
//! ```
//!
//! The opening and closing delimiters must be `---` on their own lines with
//! Unix line endings. A document using `\r\n` is treated as having no
//! frontmatter at all.

use once_cell::sync::Lazy;
use regex::Regex;
use yaml_rust2::yaml::Hash;
use yaml_rust2::{Yaml, YamlLoader};

static FRONTMATTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A---\n(.*?)\n---\n").expect("frontmatter regex"));

/// Parsed frontmatter metadata
///
/// Always a mapping; null, empty or non-mapping documents become an empty one.
pub type Metadata = Hash;

/// Split a document into metadata and body
///
/// # Arguments
///
/// * `content` - raw document text
///
/// # Returns
///
/// `(metadata, body)`. Without a well-formed frontmatter block the body is the
/// full input and the metadata is empty. A block whose YAML does not parse
/// still has its body separated.
pub fn strip_frontmatter(content: &str) -> (Metadata, &str) {
    let Some(caps) = FRONTMATTER_RE.captures(content) else {
        return (Metadata::new(), content);
    };

    let whole = caps.get(0).map(|m| m.end()).unwrap_or(0);
    let yaml_str = caps.get(1).map(|m| m.as_str()).unwrap_or_default();

    (parse_metadata(yaml_str), &content[whole..])
}

fn parse_metadata(yaml_str: &str) -> Metadata {
    let docs = match YamlLoader::load_from_str(yaml_str) {
        Ok(docs) => docs,
        Err(e) => {
            tracing::debug!("Ignoring invalid frontmatter: {}", e);
            return Metadata::new();
        }
    };

    match docs.into_iter().next() {
        Some(Yaml::Hash(hash)) => hash,
        _ => Metadata::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get<'a>(meta: &'a Metadata, key: &str) -> Option<&'a Yaml> {
        meta.get(&Yaml::String(key.to_string()))
    }

    #[test]
    fn test_strip_basic() {
        let content = "---\ntitle: Free will\ntags: [philosophy, mind]\n---\n# Free will\n\nBody";
        let (meta, body) = strip_frontmatter(content);
        assert_eq!(get(&meta, "title").and_then(|y| y.as_str()), Some("Free will"));
        assert_eq!(get(&meta, "tags").and_then(|y| y.as_vec()).map(|v| v.len()), Some(2));
        assert_eq!(body, "# Free will\n\nBody");
    }

    #[test]
    fn test_no_frontmatter() {
        let content = "# Title\n\ncontent";
        let (meta, body) = strip_frontmatter(content);
        assert!(meta.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_windows_line_endings_do_not_match() {
        let content = "---\r\ntitle: x\r\n---\r\nbody";
        let (meta, body) = strip_frontmatter(content);
        assert!(meta.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_invalid_yaml_still_strips_body() {
        let content = "---\ntitle: [unclosed\n---\nbody text";
        let (meta, body) = strip_frontmatter(content);
        assert!(meta.is_empty());
        assert_eq!(body, "body text");
    }

    #[test]
    fn test_empty_block_normalises_to_empty_mapping() {
        let content = "---\n\n---\nbody";
        let (meta, body) = strip_frontmatter(content);
        assert!(meta.is_empty());
        assert_eq!(body, "body");
    }

    #[test]
    fn test_scalar_metadata_is_empty_mapping() {
        let (meta, body) = strip_frontmatter("---\njust a string\n---\nrest");
        assert!(meta.is_empty());
        assert_eq!(body, "rest");
    }

    #[test]
    fn test_closing_delimiter_needs_trailing_newline() {
        let content = "---\ntitle: x\n---";
        let (meta, body) = strip_frontmatter(content);
        assert!(meta.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_must_start_at_first_line() {
        let content = "\n---\ntitle: x\n---\nbody";
        let (meta, body) = strip_frontmatter(content);
        assert!(meta.is_empty());
        assert_eq!(body, content);
    }
}
