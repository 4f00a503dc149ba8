//! Wiki link parsing
//!
//! Handles the two internal-reference syntaxes found in Obsidian vaults:
//!
//! ```markdown
//! [[Target]]                 # display text is the target
//! [[Target|Display text]]    # custom display text
//! [Display text](Other.md)   # relative markdown link, treated as internal
//! ```

/// Parsed `[[...]]` link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLink {
    /// Identifier of the linked document
    pub target: String,
    /// Text shown in place of the link
    pub display: String,
}

impl WikiLink {
    pub fn new(target: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            display: display.into(),
        }
    }
}

/// Parse the inner text of a `[[...]]` link
///
/// # Arguments
///
/// * `inner` - text between the brackets, e.g. `"Foo|Bar"`
///
/// # Returns
///
/// The link, or `None` when the target is blank
pub fn parse_link_str(inner: &str) -> Option<WikiLink> {
    let (target, display) = match inner.split_once('|') {
        Some((target, display)) => (target.trim(), display.trim()),
        None => (inner.trim(), inner.trim()),
    };

    if target.is_empty() {
        return None;
    }

    let display = if display.is_empty() { target } else { display };
    Some(WikiLink::new(target, display))
}

/// Whether a markdown link URL points outside the vault
///
/// Only `http://` and `https://` count; everything else (relative paths,
/// `mailto:`, protocol-relative URLs) is resolved as an internal reference.
pub fn is_external_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Percent-decode a link or image reference, keeping the raw text on failure
pub fn decode_reference(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// Normalise a link target into a lookup key
///
/// Drops any `#anchor`, leading `./`, a trailing `.md` and converts
/// backslashes to forward slashes. Case is preserved.
pub fn normalize_target(target: &str) -> String {
    let without_anchor = match target.split_once('#') {
        Some((path, _)) => path,
        None => target,
    };

    let mut key = without_anchor.trim().replace('\\', "/");
    while let Some(rest) = key.strip_prefix("./") {
        key = rest.to_string();
    }
    if let Some(stem) = key.strip_suffix(".md") {
        key = stem.to_string();
    }
    key
}

/// Last path segment of a normalised target
pub fn target_stem(normalized: &str) -> &str {
    normalized.rsplit('/').next().unwrap_or(normalized)
}
