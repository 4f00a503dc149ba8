//! Footnote extraction
//!
//! Definitions (`[^id]: text` at line start) are pulled out of the body, and
//! numeric references (`[^12]`) are rewritten to superscript digits. A
//! definition never spans lines; `[^id]:` alone defines an empty note.

use once_cell::sync::Lazy;
use regex::Regex;

static DEFINITION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\[\^([^\]]+)\]:(?:[ \t]+(.*))?$").expect("footnote definition regex"));

static REFERENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\^(\d+)\]").expect("footnote reference regex"));

const SUPERSCRIPT_DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

/// A footnote definition in discovery order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footnote {
    pub id: String,
    pub text: String,
}

/// Remove footnote definitions from the body
///
/// # Returns
///
/// `(cleaned_body, footnotes)`. The body is trimmed. A repeated id keeps its
/// first position and takes the last definition's text.
pub fn extract_footnotes(body: &str) -> (String, Vec<Footnote>) {
    let mut footnotes: Vec<Footnote> = Vec::new();

    for caps in DEFINITION_RE.captures_iter(body) {
        let id = caps.get(1).map(|m| m.as_str()).unwrap_or_default().to_string();
        let text = caps
            .get(2)
            .map(|m| m.as_str().trim_end_matches('\r'))
            .unwrap_or_default()
            .to_string();

        match footnotes.iter_mut().find(|f| f.id == id) {
            Some(existing) => existing.text = text,
            None => footnotes.push(Footnote { id, text }),
        }
    }

    if footnotes.is_empty() {
        return (body.trim().to_string(), footnotes);
    }

    let cleaned = body
        .lines()
        .filter(|line| !DEFINITION_RE.is_match(line))
        .collect::<Vec<_>>()
        .join("\n");

    (cleaned.trim().to_string(), footnotes)
}

/// Render a footnote id with superscript digits
///
/// Only `0`-`9` have glyphs; other characters pass through unchanged.
pub fn to_superscript(id: &str) -> String {
    id.chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => SUPERSCRIPT_DIGITS[d as usize],
            None => c,
        })
        .collect()
}

/// Replace `[^N]` references with superscript digits
pub fn replace_references(body: &str) -> String {
    REFERENCE_RE
        .replace_all(body, |caps: &regex::Captures| {
            to_superscript(caps.get(1).map(|m| m.as_str()).unwrap_or_default())
        })
        .into_owned()
}
