//! Markdown parsing pipeline
//!
//! frontmatter stripping -> footnote extraction -> reference rewriting ->
//! block parsing -> footnote section

pub mod blocks;
pub mod footnote;
pub mod frontmatter;
pub mod inline;
pub mod wiki_link;

use crate::core::model::{Block, Span};
use std::path::Path;

pub use blocks::{callout_style, parse_blocks, CalloutStyle};
pub use footnote::{extract_footnotes, replace_references, to_superscript, Footnote};
pub use frontmatter::{strip_frontmatter, Metadata};
pub use inline::segment;
pub use wiki_link::WikiLink;

/// Parsed document
#[derive(Debug)]
pub struct ParsedDoc {
    /// Frontmatter, parsed and otherwise unused
    pub metadata: Metadata,
    pub blocks: Vec<Block>,
}

/// Parse a markdown document into blocks
///
/// # Arguments
///
/// * `content` - raw document text
/// * `base_dir` - directory containing the document, for local images
pub fn parse_markdown(content: &str, base_dir: &Path) -> ParsedDoc {
    let (metadata, body) = strip_frontmatter(content);
    let (body, footnotes) = extract_footnotes(body);
    let body = replace_references(&body);

    let mut blocks = parse_blocks(&body, base_dir);

    if !footnotes.is_empty() {
        blocks.push(Block::Divider);
        for note in footnotes {
            let mut rich_text = vec![Span::text(format!("{} ", to_superscript(&note.id)))];
            rich_text.extend(segment(&note.text));
            blocks.push(Block::paragraph(rich_text));
        }
    }

    ParsedDoc { metadata, blocks }
}
