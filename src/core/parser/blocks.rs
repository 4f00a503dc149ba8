//! Block parsing
//!
//! Line-oriented recognizer for the supported markdown subset. At each line
//! the patterns are tried in a fixed order: code fence, block equation,
//! callout, blockquote, heading, divider, image, table, list item and finally
//! paragraph. Parsing never fails; blank lines are skipped and anything
//! unrecognised becomes paragraph text.

use super::inline::segment;
use super::wiki_link::{decode_reference, is_external_url};
use crate::core::model::{Annotations, Block, Color, ImageSource, Span};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static CALLOUT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^>\s*\[!(\w+)\][+-]?\s*(.*)$").expect("callout regex"));
static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,3})\s+(.+)$").expect("heading regex"));
static DIVIDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:-{3,}|\*{3,})$").expect("divider regex"));
static IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^!\[([^\]]*)\]\(([^)]+)\)$").expect("image regex"));
static EMBED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^!\[\[([^\]]+)\]\]$").expect("embed regex"));
static TABLE_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\s|:-]*-[\s|:-]*$").expect("table separator regex"));
static TASK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)[-*+]\s+\[([ xX])\]\s+(.*)$").expect("task regex"));
static BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)[-*+]\s+(.*)$").expect("bullet regex"));
static NUMBERED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)\d+[.)]\s+(.*)$").expect("numbered regex"));

/// Icon and background colour of a callout type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalloutStyle {
    pub icon: &'static str,
    pub color: Color,
}

const NOTE_STYLE: CalloutStyle = CalloutStyle {
    icon: "📝",
    color: Color::BlueBackground,
};

/// Look up a callout type (case-insensitive); unknown types use `note`
pub fn callout_style(kind: &str) -> CalloutStyle {
    let (icon, color) = match kind.to_lowercase().as_str() {
        "tip" => ("💡", Color::GreenBackground),
        "note" => return NOTE_STYLE,
        "info" => ("ℹ️", Color::BlueBackground),
        "warning" => ("⚠️", Color::YellowBackground),
        "danger" => ("🚨", Color::RedBackground),
        "example" => ("📋", Color::PurpleBackground),
        "quote" => ("💬", Color::GrayBackground),
        "recommended" => ("⭐", Color::GreenBackground),
        "abstract" => ("📄", Color::GrayBackground),
        "success" => ("✅", Color::GreenBackground),
        "question" => ("❓", Color::YellowBackground),
        "failure" => ("❌", Color::RedBackground),
        "bug" => ("🐛", Color::RedBackground),
        _ => return NOTE_STYLE,
    };
    CalloutStyle { icon, color }
}

/// Kind of list item a line opens
#[derive(Debug, Clone, PartialEq)]
enum ListMarker {
    Task(bool),
    Bulleted,
    Numbered,
}

#[derive(Debug)]
struct ListLine {
    depth: usize,
    marker: ListMarker,
    text: String,
}

fn parse_list_line(line: &str) -> Option<ListLine> {
    let (indent, marker, text) = if let Some(caps) = TASK_RE.captures(line) {
        let checked = caps[2].eq_ignore_ascii_case("x");
        (caps[1].chars().count(), ListMarker::Task(checked), caps[3].to_string())
    } else if let Some(caps) = BULLET_RE.captures(line) {
        (caps[1].chars().count(), ListMarker::Bulleted, caps[2].to_string())
    } else if let Some(caps) = NUMBERED_RE.captures(line) {
        (caps[1].chars().count(), ListMarker::Numbered, caps[2].to_string())
    } else {
        return None;
    };

    Some(ListLine {
        depth: indent / 2,
        marker,
        text,
    })
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

fn is_equation_start(line: &str) -> bool {
    let t = line.trim();
    t == "$$" || (t.len() >= 4 && t.starts_with("$$") && t.ends_with("$$"))
}

fn is_blockquote(line: &str) -> bool {
    line.trim_start().starts_with('>')
}

fn is_callout(line: &str) -> bool {
    CALLOUT_RE.is_match(line.trim_start())
}

fn is_heading(line: &str) -> bool {
    HEADING_RE.is_match(line.trim_start())
}

fn is_divider(line: &str) -> bool {
    DIVIDER_RE.is_match(line.trim())
}

fn is_image(line: &str) -> bool {
    let t = line.trim();
    IMAGE_RE.is_match(t) || EMBED_RE.is_match(t)
}

fn is_table_separator(line: &str) -> bool {
    TABLE_SEPARATOR_RE.is_match(line)
}

fn is_table_start(lines: &[&str], i: usize) -> bool {
    lines[i].contains('|') && lines.get(i + 1).is_some_and(|next| is_table_separator(next))
}

/// Whether line `i` would be claimed by a pattern ahead of paragraphs
fn starts_block(lines: &[&str], i: usize) -> bool {
    let line = lines[i];
    is_fence(line)
        || is_equation_start(line)
        || is_blockquote(line)
        || is_heading(line)
        || is_divider(line)
        || is_image(line)
        || is_table_start(lines, i)
        || parse_list_line(line).is_some()
}

fn strip_quote_marker(line: &str) -> &str {
    let t = line.trim_start();
    let t = t.strip_prefix('>').unwrap_or(t);
    t.strip_prefix(' ').unwrap_or(t)
}

/// Line-by-line block parser
///
/// `base_dir` is the directory of the document being parsed; relative image
/// references are resolved against it.
pub struct BlockParser<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    base_dir: &'a Path,
}

impl<'a> BlockParser<'a> {
    pub fn new(body: &'a str, base_dir: &'a Path) -> Self {
        Self {
            lines: body.lines().collect(),
            pos: 0,
            base_dir,
        }
    }

    /// Consume the whole body
    pub fn parse(mut self) -> Vec<Block> {
        let mut blocks = Vec::new();

        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];

            if line.trim().is_empty() {
                self.pos += 1;
                continue;
            }

            if is_fence(line) {
                blocks.push(self.parse_code());
            } else if is_equation_start(line) {
                blocks.push(self.parse_equation());
            } else if is_callout(line) {
                blocks.push(self.parse_callout());
            } else if is_blockquote(line) {
                blocks.push(self.parse_quote());
            } else if is_heading(line) {
                blocks.push(self.parse_heading());
            } else if is_divider(line) {
                self.pos += 1;
                blocks.push(Block::Divider);
            } else if is_image(line) {
                blocks.push(self.parse_image());
            } else if is_table_start(&self.lines, self.pos) {
                blocks.push(self.parse_table());
            } else if parse_list_line(line).is_some() {
                blocks.extend(self.parse_list());
            } else if let Some(paragraph) = self.parse_paragraph() {
                blocks.push(paragraph);
            }
        }

        blocks
    }

    fn parse_code(&mut self) -> Block {
        let opening = self.lines[self.pos].trim_start();
        let language = opening.trim_start_matches('`').trim();
        let language = if language.is_empty() {
            "plain text".to_string()
        } else {
            language.to_string()
        };
        self.pos += 1;

        let mut content = Vec::new();
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];
            self.pos += 1;
            if line.trim_start().starts_with("```") {
                break;
            }
            content.push(line);
        }

        Block::Code {
            language,
            text: content.join("\n"),
        }
    }

    fn parse_equation(&mut self) -> Block {
        let opening = self.lines[self.pos].trim();
        self.pos += 1;

        if opening != "$$" {
            let expression = opening[2..opening.len() - 2].trim().to_string();
            return Block::Equation { expression };
        }

        let mut content = Vec::new();
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];
            self.pos += 1;
            if line.trim() == "$$" {
                break;
            }
            content.push(line);
        }

        Block::Equation {
            expression: content.join("\n").trim().to_string(),
        }
    }

    fn parse_callout(&mut self) -> Block {
        let first = self.lines[self.pos].trim_start();
        self.pos += 1;

        let (kind, title) = match CALLOUT_RE.captures(first) {
            Some(caps) => (caps[1].to_string(), caps[2].trim().to_string()),
            None => ("note".to_string(), String::new()),
        };
        let style = callout_style(&kind);

        let mut body = Vec::new();
        while self.pos < self.lines.len() && is_blockquote(self.lines[self.pos]) {
            body.push(strip_quote_marker(self.lines[self.pos]));
            self.pos += 1;
        }
        let body = body.join("\n");

        let mut rich_text = Vec::new();
        if !title.is_empty() {
            rich_text.push(Span::styled(title, Annotations::bold()));
            rich_text.push(Span::text("\n"));
        }
        rich_text.extend(segment(body.trim()));

        Block::Callout {
            rich_text,
            icon: style.icon.to_string(),
            color: style.color,
        }
    }

    fn parse_quote(&mut self) -> Block {
        let mut content = Vec::new();
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];
            if !is_blockquote(line) || is_callout(line) {
                break;
            }
            content.push(strip_quote_marker(line));
            self.pos += 1;
        }

        Block::Quote {
            rich_text: segment(&content.join("\n")),
        }
    }

    fn parse_heading(&mut self) -> Block {
        let line = self.lines[self.pos].trim_start();
        self.pos += 1;

        match HEADING_RE.captures(line) {
            Some(caps) => Block::Heading {
                level: caps[1].len() as u8,
                rich_text: segment(caps[2].trim()),
            },
            None => Block::paragraph(segment(line)),
        }
    }

    fn parse_image(&mut self) -> Block {
        let line = self.lines[self.pos].trim();
        self.pos += 1;

        if let Some(caps) = IMAGE_RE.captures(line) {
            return Block::Image {
                source: self.image_source(&caps[2]),
                caption: segment(&caps[1]),
            };
        }

        let target = EMBED_RE
            .captures(line)
            .map(|caps| caps[1].to_string())
            .unwrap_or_default();
        // `![[img.png|300]]` carries a display size after the pipe
        let target = target.split('|').next().unwrap_or_default().trim().to_string();

        Block::Image {
            source: self.image_source(&target),
            caption: Vec::new(),
        }
    }

    fn image_source(&self, reference: &str) -> ImageSource {
        let reference = reference.trim();
        if is_external_url(reference) {
            return ImageSource::External(reference.to_string());
        }

        let decoded = decode_reference(reference);
        let path = Path::new(&decoded);
        if path.is_absolute() {
            ImageSource::Local(path.to_path_buf())
        } else {
            ImageSource::Local(self.base_dir.join(path))
        }
    }

    fn parse_table(&mut self) -> Block {
        let mut rows = vec![split_row(self.lines[self.pos])];
        // header row, then the separator which is not a row
        self.pos += 2;

        while self.pos < self.lines.len() && self.lines[self.pos].contains('|') {
            rows.push(split_row(self.lines[self.pos]));
            self.pos += 1;
        }

        Block::Table {
            rows,
            has_column_header: true,
            has_row_header: false,
        }
    }

    fn parse_list(&mut self) -> Vec<Block> {
        let mut arena: Vec<ListNode> = Vec::new();
        let mut roots: Vec<usize> = Vec::new();
        // (depth, arena index) of items that can still take children
        let mut stack: Vec<(usize, usize)> = Vec::new();

        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];

            if line.trim().is_empty() {
                // a blank line only continues the list if another item follows
                let next = self.lines[self.pos..]
                    .iter()
                    .position(|l| !l.trim().is_empty())
                    .map(|offset| self.pos + offset);
                match next {
                    Some(n) if parse_list_line(self.lines[n]).is_some() => {
                        self.pos = n;
                        continue;
                    }
                    _ => break,
                }
            }

            let Some(item) = parse_list_line(line) else {
                break;
            };
            self.pos += 1;

            let index = arena.len();
            arena.push(ListNode {
                block: item_block(&item),
                children: Vec::new(),
            });

            while stack.last().is_some_and(|(depth, _)| *depth >= item.depth) {
                stack.pop();
            }
            match stack.last() {
                Some((_, parent)) => arena[*parent].children.push(index),
                None => roots.push(index),
            }
            stack.push((item.depth, index));
        }

        let mut slots: Vec<Option<ListNode>> = arena.into_iter().map(Some).collect();
        roots
            .into_iter()
            .filter_map(|index| assemble(&mut slots, index))
            .collect()
    }

    fn parse_paragraph(&mut self) -> Option<Block> {
        let mut content = vec![self.lines[self.pos]];
        self.pos += 1;

        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];
            if line.trim().is_empty() || starts_block(&self.lines, self.pos) {
                break;
            }
            content.push(line);
            self.pos += 1;
        }

        let text = content.join("\n");
        if text.trim().is_empty() {
            return None;
        }
        Some(Block::paragraph(segment(text.trim())))
    }
}

struct ListNode {
    block: Block,
    children: Vec<usize>,
}

fn item_block(item: &ListLine) -> Block {
    let rich_text = segment(item.text.trim());
    match item.marker {
        ListMarker::Task(checked) => Block::ToDo {
            rich_text,
            checked,
            children: Vec::new(),
        },
        ListMarker::Bulleted => Block::BulletedListItem {
            rich_text,
            children: Vec::new(),
        },
        ListMarker::Numbered => Block::NumberedListItem {
            rich_text,
            children: Vec::new(),
        },
    }
}

fn assemble(slots: &mut [Option<ListNode>], index: usize) -> Option<Block> {
    let node = slots.get_mut(index)?.take()?;
    let children: Vec<Block> = node
        .children
        .iter()
        .filter_map(|child| assemble(slots, *child))
        .collect();

    let mut block = node.block;
    if let Some(slot) = block.children_mut() {
        *slot = children;
    }
    Some(block)
}

fn split_row(line: &str) -> Vec<Vec<Span>> {
    let trimmed = line.trim();
    let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('|').unwrap_or(trimmed);
    trimmed.split('|').map(|cell| segment(cell.trim())).collect()
}

/// Parse a body into blocks
pub fn parse_blocks(body: &str, base_dir: &Path) -> Vec<Block> {
    BlockParser::new(body, base_dir).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(body: &str) -> Vec<Block> {
        parse_blocks(body, Path::new("/vault/notes"))
    }

    fn rich_text(block: &Block) -> String {
        let spans = match block {
            Block::Paragraph { rich_text }
            | Block::Heading { rich_text, .. }
            | Block::Quote { rich_text }
            | Block::Callout { rich_text, .. }
            | Block::BulletedListItem { rich_text, .. }
            | Block::NumberedListItem { rich_text, .. }
            | Block::ToDo { rich_text, .. } => rich_text,
            other => panic!("no rich text on {:?}", other),
        };
        spans.iter().map(|s| s.plain_text()).collect()
    }

    #[test]
    fn test_code_fence() {
        let blocks = parse("```py\ncode\n```");
        assert_eq!(
            blocks,
            vec![Block::Code {
                language: "py".into(),
                text: "code".into()
            }]
        );
    }

    #[test]
    fn test_code_fence_default_language_and_verbatim_content() {
        let blocks = parse("```\n**not bold**\n\n  indented\n```");
        assert_eq!(
            blocks,
            vec![Block::Code {
                language: "plain text".into(),
                text: "**not bold**\n\n  indented".into()
            }]
        );
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let blocks = parse("```rust\nfn main() {}");
        assert_eq!(blocks.len(), 1);
        assert!(matches!(&blocks[0], Block::Code { text, .. } if text == "fn main() {}"));
    }

    #[test]
    fn test_single_line_equation() {
        assert_eq!(parse("$$ E = mc^2 $$"), vec![Block::Equation { expression: "E = mc^2".into() }]);
    }

    #[test]
    fn test_multi_line_equation() {
        let blocks = parse("$$\na + b\n= c\n$$\nafter");
        assert_eq!(blocks[0], Block::Equation { expression: "a + b\n= c".into() });
        assert_eq!(rich_text(&blocks[1]), "after");
    }

    #[test]
    fn test_callout_with_title() {
        let blocks = parse("> [!warning] Careful\n> body **text**\n> more");
        match &blocks[0] {
            Block::Callout { rich_text, icon, color } => {
                assert_eq!(icon, "⚠️");
                assert_eq!(*color, Color::YellowBackground);
                assert_eq!(rich_text[0], Span::styled("Careful", Annotations::bold()));
                assert_eq!(rich_text[1], Span::text("\n"));
                assert_eq!(rich_text[2], Span::text("body "));
                assert_eq!(rich_text[3], Span::styled("text", Annotations::bold()));
                assert_eq!(rich_text[4], Span::text("\nmore"));
            }
            other => panic!("expected callout, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_callout_falls_back_to_note() {
        let blocks = parse("> [!custom]\n> hello");
        match &blocks[0] {
            Block::Callout { rich_text, icon, color } => {
                assert_eq!(icon, NOTE_STYLE.icon);
                assert_eq!(*color, NOTE_STYLE.color);
                assert_eq!(rich_text, &vec![Span::text("hello")]);
            }
            other => panic!("expected callout, got {:?}", other),
        }
    }

    #[test]
    fn test_callout_type_is_case_insensitive() {
        assert_eq!(callout_style("TIP").icon, "💡");
    }

    #[test]
    fn test_blockquote() {
        let blocks = parse("> line one\n> line two\n\nafter");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[0], Block::Quote { .. }));
        assert_eq!(rich_text(&blocks[0]), "line one\nline two");
    }

    #[test]
    fn test_blockquote_stops_at_callout() {
        let blocks = parse("> quote\n> [!tip] Hint\n> body");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[0], Block::Quote { .. }));
        assert!(matches!(blocks[1], Block::Callout { .. }));
    }

    #[test]
    fn test_headings() {
        let blocks = parse("# One\n## Two\n### Three\n#### Four");
        assert!(matches!(blocks[0], Block::Heading { level: 1, .. }));
        assert!(matches!(blocks[1], Block::Heading { level: 2, .. }));
        assert!(matches!(blocks[2], Block::Heading { level: 3, .. }));
        assert!(matches!(blocks[3], Block::Paragraph { .. }));
        assert_eq!(rich_text(&blocks[3]), "#### Four");
    }

    #[test]
    fn test_dividers() {
        assert_eq!(parse("---\n***"), vec![Block::Divider, Block::Divider]);
    }

    #[test]
    fn test_external_image_with_caption() {
        let blocks = parse("![A cat](https://example.com/cat.png)");
        assert_eq!(
            blocks,
            vec![Block::Image {
                source: ImageSource::External("https://example.com/cat.png".into()),
                caption: vec![Span::text("A cat")],
            }]
        );
    }

    #[test]
    fn test_local_image_is_decoded_and_resolved() {
        let blocks = parse("![](img/My%20Pic.png)");
        match &blocks[0] {
            Block::Image { source, caption } => {
                assert_eq!(source, &ImageSource::Local(PathBuf::from("/vault/notes/img/My Pic.png")));
                assert!(caption.is_empty());
            }
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_embed_image() {
        let blocks = parse("![[diagram.png|300]]");
        assert_eq!(
            blocks,
            vec![Block::Image {
                source: ImageSource::Local(PathBuf::from("/vault/notes/diagram.png")),
                caption: vec![],
            }]
        );
    }

    #[test]
    fn test_table_shape() {
        let blocks = parse("| a | b |\n|---|:--:|\n| 1 | **2** |\n| 3 | 4 |");
        assert_eq!(blocks.len(), 1);
        match &blocks[0] {
            Block::Table {
                rows,
                has_column_header,
                has_row_header,
            } => {
                assert_eq!(rows.len(), 3);
                assert!(*has_column_header);
                assert!(!*has_row_header);
                assert_eq!(rows[0][0], vec![Span::text("a")]);
                assert_eq!(rows[1][1], vec![Span::styled("2", Annotations::bold())]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_pipe_line_without_separator_is_paragraph() {
        let blocks = parse("a | b\nc | d");
        assert_eq!(blocks.len(), 1);
        assert!(matches!(blocks[0], Block::Paragraph { .. }));
    }

    #[test]
    fn test_nested_lists() {
        let blocks = parse("- a\n  - b\n    - c\n  - d\n- e");
        assert_eq!(blocks.len(), 2);
        let a = &blocks[0];
        assert_eq!(rich_text(a), "a");
        assert_eq!(a.children().len(), 2);
        assert_eq!(rich_text(&a.children()[0]), "b");
        assert_eq!(rich_text(&a.children()[0].children()[0]), "c");
        assert_eq!(rich_text(&a.children()[1]), "d");
        assert!(blocks[1].children().is_empty());
    }

    #[test]
    fn test_task_items() {
        let blocks = parse("- [ ] open\n- [X] done\n* plain");
        assert!(matches!(&blocks[0], Block::ToDo { checked: false, .. }));
        assert!(matches!(&blocks[1], Block::ToDo { checked: true, .. }));
        assert!(matches!(&blocks[2], Block::BulletedListItem { .. }));
        assert_eq!(rich_text(&blocks[1]), "done");
    }

    #[test]
    fn test_numbered_items_under_bullet() {
        let blocks = parse("- parent\n  1. first\n  2) second");
        assert_eq!(blocks.len(), 1);
        let children = blocks[0].children();
        assert_eq!(children.len(), 2);
        assert!(matches!(children[0], Block::NumberedListItem { .. }));
        assert!(matches!(children[1], Block::NumberedListItem { .. }));
    }

    #[test]
    fn test_list_continues_across_blank_line() {
        let blocks = parse("- a\n\n  - b\n\nafter");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].children().len(), 1);
        assert!(matches!(blocks[1], Block::Paragraph { .. }));
    }

    #[test]
    fn test_paragraph_joins_lines_until_block() {
        let blocks = parse("first line\nsecond line\n# Heading\nthird");
        assert_eq!(blocks.len(), 3);
        assert_eq!(rich_text(&blocks[0]), "first line\nsecond line");
        assert!(matches!(blocks[1], Block::Heading { .. }));
    }

    #[test]
    fn test_paragraph_interrupted_by_table() {
        let blocks = parse("intro\n| h |\n| - |\n| v |");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[1], Block::Table { .. }));
    }

    #[test]
    fn test_whitespace_only_body() {
        assert!(parse("  \n\t\n   ").is_empty());
        assert!(parse("").is_empty());
    }
}
