//! Document data model
//!
//! Typed blocks and inline spans produced by the parser and consumed by the
//! Notion renderer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Colour tag carried by text annotations and callouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    #[default]
    Default,
    Blue,
    GrayBackground,
    BlueBackground,
    GreenBackground,
    YellowBackground,
    RedBackground,
    PurpleBackground,
}

impl Color {
    /// Name used by the Notion API
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Default => "default",
            Color::Blue => "blue",
            Color::GrayBackground => "gray_background",
            Color::BlueBackground => "blue_background",
            Color::GreenBackground => "green_background",
            Color::YellowBackground => "yellow_background",
            Color::RedBackground => "red_background",
            Color::PurpleBackground => "purple_background",
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Style annotations of a text span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: Color,
}

impl Annotations {
    pub fn bold() -> Self {
        Self { bold: true, ..Self::default() }
    }

    pub fn italic() -> Self {
        Self { italic: true, ..Self::default() }
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// Inline span
///
/// A flat, non-overlapping fragment of a block's text content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Span {
    /// Plain or styled text, optionally hyperlinked
    Text {
        content: String,
        annotations: Annotations,
        link: Option<String>,
    },
    /// Internal reference, resolved against created pages at render time
    WikiLink { target: String, display: String },
    /// Inline LaTeX expression
    Equation { expression: String },
}

impl Span {
    /// Unstyled text span
    pub fn text(content: impl Into<String>) -> Self {
        Span::Text {
            content: content.into(),
            annotations: Annotations::default(),
            link: None,
        }
    }

    /// Text span with the given annotations
    pub fn styled(content: impl Into<String>, annotations: Annotations) -> Self {
        Span::Text {
            content: content.into(),
            annotations,
            link: None,
        }
    }

    /// Hyperlinked text span
    pub fn link(content: impl Into<String>, url: impl Into<String>) -> Self {
        Span::Text {
            content: content.into(),
            annotations: Annotations::default(),
            link: Some(url.into()),
        }
    }

    pub fn wiki_link(target: impl Into<String>, display: impl Into<String>) -> Self {
        Span::WikiLink {
            target: target.into(),
            display: display.into(),
        }
    }

    pub fn equation(expression: impl Into<String>) -> Self {
        Span::Equation {
            expression: expression.into(),
        }
    }

    /// Visible text of the span
    pub fn plain_text(&self) -> &str {
        match self {
            Span::Text { content, .. } => content,
            Span::WikiLink { display, .. } => display,
            Span::Equation { expression } => expression,
        }
    }
}

/// Where an image comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImageSource {
    /// `http(s)://` URL, referenced as-is
    External(String),
    /// Absolute path on the local filesystem, uploaded before rendering
    Local(PathBuf),
}

/// Structural unit of a parsed document
///
/// Only the list-item variants (bulleted, numbered, to-do) own children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    Paragraph {
        rich_text: Vec<Span>,
    },
    Heading {
        /// 1 to 3
        level: u8,
        rich_text: Vec<Span>,
    },
    BulletedListItem {
        rich_text: Vec<Span>,
        children: Vec<Block>,
    },
    NumberedListItem {
        rich_text: Vec<Span>,
        children: Vec<Block>,
    },
    ToDo {
        rich_text: Vec<Span>,
        checked: bool,
        children: Vec<Block>,
    },
    Code {
        language: String,
        text: String,
    },
    Quote {
        rich_text: Vec<Span>,
    },
    Callout {
        rich_text: Vec<Span>,
        icon: String,
        color: Color,
    },
    Equation {
        expression: String,
    },
    Divider,
    Image {
        source: ImageSource,
        caption: Vec<Span>,
    },
    Table {
        /// Header row first; every cell is its own span sequence
        rows: Vec<Vec<Vec<Span>>>,
        has_column_header: bool,
        has_row_header: bool,
    },
}

impl Block {
    pub fn paragraph(rich_text: Vec<Span>) -> Self {
        Block::Paragraph { rich_text }
    }

    /// Children of a list item; empty for every other variant
    pub fn children(&self) -> &[Block] {
        match self {
            Block::BulletedListItem { children, .. }
            | Block::NumberedListItem { children, .. }
            | Block::ToDo { children, .. } => children,
            _ => &[],
        }
    }

    /// Mutable children of a list item, `None` for non-list variants
    pub fn children_mut(&mut self) -> Option<&mut Vec<Block>> {
        match self {
            Block::BulletedListItem { children, .. }
            | Block::NumberedListItem { children, .. }
            | Block::ToDo { children, .. } => Some(children),
            _ => None,
        }
    }

    /// API type name of the block
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Paragraph { .. } => "paragraph",
            Block::Heading { level: 1, .. } => "heading_1",
            Block::Heading { level: 2, .. } => "heading_2",
            Block::Heading { .. } => "heading_3",
            Block::BulletedListItem { .. } => "bulleted_list_item",
            Block::NumberedListItem { .. } => "numbered_list_item",
            Block::ToDo { .. } => "to_do",
            Block::Code { .. } => "code",
            Block::Quote { .. } => "quote",
            Block::Callout { .. } => "callout",
            Block::Equation { .. } => "equation",
            Block::Divider => "divider",
            Block::Image { .. } => "image",
            Block::Table { .. } => "table",
        }
    }
}
