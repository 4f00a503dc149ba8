//! Block rendering
//!
//! Converts parsed [`Block`]s into Notion API block objects. Rendering is
//! pure once local images have been uploaded: [`upload_images`] runs first
//! and its result is handed to the [`Renderer`].

use crate::core::links::LinkResolver;
use crate::core::model::{Annotations, Block, Color, ImageSource, Span};
use crate::notion::FileUploader;
use anyhow::Result;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Maximum characters in one rich-text object
pub const MAX_TEXT_LENGTH: usize = 2000;

/// Upload id per local image path; `None` when the file does not exist
pub type ImageUploads = HashMap<PathBuf, Option<String>>;

/// Languages accepted by the code block API
const LANGUAGES: &[&str] = &[
    "abap", "arduino", "bash", "basic", "c", "clojure", "coffeescript", "c++", "c#", "css",
    "dart", "diff", "docker", "elixir", "elm", "erlang", "flow", "fortran", "f#", "gherkin",
    "glsl", "go", "graphql", "groovy", "haskell", "html", "java", "javascript", "json", "julia",
    "kotlin", "latex", "less", "lisp", "livescript", "lua", "makefile", "markdown", "markup",
    "matlab", "mermaid", "nix", "objective-c", "ocaml", "pascal", "perl", "php", "plain text",
    "powershell", "prolog", "protobuf", "python", "r", "reason", "ruby", "rust", "sass",
    "scala", "scheme", "scss", "shell", "sql", "swift", "typescript", "vb.net", "verilog",
    "vhdl", "visual basic", "webassembly", "xml", "yaml",
];

/// Map a fence language tag to an API language name
///
/// Common aliases are translated; anything unknown becomes `plain text`.
pub fn code_language(tag: &str) -> &'static str {
    let tag = tag.trim().to_lowercase();
    let alias = match tag.as_str() {
        "" | "text" | "txt" | "plain" | "plaintext" => "plain text",
        "js" | "jsx" | "mjs" | "node" => "javascript",
        "ts" | "tsx" => "typescript",
        "py" | "python3" => "python",
        "rs" => "rust",
        "rb" => "ruby",
        "sh" | "zsh" | "console" => "shell",
        "ps1" | "pwsh" => "powershell",
        "yml" => "yaml",
        "md" => "markdown",
        "cpp" | "cc" | "cxx" | "hpp" => "c++",
        "cs" | "csharp" => "c#",
        "fs" | "fsharp" => "f#",
        "objc" => "objective-c",
        "kt" | "kts" => "kotlin",
        "golang" => "go",
        "tex" => "latex",
        "dockerfile" => "docker",
        "make" => "makefile",
        "hs" => "haskell",
        "ex" | "exs" => "elixir",
        "erl" => "erlang",
        "clj" => "clojure",
        "proto" => "protobuf",
        "wasm" => "webassembly",
        "vb" => "visual basic",
        "htm" | "xhtml" => "html",
        other => other,
    };
    LANGUAGES
        .iter()
        .copied()
        .find(|l| *l == alias)
        .unwrap_or("plain text")
}

/// Public URL of a page
pub fn page_url(page_id: &str) -> String {
    format!("https://www.notion.so/{}", page_id.replace('-', ""))
}

/// Placeholder paragraph for an image file that does not exist
pub fn missing_image_block(path: &Path) -> Block {
    Block::paragraph(vec![Span::text(format!("[Missing image: {}]", path.display()))])
}

fn collect_local_images<'a>(blocks: &'a [Block], out: &mut Vec<&'a Path>) {
    for block in blocks {
        if let Block::Image {
            source: ImageSource::Local(path),
            ..
        } = block
        {
            out.push(path);
        }
        collect_local_images(block.children(), out);
    }
}

/// Upload every local image referenced by `blocks`
///
/// Each distinct path is uploaded once. Missing files are recorded as
/// `None` and rendered as a placeholder instead of failing the document.
pub async fn upload_images(blocks: &[Block], uploader: &dyn FileUploader) -> Result<ImageUploads> {
    let mut paths = Vec::new();
    collect_local_images(blocks, &mut paths);

    let mut uploads = ImageUploads::new();
    for path in paths {
        if uploads.contains_key(path) {
            continue;
        }
        let id = if path.is_file() {
            debug!("Uploading image {:?}", path);
            Some(uploader.upload(path).await?)
        } else {
            warn!("Image not found: {:?}", path);
            None
        };
        uploads.insert(path.to_path_buf(), id);
    }
    Ok(uploads)
}

/// Renders blocks against a set of uploaded images and known pages
pub struct Renderer<'a> {
    images: &'a ImageUploads,
    links: &'a dyn LinkResolver,
}

impl<'a> Renderer<'a> {
    pub fn new(images: &'a ImageUploads, links: &'a dyn LinkResolver) -> Self {
        Self { images, links }
    }

    pub fn render(&self, blocks: &[Block]) -> Vec<Value> {
        blocks.iter().map(|b| self.render_block(b)).collect()
    }

    fn render_block(&self, block: &Block) -> Value {
        let body = match block {
            Block::Paragraph { rich_text }
            | Block::Heading { rich_text, .. }
            | Block::Quote { rich_text } => json!({ "rich_text": self.rich_text(rich_text) }),
            Block::BulletedListItem { rich_text, children }
            | Block::NumberedListItem { rich_text, children } => {
                self.with_children(json!({ "rich_text": self.rich_text(rich_text) }), children)
            }
            Block::ToDo {
                rich_text,
                checked,
                children,
            } => self.with_children(
                json!({ "rich_text": self.rich_text(rich_text), "checked": checked }),
                children,
            ),
            Block::Code { language, text } => json!({
                "rich_text": text_objects(text, Annotations::default(), None),
                "language": code_language(language),
            }),
            Block::Callout {
                rich_text,
                icon,
                color,
            } => json!({
                "rich_text": self.rich_text(rich_text),
                "icon": { "type": "emoji", "emoji": icon },
                "color": color.as_str(),
            }),
            Block::Equation { expression } => json!({ "expression": expression }),
            Block::Divider => json!({}),
            Block::Image {
                source: ImageSource::Local(path),
                ..
            } if self.upload_id(path).is_none() => {
                return self.render_block(&missing_image_block(path));
            }
            Block::Image { source, caption } => self.image_body(source, caption),
            Block::Table {
                rows,
                has_column_header,
                has_row_header,
            } => self.table_body(rows, *has_column_header, *has_row_header),
        };

        let kind = block.kind();
        let mut object = Map::new();
        object.insert("object".into(), json!("block"));
        object.insert("type".into(), json!(kind));
        object.insert(kind.into(), body);
        Value::Object(object)
    }

    fn with_children(&self, mut body: Value, children: &[Block]) -> Value {
        if !children.is_empty() {
            body["children"] = Value::Array(self.render(children));
        }
        body
    }

    fn upload_id(&self, path: &Path) -> Option<&str> {
        self.images.get(path).and_then(|id| id.as_deref())
    }

    fn image_body(&self, source: &ImageSource, caption: &[Span]) -> Value {
        let caption = self.rich_text(caption);
        match source {
            ImageSource::External(url) => json!({
                "type": "external",
                "external": { "url": url },
                "caption": caption,
            }),
            ImageSource::Local(path) => json!({
                "type": "file_upload",
                "file_upload": { "id": self.upload_id(path) },
                "caption": caption,
            }),
        }
    }

    fn table_body(&self, rows: &[Vec<Vec<Span>>], has_column_header: bool, has_row_header: bool) -> Value {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let children: Vec<Value> = rows
            .iter()
            .map(|row| {
                let mut cells: Vec<Value> = row.iter().map(|cell| Value::Array(self.rich_text(cell))).collect();
                cells.resize(width, Value::Array(Vec::new()));
                json!({
                    "object": "block",
                    "type": "table_row",
                    "table_row": { "cells": cells },
                })
            })
            .collect();

        json!({
            "table_width": width,
            "has_column_header": has_column_header,
            "has_row_header": has_row_header,
            "children": children,
        })
    }

    /// Rich-text objects for a span sequence
    pub fn rich_text(&self, spans: &[Span]) -> Vec<Value> {
        let mut out = Vec::new();
        for span in spans {
            match span {
                Span::Text {
                    content,
                    annotations,
                    link,
                } => out.extend(text_objects(content, *annotations, link.as_deref())),
                Span::WikiLink { target, display } => match self.links.resolve(target) {
                    Some(page_id) => out.extend(text_objects(display, Annotations::default(), Some(&page_url(&page_id)))),
                    None => {
                        let unresolved = Annotations {
                            bold: true,
                            color: Color::Blue,
                            ..Annotations::default()
                        };
                        out.extend(text_objects(display, unresolved, None));
                    }
                },
                Span::Equation { expression } => out.push(json!({
                    "type": "equation",
                    "equation": { "expression": expression },
                })),
            }
        }
        out
    }
}

/// Text objects for one string, split at [`MAX_TEXT_LENGTH`] characters
fn text_objects(content: &str, annotations: Annotations, link: Option<&str>) -> Vec<Value> {
    split_text(content)
        .into_iter()
        .map(|chunk| {
            let mut text = Map::new();
            text.insert("content".into(), Value::String(chunk));
            if let Some(url) = link {
                text.insert("link".into(), json!({ "url": url }));
            }
            json!({
                "type": "text",
                "text": text,
                "annotations": {
                    "bold": annotations.bold,
                    "italic": annotations.italic,
                    "strikethrough": annotations.strikethrough,
                    "underline": annotations.underline,
                    "code": annotations.code,
                    "color": annotations.color.as_str(),
                },
            })
        })
        .collect()
}

fn split_text(content: &str) -> Vec<String> {
    if content.chars().count() <= MAX_TEXT_LENGTH {
        return vec![content.to_string()];
    }
    let chars: Vec<char> = content.chars().collect();
    chars
        .chunks(MAX_TEXT_LENGTH)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::links::LinkIndex;

    fn render_one(block: Block) -> Value {
        let images = ImageUploads::new();
        let links = LinkIndex::new();
        Renderer::new(&images, &links).render(&[block]).remove(0)
    }

    #[test]
    fn test_paragraph_shape() {
        let v = render_one(Block::paragraph(vec![Span::text("hi")]));
        assert_eq!(v["type"], "paragraph");
        assert_eq!(v["paragraph"]["rich_text"][0]["text"]["content"], "hi");
        assert_eq!(v["paragraph"]["rich_text"][0]["annotations"]["color"], "default");
    }

    #[test]
    fn test_long_text_is_split() {
        let long = "x".repeat(4500);
        let v = render_one(Block::paragraph(vec![Span::text(long)]));
        let parts = v["paragraph"]["rich_text"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["text"]["content"].as_str().unwrap().len(), 2000);
        assert_eq!(parts[2]["text"]["content"].as_str().unwrap().len(), 500);
    }

    #[test]
    fn test_code_language_aliases() {
        assert_eq!(code_language("js"), "javascript");
        assert_eq!(code_language("Rust"), "rust");
        assert_eq!(code_language("sh"), "shell");
        assert_eq!(code_language("plain text"), "plain text");
        assert_eq!(code_language("brainfuck"), "plain text");
    }

    #[test]
    fn test_wiki_link_resolution() {
        let images = ImageUploads::new();
        let mut links = LinkIndex::new();
        links.register("Target.md", "1234-abcd");
        let renderer = Renderer::new(&images, &links);

        let resolved = renderer.rich_text(&[Span::wiki_link("Target", "shown")]);
        assert_eq!(resolved[0]["text"]["content"], "shown");
        assert_eq!(resolved[0]["text"]["link"]["url"], "https://www.notion.so/1234abcd");

        let unresolved = renderer.rich_text(&[Span::wiki_link("Nowhere", "Nowhere")]);
        assert!(unresolved[0]["text"].get("link").is_none());
        assert_eq!(unresolved[0]["annotations"]["bold"], true);
        assert_eq!(unresolved[0]["annotations"]["color"], "blue");
    }

    #[test]
    fn test_table_rows_padded() {
        let v = render_one(Block::Table {
            rows: vec![
                vec![vec![Span::text("a")], vec![Span::text("b")]],
                vec![vec![Span::text("1")]],
            ],
            has_column_header: true,
            has_row_header: false,
        });
        assert_eq!(v["table"]["table_width"], 2);
        let rows = v["table"]["children"].as_array().unwrap();
        assert_eq!(rows[1]["table_row"]["cells"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_local_image_renders_placeholder() {
        let v = render_one(Block::Image {
            source: ImageSource::Local(PathBuf::from("/vault/gone.png")),
            caption: vec![],
        });
        assert_eq!(v["type"], "paragraph");
        assert_eq!(
            v["paragraph"]["rich_text"][0]["text"]["content"],
            "[Missing image: /vault/gone.png]"
        );
    }

    #[test]
    fn test_list_children_nested() {
        let v = render_one(Block::BulletedListItem {
            rich_text: vec![Span::text("parent")],
            children: vec![Block::ToDo {
                rich_text: vec![Span::text("child")],
                checked: true,
                children: vec![],
            }],
        });
        let child = &v["bulleted_list_item"]["children"][0];
        assert_eq!(child["type"], "to_do");
        assert_eq!(child["to_do"]["checked"], true);
        assert!(child["to_do"].get("children").is_none());
    }

    #[test]
    fn test_callout_icon_and_color() {
        let v = render_one(Block::Callout {
            rich_text: vec![Span::text("body")],
            icon: "💡".to_string(),
            color: Color::GreenBackground,
        });
        assert_eq!(v["callout"]["icon"]["emoji"], "💡");
        assert_eq!(v["callout"]["color"], "green_background");
    }
}
