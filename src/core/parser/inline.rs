//! Inline segmentation
//!
//! Turns a run of text into a flat sequence of [`Span`]s. Every recognizer is
//! tried against the remaining text; the match starting earliest wins, and
//! ties go to the recognizer listed first. Text captured by a recognizer is
//! not scanned again, so `**a _b_ c**` yields one bold span whose content
//! still contains the inner underscores.

use super::wiki_link::{decode_reference, is_external_url, parse_link_str};
use crate::core::model::{Annotations, Color, Span};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Builds a span from the captures of its recognizer
type SpanBuilder = fn(&Captures) -> Span;

struct Recognizer {
    re: Regex,
    build: SpanBuilder,
}

impl Recognizer {
    fn new(pattern: &str, build: SpanBuilder) -> Self {
        Self {
            re: Regex::new(pattern).expect("inline pattern"),
            build,
        }
    }
}

/// Recognizers in priority order
static RECOGNIZERS: Lazy<Vec<Recognizer>> = Lazy::new(|| {
    vec![
        Recognizer::new(r"\$([^$\n]+?)\$", |c| Span::equation(group(c, 1))),
        Recognizer::new(r"\[\[([^\[\]]+)\]\]", build_wiki_link),
        Recognizer::new(r"\[([^\[\]]+)\]\(([^()\s]+)\)", build_markdown_link),
        Recognizer::new(r"==([^=]+)==", |c| {
            Span::styled(
                group(c, 1),
                Annotations {
                    color: Color::YellowBackground,
                    ..Annotations::default()
                },
            )
        }),
        Recognizer::new(r"\*\*\*([^*]+)\*\*\*", build_bold_italic),
        Recognizer::new(r"___([^_]+)___", build_bold_italic),
        Recognizer::new(r"\*\*([^*]+)\*\*", |c| Span::styled(group(c, 1), Annotations::bold())),
        Recognizer::new(r"__([^_]+)__", |c| Span::styled(group(c, 1), Annotations::bold())),
        Recognizer::new(r"`([^`]+)`", |c| {
            Span::styled(
                group(c, 1),
                Annotations {
                    code: true,
                    ..Annotations::default()
                },
            )
        }),
        Recognizer::new(r"~~([^~]+)~~", |c| {
            Span::styled(
                group(c, 1),
                Annotations {
                    strikethrough: true,
                    ..Annotations::default()
                },
            )
        }),
        Recognizer::new(r"\*([^*]+)\*", |c| Span::styled(group(c, 1), Annotations::italic())),
        Recognizer::new(r"_([^_]+)_", |c| Span::styled(group(c, 1), Annotations::italic())),
    ]
});

fn group<'a>(caps: &'a Captures, i: usize) -> &'a str {
    caps.get(i).map(|m| m.as_str()).unwrap_or_default()
}

fn build_wiki_link(caps: &Captures) -> Span {
    let inner = group(caps, 1);
    match parse_link_str(inner) {
        Some(link) => Span::wiki_link(link.target, link.display),
        None => Span::text(caps.get(0).map(|m| m.as_str()).unwrap_or_default()),
    }
}

fn build_markdown_link(caps: &Captures) -> Span {
    let text = group(caps, 1);
    let url = group(caps, 2);
    if is_external_url(url) {
        Span::link(text, url)
    } else {
        Span::wiki_link(decode_reference(url), text)
    }
}

fn build_bold_italic(caps: &Captures) -> Span {
    Span::styled(
        group(caps, 1),
        Annotations {
            bold: true,
            italic: true,
            ..Annotations::default()
        },
    )
}

/// Segment text into inline spans
///
/// # Arguments
///
/// * `text` - a line or paragraph of markdown text
///
/// # Returns
///
/// Spans covering the whole input in order. Empty input gives no spans.
pub fn segment(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let mut best: Option<(usize, usize, Span)> = None;

        for recognizer in RECOGNIZERS.iter() {
            let Some(caps) = recognizer.re.captures(rest) else {
                continue;
            };
            let Some(whole) = caps.get(0) else {
                continue;
            };
            // strictly smaller start only, so earlier recognizers keep ties
            if best.as_ref().is_some_and(|(start, _, _)| whole.start() >= *start) {
                continue;
            }
            best = Some((whole.start(), whole.end(), (recognizer.build)(&caps)));
        }

        let Some((start, end, span)) = best else {
            break;
        };

        if start > 0 {
            spans.push(Span::text(&rest[..start]));
        }
        spans.push(span);
        rest = &rest[end..];
    }

    if !rest.is_empty() {
        spans.push(Span::text(rest));
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(span: &Span) -> (&str, Annotations) {
        match span {
            Span::Text {
                content,
                annotations,
                ..
            } => (content.as_str(), *annotations),
            other => panic!("expected text span, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(segment("").is_empty());
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(segment("just words"), vec![Span::text("just words")]);
    }

    #[test]
    fn test_bold() {
        let spans = segment("**bold**");
        assert_eq!(spans.len(), 1);
        let (content, ann) = text_of(&spans[0]);
        assert_eq!(content, "bold");
        assert!(ann.bold);
        assert!(!ann.italic);
    }

    #[test]
    fn test_underscore_bold_and_italic() {
        let spans = segment("__b__ and _i_");
        assert_eq!(spans.len(), 3);
        assert!(text_of(&spans[0]).1.bold);
        assert_eq!(text_of(&spans[1]).0, " and ");
        assert!(text_of(&spans[2]).1.italic);
    }

    #[test]
    fn test_bold_italic() {
        let spans = segment("***both***");
        assert_eq!(spans.len(), 1);
        let (content, ann) = text_of(&spans[0]);
        assert_eq!(content, "both");
        assert!(ann.bold && ann.italic);
    }

    #[test]
    fn test_wiki_link_with_display() {
        assert_eq!(segment("[[Foo|Bar]]"), vec![Span::wiki_link("Foo", "Bar")]);
    }

    #[test]
    fn test_wiki_link_without_display() {
        assert_eq!(segment("see [[Foo]]"), vec![Span::text("see "), Span::wiki_link("Foo", "Foo")]);
    }

    #[test]
    fn test_equation() {
        assert_eq!(segment("$x^2$"), vec![Span::equation("x^2")]);
    }

    #[test]
    fn test_external_link() {
        let spans = segment("[site](https://example.com)");
        assert_eq!(spans, vec![Span::link("site", "https://example.com")]);
    }

    #[test]
    fn test_relative_link_becomes_wiki_link() {
        let spans = segment("[other](notes/Other%20Note.md)");
        assert_eq!(spans, vec![Span::wiki_link("notes/Other Note.md", "other")]);
    }

    #[test]
    fn test_mailto_is_internal() {
        let spans = segment("[me](mailto:me@example.com)");
        assert!(matches!(spans[0], Span::WikiLink { .. }));
    }

    #[test]
    fn test_highlight() {
        let spans = segment("==marked==");
        let (content, ann) = text_of(&spans[0]);
        assert_eq!(content, "marked");
        assert_eq!(ann.color, Color::YellowBackground);
    }

    #[test]
    fn test_code_and_strikethrough() {
        let spans = segment("`x` ~~gone~~");
        assert!(text_of(&spans[0]).1.code);
        assert!(text_of(&spans[2]).1.strikethrough);
    }

    #[test]
    fn test_leftmost_match_wins() {
        let spans = segment("a *i* then **b**");
        assert_eq!(spans.len(), 4);
        assert!(text_of(&spans[1]).1.italic);
        assert!(text_of(&spans[3]).1.bold);
    }

    #[test]
    fn test_equation_wins_tie_over_emphasis() {
        // both start at offset 0; the equation recognizer is listed first
        let spans = segment("$a_1 + b_2$");
        assert_eq!(spans, vec![Span::equation("a_1 + b_2")]);
    }

    #[test]
    fn test_inner_markers_not_rescanned() {
        let spans = segment("~~*x*~~");
        assert_eq!(spans.len(), 1);
        let (content, ann) = text_of(&spans[0]);
        assert_eq!(content, "*x*");
        assert!(ann.strikethrough);
        assert!(!ann.italic);
    }

    #[test]
    fn test_unmatched_markers_stay_literal() {
        let spans = segment("2 * 3 = 6");
        assert_eq!(spans, vec![Span::text("2 * 3 = 6")]);
    }

    #[test]
    fn test_concatenation_covers_input() {
        let input = "pre **b** mid [[L|l]] $e$ post";
        let spans = segment(input);
        let rebuilt: String = spans.iter().map(|s| s.plain_text()).collect();
        assert_eq!(rebuilt, "pre b mid l e post");
    }
}
