use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("markdown pattern must compile")
}

static HEADING_LINE: Lazy<Regex> = Lazy::new(|| regex(r"^#{1,6}[ \t]+\S"));
static LIST_ITEM_LINE: Lazy<Regex> = Lazy::new(|| regex(r"^(?:[*+-]|\d+\.)[ \t]+\S"));
static EXCESS_BLANK_LINES: Lazy<Regex> = Lazy::new(|| regex(r"\n{4,}"));

static HEADING_MARKER: Lazy<Regex> = Lazy::new(|| regex(r"(?m)^#{1,6}[ \t]+"));
static BULLET_MARKER: Lazy<Regex> = Lazy::new(|| regex(r"(?m)^[ \t]*[*+-][ \t]+"));
static ORDERED_MARKER: Lazy<Regex> = Lazy::new(|| regex(r"(?m)^[ \t]*\d+\.[ \t]+"));
static BOLD_STARS: Lazy<Regex> = Lazy::new(|| regex(r"\*\*(.+?)\*\*"));
static BOLD_UNDERSCORES: Lazy<Regex> = Lazy::new(|| regex(r"__(.+?)__"));
static ITALIC_STAR: Lazy<Regex> = Lazy::new(|| regex(r"\*(.+?)\*"));
static ITALIC_UNDERSCORE: Lazy<Regex> = Lazy::new(|| regex(r"_(.+?)_"));
static FENCE_OPEN: Lazy<Regex> = Lazy::new(|| regex(r"```\w*\n"));
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| regex(r"`(.+?)`"));
static LINK: Lazy<Regex> = Lazy::new(|| regex(r"\[(.+?)\]\(.+?\)"));
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| regex(r"\n{3,}"));

/// How answer text is post-processed before it is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkdownMode {
    /// Keep the markdown, repair the spacing it needs to render.
    #[default]
    Normalize,
    /// Reduce the markdown to readable plain text.
    Strip,
}

impl MarkdownMode {
    pub fn from_clean_flag(clean: bool) -> Self {
        if clean {
            MarkdownMode::Strip
        } else {
            MarkdownMode::Normalize
        }
    }

    pub fn is_strip(&self) -> bool {
        matches!(self, MarkdownMode::Strip)
    }

    pub fn process(&self, raw: &str) -> String {
        match self {
            MarkdownMode::Normalize => normalize_markdown(raw),
            MarkdownMode::Strip => strip_markdown(raw),
        }
    }
}

impl fmt::Display for MarkdownMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkdownMode::Normalize => write!(f, "normalize"),
            MarkdownMode::Strip => write!(f, "strip"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Blank,
    Text,
    /// Heading or list item.
    Block,
    FenceOpen,
    FenceClose,
    Code,
}

impl LineKind {
    fn wants_blank_before(self) -> bool {
        matches!(self, LineKind::Block | LineKind::FenceOpen)
    }

    fn wants_blank_after(self) -> bool {
        matches!(self, LineKind::Block | LineKind::FenceClose)
    }
}

/// Puts blank lines around headings, list items and fenced code blocks,
/// collapses runs of four or more newlines to two and trims the result.
/// Lines inside a fenced block are left untouched.
pub fn normalize_markdown(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut previous: Option<LineKind> = None;
    let mut in_fence = false;

    for line in text.lines() {
        let kind = if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            if in_fence {
                LineKind::FenceOpen
            } else {
                LineKind::FenceClose
            }
        } else if in_fence {
            LineKind::Code
        } else if line.trim().is_empty() {
            LineKind::Blank
        } else if HEADING_LINE.is_match(line) || LIST_ITEM_LINE.is_match(line) {
            LineKind::Block
        } else {
            LineKind::Text
        };

        if let Some(prev) = previous {
            if prev != LineKind::Blank
                && kind != LineKind::Blank
                && (prev.wants_blank_after() || kind.wants_blank_before())
            {
                out.push("");
            }
        }
        out.push(line);
        previous = Some(kind);
    }

    let joined = out.join("\n");
    EXCESS_BLANK_LINES
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}

/// Removes markdown syntax and keeps the readable text. Emphasis handling is
/// pattern based, so nested or overlapping markers come out best-effort.
pub fn strip_markdown(text: &str) -> String {
    let text = HEADING_MARKER.replace_all(text, "");
    // List markers go before emphasis so a leading `* ` is not read as italics.
    let text = BULLET_MARKER.replace_all(&text, "• ");
    let text = ORDERED_MARKER.replace_all(&text, "");
    let text = BOLD_STARS.replace_all(&text, "$1");
    let text = BOLD_UNDERSCORES.replace_all(&text, "$1");
    let text = ITALIC_STAR.replace_all(&text, "$1");
    let text = ITALIC_UNDERSCORE.replace_all(&text, "$1");
    let text = FENCE_OPEN.replace_all(&text, "");
    let text = text.replace("```", "");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");
    let text = BLANK_RUN.replace_all(&text, "\n\n");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_spaces_headings() {
        let out = normalize_markdown("Intro\n## Heading\nBody");
        assert_eq!(out, "Intro\n\n## Heading\n\nBody");
    }

    #[test]
    fn test_normalize_spaces_list_items() {
        let out = normalize_markdown("Items:\n- one\n- two\nAfter");
        assert_eq!(out, "Items:\n\n- one\n\n- two\n\nAfter");
    }

    #[test]
    fn test_normalize_spaces_code_fences_but_not_their_contents() {
        let out = normalize_markdown("Code:\n```rust\nlet x = 1;\n# not a heading\n```\nDone");
        assert_eq!(
            out,
            "Code:\n\n```rust\nlet x = 1;\n# not a heading\n```\n\nDone"
        );
    }

    #[test]
    fn test_normalize_leaves_well_formed_markdown_alone() {
        let input = "# Title\n\nParagraph one.\n\n- item\n\nClosing.";
        assert_eq!(normalize_markdown(input), input);
    }

    #[test]
    fn test_normalize_collapses_long_blank_runs() {
        assert_eq!(normalize_markdown("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(normalize_markdown("a\n\n\nb"), "a\n\n\nb");
    }

    #[test]
    fn test_normalize_trims() {
        assert_eq!(normalize_markdown("  \n\nHello\n\n"), "Hello");
    }

    #[test]
    fn test_normalize_ignores_hash_without_space() {
        let input = "Tags\n#rust is fun";
        assert_eq!(normalize_markdown(input), input);
    }

    #[test]
    fn test_strip_bold_and_links() {
        assert_eq!(
            strip_markdown("Hello **world**, see [here](http://x)."),
            "Hello world, see here."
        );
    }

    #[test]
    fn test_strip_headings_and_emphasis() {
        assert_eq!(
            strip_markdown("# Title\n\nSome *italic* and __bold__ and _soft_ text."),
            "Title\n\nSome italic and bold and soft text."
        );
    }

    #[test]
    fn test_strip_list_markers() {
        assert_eq!(
            strip_markdown("* one\n- two\n+ three"),
            "• one\n• two\n• three"
        );
        assert_eq!(strip_markdown("1. first\n2. second"), "first\nsecond");
    }

    #[test]
    fn test_strip_code() {
        assert_eq!(strip_markdown("```rust\nfn main() {}\n```"), "fn main() {}");
        assert_eq!(strip_markdown("Use `cargo build` now"), "Use cargo build now");
    }

    #[test]
    fn test_strip_collapses_blank_runs() {
        assert_eq!(strip_markdown("a\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_strip_is_idempotent_on_plain_text() {
        let plain = "Hello world, see here.\n\nSecond paragraph.";
        assert_eq!(strip_markdown(plain), plain);
        let once = strip_markdown("Hello **world**, see [here](http://x).");
        assert_eq!(strip_markdown(&once), once);
    }

    #[test]
    fn test_mode_dispatch() {
        assert_eq!(MarkdownMode::from_clean_flag(true), MarkdownMode::Strip);
        assert_eq!(MarkdownMode::from_clean_flag(false), MarkdownMode::Normalize);
        assert_eq!(MarkdownMode::Strip.process("**hi**"), "hi");
        assert_eq!(MarkdownMode::Normalize.process("**hi**"), "**hi**");
    }
}
