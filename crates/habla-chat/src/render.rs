//! Markdown to display markup.
//!
//! Rendering is pure and total: any input, including markup cut off in the
//! middle of a stream, produces output.

use habla_core::types::{Citation, CitationKind};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Heading of the sources block appended to grounded replies.
pub const SOURCES_HEADING: &str = "🔍 Fuentes y Enlaces";
/// Prefix for map sources.
pub const MAP_PREFIX: &str = "📍 ";

/// Converts raw Markdown to the surface's markup.
pub trait MarkupRenderer: Send + Sync {
    fn render(&self, raw: &str) -> String;
}

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// HTML output.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlRenderer;

impl MarkupRenderer for HtmlRenderer {
    fn render(&self, raw: &str) -> String {
        let mut html = String::new();
        pulldown_cmark::html::push_html(&mut html, Parser::new_ext(raw, options()));
        html
    }
}

const BOLD: &str = "\x1b[1m";
const BOLD_OFF: &str = "\x1b[22m";
const ITALIC: &str = "\x1b[3m";
const ITALIC_OFF: &str = "\x1b[23m";
const UNDERLINE: &str = "\x1b[4m";
const UNDERLINE_OFF: &str = "\x1b[24m";
const CODE: &str = "\x1b[36m";
const CODE_OFF: &str = "\x1b[39m";
const STRIKE: &str = "\x1b[9m";
const STRIKE_OFF: &str = "\x1b[29m";
const RESET: &str = "\x1b[0m";

/// ANSI-styled text for a terminal.
#[derive(Debug, Clone, Copy)]
pub struct TerminalRenderer {
    color: bool,
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TerminalRenderer {
    /// `color = false` drops escape sequences and keeps the layout.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn style<'a>(&self, code: &'a str) -> &'a str {
        if self.color {
            code
        } else {
            ""
        }
    }
}

impl MarkupRenderer for TerminalRenderer {
    fn render(&self, raw: &str) -> String {
        let mut out = String::new();
        // One entry per open list: next number for ordered lists.
        let mut lists: Vec<Option<u64>> = Vec::new();
        let mut links: Vec<String> = Vec::new();

        for event in Parser::new_ext(raw, options()) {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    if matches!(level, HeadingLevel::H1 | HeadingLevel::H2) {
                        out.push_str(self.style(UNDERLINE));
                    }
                    out.push_str(self.style(BOLD));
                }
                Event::End(TagEnd::Heading(_)) => {
                    out.push_str(self.style(RESET));
                    out.push_str("\n\n");
                }
                Event::End(TagEnd::Paragraph) => {
                    out.push_str(if lists.is_empty() { "\n\n" } else { "\n" });
                }
                Event::Start(Tag::Strong) => out.push_str(self.style(BOLD)),
                Event::End(TagEnd::Strong) => out.push_str(self.style(BOLD_OFF)),
                Event::Start(Tag::Emphasis) => out.push_str(self.style(ITALIC)),
                Event::End(TagEnd::Emphasis) => out.push_str(self.style(ITALIC_OFF)),
                Event::Start(Tag::Strikethrough) => out.push_str(self.style(STRIKE)),
                Event::End(TagEnd::Strikethrough) => out.push_str(self.style(STRIKE_OFF)),
                Event::Start(Tag::List(start)) => {
                    if !lists.is_empty() && !out.ends_with('\n') {
                        out.push('\n');
                    }
                    lists.push(start);
                }
                Event::End(TagEnd::List(_)) => {
                    lists.pop();
                    if lists.is_empty() {
                        out.push('\n');
                    }
                }
                Event::Start(Tag::Item) => {
                    let depth = lists.len().saturating_sub(1);
                    out.push_str(&"  ".repeat(depth));
                    match lists.last_mut() {
                        Some(Some(n)) => {
                            out.push_str(&format!("{}. ", n));
                            *n += 1;
                        }
                        _ => out.push_str("• "),
                    }
                }
                Event::End(TagEnd::Item) => {
                    if !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
                Event::TaskListMarker(done) => out.push_str(if done { "[x] " } else { "[ ] " }),
                Event::Start(Tag::Link { dest_url, .. }) => {
                    links.push(dest_url.to_string());
                    out.push_str(self.style(UNDERLINE));
                }
                Event::End(TagEnd::Link) => {
                    out.push_str(self.style(UNDERLINE_OFF));
                    if let Some(url) = links.pop() {
                        if !url.is_empty() && url != "#" {
                            out.push_str(&format!(" ({})", url));
                        }
                    }
                }
                Event::Start(Tag::Image { dest_url, .. }) => {
                    links.push(dest_url.to_string());
                    out.push_str("[imagen: ");
                }
                Event::End(TagEnd::Image) => {
                    out.push(']');
                    if let Some(url) = links.pop() {
                        out.push_str(&format!(" ({})", url));
                    }
                }
                Event::Start(Tag::BlockQuote(_)) => out.push_str("│ "),
                Event::Start(Tag::CodeBlock(_)) => out.push_str(self.style(CODE)),
                Event::End(TagEnd::CodeBlock) => {
                    out.push_str(self.style(CODE_OFF));
                    out.push('\n');
                }
                Event::Code(code) => {
                    out.push_str(self.style(CODE));
                    out.push_str(&code);
                    out.push_str(self.style(CODE_OFF));
                }
                Event::Text(text) => out.push_str(&text),
                Event::SoftBreak => out.push(' '),
                Event::HardBreak => out.push('\n'),
                Event::Rule => out.push_str("────────────────────\n\n"),
                Event::Html(html) | Event::InlineHtml(html) => out.push_str(&html),
                Event::End(TagEnd::TableRow) | Event::End(TagEnd::TableHead) => out.push('\n'),
                Event::End(TagEnd::TableCell) => out.push_str(" | "),
                _ => {}
            }
        }

        out.trim_end().to_string()
    }
}

/// Markdown for the sources block of a grounded reply.
///
/// Returns an empty string when there are no citations.
pub fn citation_block(citations: &[Citation]) -> String {
    if citations.is_empty() {
        return String::new();
    }
    let mut block = format!("##### {}\n\n", SOURCES_HEADING);
    for citation in citations {
        let prefix = match citation.kind {
            CitationKind::Web => "",
            CitationKind::Map => MAP_PREFIX,
        };
        block.push_str(&format!(
            "- [{}{}](<{}>)\n",
            prefix,
            escape_label(&citation.label),
            citation.uri.replace(['<', '>', '\n'], "")
        ));
    }
    block
}

fn escape_label(label: &str) -> String {
    let mut escaped = String::with_capacity(label.len());
    for c in label.chars() {
        if matches!(c, '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
