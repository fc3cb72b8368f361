//! Markup cleanup before vocalizing.
//!
//! Assistant replies are Markdown; reading the markers aloud ruins prosody,
//! so they are stripped and links collapse to their text.

use regex::Regex;
use std::sync::LazyLock;

struct SpeechPatterns {
    bold: Regex,
    italic: Regex,
    heading: Regex,
    link: Regex,
    code: Regex,
    decoration: Regex,
}

static PATTERNS: LazyLock<SpeechPatterns> = LazyLock::new(|| SpeechPatterns {
    bold: Regex::new(r"\*\*").unwrap(),
    italic: Regex::new(r"\*").unwrap(),
    heading: Regex::new(r"#{1,6}\s?").unwrap(),
    link: Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap(),
    code: Regex::new(r"`").unwrap(),
    // Section markers used by the persona templates.
    decoration: Regex::new(
        "\u{1F5E3}\u{FE0F}?|\u{1F30E}|\u{1F4D6}|\u{1F9D0}|\u{1F4A1}|\u{1F4AC}|\u{1F3B5}|\u{1F457}|\u{1F372}|\u{1F4CD}|\u{1F5FA}\u{FE0F}?|\u{1F3F0}|\u{1F50D}",
    )
    .unwrap(),
});

/// Strip Markdown decoration so the text reads naturally when spoken.
pub fn clean_for_speech(text: &str) -> String {
    let p = &*PATTERNS;
    let text = p.bold.replace_all(text, "");
    let text = p.italic.replace_all(&text, "");
    let text = p.heading.replace_all(&text, "");
    let text = p.link.replace_all(&text, "$1");
    let text = p.code.replace_all(&text, "");
    let text = p.decoration.replace_all(&text, "");
    text.trim().to_string()
}
