//! WhatsApp-style text to markup conversion
//!
//! Chat text is turned into markup by a fixed sequence of named steps. Every
//! step rewrites the output of the one before it, so the order matters: the
//! bold step sees the `<br />` markers inserted by the line join, and the
//! italic step sees the tags inserted by the bold step.

use once_cell::sync::Lazy;
use regex::Regex;

/// Opening tag for a bulleted list line.
pub const LIST_ITEM_OPEN: &str = r#"<li style="list-style-type: disc; margin: 0;">"#;
pub const LIST_ITEM_CLOSE: &str = "</li>";

/// Marker placed between input lines.
pub const LINE_BREAK: &str = "<br />";

// `.` in the patterns below must not cross a line terminator, including the
// Unicode separators, so the match body uses an explicit class.
static BOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*([^\n\r\x{2028}\x{2029}]*?)\*").unwrap());
static ITALIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_([^\n\r\x{2028}\x{2029}]*?)_").unwrap());
static STRIKETHROUGH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"~([^\n\r\x{2028}\x{2029}]*?)~").unwrap());
static CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```([^\n\r\x{2028}\x{2029}]*?)```").unwrap());

/// One transformation in the formatting pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Lines starting with `"* "` become list items.
    ListItems,
    /// Newlines become [`LINE_BREAK`] markers.
    JoinLines,
    /// `*text*` becomes `<strong>text</strong><br>`.
    Bold,
    /// `_text_` becomes `<em>text</em>`.
    Italic,
    /// `~text~` becomes `<del>text</del>`.
    Strikethrough,
    /// ```` ```text``` ```` becomes `<code>text</code>`.
    Code,
}

/// The steps in the order [`format`] applies them.
pub const PIPELINE: [Step; 6] = [
    Step::ListItems,
    Step::JoinLines,
    Step::Bold,
    Step::Italic,
    Step::Strikethrough,
    Step::Code,
];

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::ListItems => "list-items",
            Step::JoinLines => "join-lines",
            Step::Bold => "bold",
            Step::Italic => "italic",
            Step::Strikethrough => "strikethrough",
            Step::Code => "code",
        }
    }

    pub fn apply(&self, text: &str) -> String {
        match self {
            Step::ListItems => text
                .split('\n')
                .map(list_item)
                .collect::<Vec<_>>()
                .join("\n"),
            Step::JoinLines => text.split('\n').collect::<Vec<_>>().join(LINE_BREAK),
            // The trailing <br> after bold text is existing behavior, kept as-is.
            Step::Bold => BOLD.replace_all(text, "<strong>${1}</strong><br>").into_owned(),
            Step::Italic => ITALIC.replace_all(text, "<em>${1}</em>").into_owned(),
            Step::Strikethrough => STRIKETHROUGH.replace_all(text, "<del>${1}</del>").into_owned(),
            Step::Code => CODE.replace_all(text, "<code>${1}</code>").into_owned(),
        }
    }
}

fn list_item(line: &str) -> String {
    match line.strip_prefix("* ") {
        Some(rest) => format!("{}{}{}", LIST_ITEM_OPEN, rest.trim(), LIST_ITEM_CLOSE),
        None => line.to_string(),
    }
}

/// Run the full pipeline over `raw`.
///
/// The output is markup meant to be rendered as-is. Nothing in `raw` is
/// escaped, so tags typed by the user or returned by the backend reach the
/// renderer untouched. Use [`Formatter::escaping`] to escape them first.
pub fn format(raw: &str) -> String {
    PIPELINE.iter().fold(raw.to_string(), |text, step| step.apply(&text))
}

/// Escape the characters that are significant in markup.
pub fn escape_markup(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Formatter with an optional escaping pass in front of the pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct Formatter {
    escape: bool,
}

impl Formatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn escaping(escape: bool) -> Self {
        Self { escape }
    }

    pub fn escapes(&self) -> bool {
        self.escape
    }

    pub fn format(&self, raw: &str) -> String {
        if self.escape {
            format(&escape_markup(raw))
        } else {
            format(raw)
        }
    }
}
