//! Render formatter markup as styled terminal lines
//!
//! Only the tags the formatter emits are interpreted. Anything else that
//! looks like a tag is shown as literal text.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const BULLET: &str = "• ";

const ENTITIES: [(&str, char); 5] = [
    ("&amp;", '&'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&quot;", '"'),
    ("&#39;", '\''),
];

#[derive(Debug, Clone, Copy)]
enum Tag {
    Open(Inline),
    Close(Inline),
    Break,
    ListItemEnd,
}

#[derive(Debug, Clone, Copy)]
enum Inline {
    Bold,
    Italic,
    Strike,
    Code,
}

const TAGS: [(&str, Tag); 12] = [
    ("<strong>", Tag::Open(Inline::Bold)),
    ("</strong>", Tag::Close(Inline::Bold)),
    ("<em>", Tag::Open(Inline::Italic)),
    ("</em>", Tag::Close(Inline::Italic)),
    ("<del>", Tag::Open(Inline::Strike)),
    ("</del>", Tag::Close(Inline::Strike)),
    ("<code>", Tag::Open(Inline::Code)),
    ("</code>", Tag::Close(Inline::Code)),
    ("<br />", Tag::Break),
    ("<br/>", Tag::Break),
    ("<br>", Tag::Break),
    ("</li>", Tag::ListItemEnd),
];

struct LineBuilder {
    base: Style,
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    text: String,
    bold: u8,
    italic: u8,
    strike: u8,
    code: u8,
    // Set right after a list item closes, so a following <br> doesn't add a blank line
    after_block: bool,
}

impl LineBuilder {
    fn new(base: Style) -> Self {
        Self {
            base,
            lines: Vec::new(),
            spans: Vec::new(),
            text: String::new(),
            bold: 0,
            italic: 0,
            strike: 0,
            code: 0,
            after_block: false,
        }
    }

    fn style(&self) -> Style {
        let mut style = self.base;
        if self.bold > 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic > 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.strike > 0 {
            style = style.add_modifier(Modifier::CROSSED_OUT);
        }
        if self.code > 0 {
            style = style.fg(Color::Magenta);
        }
        style
    }

    fn push_str(&mut self, s: &str) {
        self.after_block = false;
        self.text.push_str(s);
    }

    fn push_char(&mut self, c: char) {
        self.after_block = false;
        self.text.push(c);
    }

    fn flush_span(&mut self) {
        if !self.text.is_empty() {
            let style = self.style();
            self.spans.push(Span::styled(std::mem::take(&mut self.text), style));
        }
    }

    fn line_is_empty(&self) -> bool {
        self.spans.is_empty() && self.text.is_empty()
    }

    fn end_line(&mut self) {
        self.flush_span();
        self.lines.push(Line::from(std::mem::take(&mut self.spans)));
    }

    fn counter(&mut self, inline: Inline) -> &mut u8 {
        match inline {
            Inline::Bold => &mut self.bold,
            Inline::Italic => &mut self.italic,
            Inline::Strike => &mut self.strike,
            Inline::Code => &mut self.code,
        }
    }

    fn apply(&mut self, tag: Tag) {
        match tag {
            Tag::Open(inline) => {
                self.flush_span();
                let depth = self.counter(inline);
                *depth = depth.saturating_add(1);
            }
            Tag::Close(inline) => {
                self.flush_span();
                let depth = self.counter(inline);
                *depth = depth.saturating_sub(1);
            }
            Tag::Break => {
                if self.after_block && self.line_is_empty() {
                    self.after_block = false;
                } else {
                    self.end_line();
                }
            }
            Tag::ListItemEnd => {
                self.end_line();
                self.after_block = true;
            }
        }
    }

    fn start_list_item(&mut self) {
        if !self.line_is_empty() {
            self.end_line();
        }
        self.push_str(BULLET);
        self.flush_span();
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        if !self.line_is_empty() {
            self.end_line();
        }
        self.lines
    }
}

/// Length of a `<li ...>` opening tag at the start of `s`, if there is one.
fn list_item_open(s: &str) -> Option<usize> {
    let rest = s.strip_prefix("<li")?;
    if !(rest.starts_with('>') || rest.starts_with(' ')) {
        return None;
    }
    rest.find('>').map(|end| "<li".len() + end + 1)
}

/// Convert formatted markup into terminal lines styled on top of `base`.
pub fn to_lines(markup: &str, base: Style) -> Vec<Line<'static>> {
    let mut builder = LineBuilder::new(base);
    let mut rest = markup;

    while let Some(c) = rest.chars().next() {
        if c == '<' {
            if let Some((pattern, tag)) = TAGS.iter().find(|(pattern, _)| rest.starts_with(pattern)) {
                builder.apply(*tag);
                rest = &rest[pattern.len()..];
                continue;
            }
            if let Some(len) = list_item_open(rest) {
                builder.start_list_item();
                rest = &rest[len..];
                continue;
            }
        } else if c == '&' {
            if let Some((entity, decoded)) = ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
                builder.push_char(*decoded);
                rest = &rest[entity.len()..];
                continue;
            }
        }

        builder.push_char(c);
        rest = &rest[c.len_utf8()..];
    }

    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifgpt_core::format;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn texts(markup: &str) -> Vec<String> {
        to_lines(markup, Style::default()).iter().map(text_of).collect()
    }

    #[test]
    fn test_empty_markup_has_no_lines() {
        assert!(to_lines("", Style::default()).is_empty());
    }

    #[test]
    fn test_plain_text_is_one_line() {
        assert_eq!(texts("hello there"), vec!["hello there"]);
    }

    #[test]
    fn test_line_breaks_split_lines() {
        assert_eq!(texts(&format("a\nb\n\nc")), vec!["a", "b", "", "c"]);
    }

    #[test]
    fn test_bold_span_and_its_break() {
        let lines = to_lines(&format("*hi* there"), Style::default());
        assert_eq!(lines.len(), 2);
        assert_eq!(text_of(&lines[0]), "hi");
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(text_of(&lines[1]), " there");
        assert!(!lines[1].spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_trailing_break_adds_no_empty_line() {
        assert_eq!(texts(&format("*hi*")), vec!["hi"]);
    }

    #[test]
    fn test_inline_styles() {
        let lines = to_lines(&format("_a_ ~b~ ```c```"), Style::default());
        let spans = &lines[0].spans;
        assert!(spans[0].style.add_modifier.contains(Modifier::ITALIC));
        assert!(spans[2].style.add_modifier.contains(Modifier::CROSSED_OUT));
        assert_eq!(spans[4].style.fg, Some(Color::Magenta));
        assert_eq!(text_of(&lines[0]), "a b c");
    }

    #[test]
    fn test_nested_styles_combine() {
        let lines = to_lines(&format("*_x_*"), Style::default());
        let style = lines[0].spans[0].style;
        assert!(style.add_modifier.contains(Modifier::BOLD | Modifier::ITALIC));
    }

    #[test]
    fn test_list_items_become_bullets() {
        assert_eq!(texts(&format("* one\n* two\nafter")), vec!["• one", "• two", "after"]);
    }

    #[test]
    fn test_unknown_tags_are_literal() {
        assert_eq!(texts("<script>x</script>"), vec!["<script>x</script>"]);
        assert_eq!(texts("<link>"), vec!["<link>"]);
    }

    #[test]
    fn test_entities_are_decoded() {
        assert_eq!(texts("&lt;b&gt; &amp; &quot;q&quot; &#39;s&#39; &nbsp;"), vec![
            "<b> & \"q\" 's' &nbsp;"
        ]);
    }

    #[test]
    fn test_base_style_is_kept() {
        let base = Style::default().fg(Color::Yellow);
        let lines = to_lines("plain", base);
        assert_eq!(lines[0].spans[0].style.fg, Some(Color::Yellow));
    }
}
