//! Markup rendering
//!
//! Turns styled spans into flat `<span class="...">` markup. Rendering is a
//! pure function: no state survives between calls.

use super::style::{self, Span, StyleFlags, StyleSet};

/// Flag classes, in the order they appear in a class list
const FLAG_CLASSES: [(StyleFlags, &str); 5] = [
    (StyleFlags::BOLD, "bold"),
    (StyleFlags::ITALIC, "italic"),
    (StyleFlags::UNDERLINE, "underline"),
    (StyleFlags::BLINK, "blink"),
    (StyleFlags::STRIKETHROUGH, "strikethrough"),
];

/// Class name for a foreground color tag
pub fn fg_class(index: u8) -> String {
    format!("ansi-{}", index)
}

/// Class name for a background color tag
pub fn bg_class(index: u8) -> String {
    format!("ansi-bg-{}", index)
}

/// Whitespace-separated class list: flags first, then foreground, then
/// background.
pub fn class_list(style: &StyleSet) -> String {
    let mut classes: Vec<String> = FLAG_CLASSES
        .iter()
        .filter(|(flag, _)| style.flags.contains(*flag))
        .map(|(_, name)| (*name).to_string())
        .collect();
    if let Some(fg) = style.fg {
        classes.push(fg_class(fg));
    }
    if let Some(bg) = style.bg {
        classes.push(bg_class(bg));
    }
    classes.join(" ")
}

/// HTML-escape a string into the output buffer.
pub fn escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    escape_into(&mut out, s);
    out
}

/// Render spans to markup.
pub fn render_spans(spans: &[Span]) -> String {
    let mut out = String::new();
    for span in spans {
        if span.style.is_empty() {
            escape_into(&mut out, &span.text);
        } else {
            out.push_str("<span class=\"");
            out.push_str(&class_list(&span.style));
            out.push_str("\">");
            escape_into(&mut out, &span.text);
            out.push_str("</span>");
        }
    }
    out
}

/// Render a single line.
pub fn render(line: &str) -> String {
    render_spans(&style::resolve(&super::parser::decode(line)))
}

/// Render text that may span several lines.
pub fn render_text(text: &str) -> String {
    render_spans(&style::resolve_text(text))
}

/// Recover the visible text of a markup fragment.
///
/// Tags are dropped (`<br>` becomes a newline) and the common entities are
/// decoded. Unknown entities are kept verbatim.
pub fn markup_to_text(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(pos) = rest.find(['<', '&']) {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if rest.starts_with('<') {
            let Some(end) = rest.find('>') else {
                // Unclosed tag: nothing visible follows
                return out;
            };
            let tag = rest[1..end].trim().trim_end_matches('/').trim();
            if tag.eq_ignore_ascii_case("br") {
                out.push('\n');
            }
            rest = &rest[end + 1..];
        } else {
            match rest.find(';').filter(|&end| end <= 10) {
                Some(end) => {
                    match decode_entity(&rest[1..end]) {
                        Some(ch) => out.push(ch),
                        None => out.push_str(&rest[..=end]),
                    }
                    rest = &rest[end + 1..];
                }
                None => {
                    out.push('&');
                    rest = &rest[1..];
                }
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
