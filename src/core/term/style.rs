//! Style resolution
//!
//! This module defines the normalized style set produced by SGR codes and
//! folds decoded tokens into flat styled spans.

use bitflags::bitflags;

use super::parser::{self, Token};

/// Number of color tags (8 standard + 8 bright)
pub const COLOR_COUNT: u8 = 16;

bitflags! {
    /// Weight and decoration flags
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct StyleFlags: u8 {
        const BOLD          = 0b0000_0001;
        const ITALIC        = 0b0000_0010;
        const UNDERLINE     = 0b0000_0100;
        const BLINK         = 0b0000_1000;
        const STRIKETHROUGH = 0b0001_0000;
    }
}

/// Active style: flags plus at most one foreground and one background tag.
///
/// Color tags are indexes into the 16-color palette (0-7 standard, 8-15
/// bright).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StyleSet {
    pub flags: StyleFlags,
    pub fg: Option<u8>,
    pub bg: Option<u8>,
}

impl StyleSet {
    pub const EMPTY: Self = Self {
        flags: StyleFlags::empty(),
        fg: None,
        bg: None,
    };

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.fg.is_none() && self.bg.is_none()
    }

    pub fn reset(&mut self) {
        *self = Self::EMPTY;
    }

    /// Build the style described by one sequence's parameter string.
    ///
    /// Every sequence starts from an empty set, so a new sequence fully
    /// replaces whatever style was active before it.
    pub fn from_params(params: &str) -> Self {
        let mut style = Self::EMPTY;
        for code in params.split(';') {
            style.apply(code);
        }
        style
    }

    /// Apply a single SGR code. Unrecognized codes are ignored.
    pub fn apply(&mut self, code: &str) {
        if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
            tracing::trace!("Ignoring non-numeric SGR code {:?}", code);
            return;
        }
        let Ok(code) = code.parse::<u16>() else {
            tracing::trace!("Ignoring out-of-range SGR code {:?}", code);
            return;
        };

        match code {
            0 => self.reset(),
            1 => self.flags |= StyleFlags::BOLD,
            3 => self.flags |= StyleFlags::ITALIC,
            4 => self.flags |= StyleFlags::UNDERLINE,
            5 | 6 => self.flags |= StyleFlags::BLINK,
            9 => self.flags |= StyleFlags::STRIKETHROUGH,

            // Foreground colors (standard / bright)
            30..=37 => self.fg = Some((code - 30) as u8),
            90..=97 => self.fg = Some((code - 90 + 8) as u8),

            // Background colors (standard / bright)
            40..=47 => self.bg = Some((code - 40) as u8),
            100..=107 => self.bg = Some((code - 100 + 8) as u8),

            _ => tracing::trace!("Ignoring unsupported SGR code {}", code),
        }
    }
}

/// A non-empty run of literal text under one style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub style: StyleSet,
    pub text: String,
}

impl Span {
    pub fn new(style: StyleSet, text: impl Into<String>) -> Self {
        Self {
            style,
            text: text.into(),
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(StyleSet::EMPTY, text)
    }
}

/// Fold a token stream into spans.
///
/// Only one style region is open at a time. A style token always closes the
/// current region; a region that never receives literal text produces no
/// span at all.
pub fn resolve(tokens: &[Token]) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    let mut current = StyleSet::EMPTY;
    let mut region_open = false;

    for token in tokens {
        match token {
            Token::Style(style) => {
                current = *style;
                region_open = false;
            }
            Token::Literal(text) if text.is_empty() => {}
            Token::Literal(text) => {
                if region_open {
                    if let Some(last) = spans.last_mut() {
                        last.text.push_str(text);
                        continue;
                    }
                }
                spans.push(Span::new(current, text.as_str()));
                region_open = true;
            }
        }
    }

    spans
}

/// Decode and resolve multi-line text.
///
/// Lines are decoded independently: a style never carries across a newline.
/// Each newline becomes its own unstyled span.
pub fn resolve_text(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            spans.push(Span::plain("\n"));
        }
        spans.extend(resolve(&parser::decode(line)));
    }
    spans
}

/// Visible text of a span sequence.
pub fn visible_text(spans: &[Span]) -> String {
    spans.iter().map(|span| span.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_additive_within_sequence() {
        let style = StyleSet::from_params("1;3;4;5;9;31;42");
        assert_eq!(
            style.flags,
            StyleFlags::BOLD
                | StyleFlags::ITALIC
                | StyleFlags::UNDERLINE
                | StyleFlags::BLINK
                | StyleFlags::STRIKETHROUGH
        );
        assert_eq!(style.fg, Some(1));
        assert_eq!(style.bg, Some(2));
    }

    #[test]
    fn test_bright_colors_and_last_color_wins() {
        let style = StyleSet::from_params("31;97;100");
        assert_eq!(style.fg, Some(15));
        assert_eq!(style.bg, Some(8));
        assert_eq!(StyleSet::from_params("6").flags, StyleFlags::BLINK);
    }

    #[test]
    fn test_reset_mid_sequence() {
        let style = StyleSet::from_params("1;44;0;32");
        assert_eq!(style.flags, StyleFlags::empty());
        assert_eq!(style.bg, None);
        assert_eq!(style.fg, Some(2));
    }

    #[test]
    fn test_unknown_codes_ignored() {
        assert!(StyleSet::from_params("").is_empty());
        assert!(StyleSet::from_params("2;7;38;196;+1;x").is_empty());
        assert!(StyleSet::from_params("99999999").is_empty());
    }

    #[test]
    fn test_extended_color_codes_split_like_any_other() {
        // 38;5;196 is three separate codes: unknown, blink, unknown
        let style = StyleSet::from_params("38;5;196");
        assert_eq!(style.flags, StyleFlags::BLINK);
        assert_eq!(style.fg, None);
    }

    #[test]
    fn test_sequences_replace_instead_of_accumulate() {
        let spans = resolve_text("\x1b[1mA\x1b[31mB");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].style.flags, StyleFlags::BOLD);
        assert_eq!(spans[1].style.flags, StyleFlags::empty());
        assert_eq!(spans[1].style.fg, Some(1));
    }

    #[test]
    fn test_empty_region_produces_no_span() {
        assert!(resolve_text("\x1b[31m").is_empty());
        let spans = resolve_text("\x1b[31m\x1b[32mX");
        assert_eq!(spans, vec![Span::new(StyleSet::from_params("32"), "X")]);
    }

    #[test]
    fn test_style_does_not_cross_newline() {
        let spans = resolve_text("\x1b[33mwarn\nnext");
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[1], Span::plain("\n"));
        assert_eq!(spans[2], Span::plain("next"));
        assert_eq!(visible_text(&spans), "warn\nnext");
    }
}
