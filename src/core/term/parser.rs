//! SGR sequence decoder
//!
//! Splits one line of text into literal runs and style boundaries.

use super::style::StyleSet;

const ESC: char = '\x1b';

/// One decoded unit of a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal text, not yet escaped for display
    Literal(String),
    /// Start of a new style region (possibly empty)
    Style(StyleSet),
}

/// Decode a single line (no embedded newlines) into tokens.
///
/// Decoding is a pure function of `line`: calling it twice yields the same
/// tokens.
pub fn decode(line: &str) -> Vec<Token> {
    let mut decoder = Decoder::default();
    for ch in line.chars() {
        decoder.feed(ch);
    }
    decoder.finish()
}

#[derive(Clone, Copy, Default, PartialEq)]
enum DecoderState {
    #[default]
    Ground,
    Escape,
    /// Inside `ESC [`, collecting parameters until `m`
    CsiParam,
}

#[derive(Default)]
struct Decoder {
    state: DecoderState,
    params: String,
    literal: String,
    tokens: Vec<Token>,
}

impl Decoder {
    fn feed(&mut self, ch: char) {
        match self.state {
            DecoderState::Ground => {
                if ch == ESC {
                    self.state = DecoderState::Escape;
                } else {
                    self.literal.push(ch);
                }
            }
            DecoderState::Escape => match ch {
                '[' => {
                    self.flush_literal();
                    self.params.clear();
                    self.state = DecoderState::CsiParam;
                }
                // The first ESC was not an introducer after all
                ESC => self.literal.push(ESC),
                _ => {
                    self.literal.push(ESC);
                    self.literal.push(ch);
                    self.state = DecoderState::Ground;
                }
            },
            DecoderState::CsiParam => {
                if ch == 'm' {
                    let style = StyleSet::from_params(&self.params);
                    self.tokens.push(Token::Style(style));
                    self.state = DecoderState::Ground;
                } else {
                    self.params.push(ch);
                }
            }
        }
    }

    fn flush_literal(&mut self) {
        if !self.literal.is_empty() {
            self.tokens.push(Token::Literal(std::mem::take(&mut self.literal)));
        }
    }

    fn finish(mut self) -> Vec<Token> {
        match self.state {
            DecoderState::Ground => {}
            DecoderState::Escape => self.literal.push(ESC),
            DecoderState::CsiParam => {
                tracing::trace!("Dropping unterminated escape sequence: params={:?}", self.params);
            }
        }
        self.flush_literal();
        self.tokens
    }
}
