//! Console sink using crossterm
//!
//! Mirrors the session buffer onto a real terminal.

use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveLeft, MoveTo, Show},
    execute, queue,
    style::{Attribute, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use unicode_width::UnicodeWidthChar;

use crate::config::ColorScheme;
use crate::core::buffer::{Fragment, FragmentKind};
use crate::core::term::{Span, StyleFlags, StyleSet};
use crate::ui::DisplaySink;

/// Sink writing styled output to a console
pub struct ConsoleSink<W: Write + Send = io::Stdout> {
    out: W,
    scheme: ColorScheme,
    /// Whether raw mode was entered by `init`
    initialized: bool,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout(scheme: ColorScheme) -> Self {
        Self::new(io::stdout(), scheme)
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W, scheme: ColorScheme) -> Self {
        Self {
            out,
            scheme,
            initialized: false,
        }
    }

    /// Enter raw mode so keystrokes reach the engine unbuffered
    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(self.out, Clear(ClearType::All), MoveTo(0, 0), Hide)?;
        self.initialized = true;
        Ok(())
    }

    /// Restore the console. Runs on drop if not called earlier.
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;

        let _ = execute!(
            self.out,
            ResetColor,
            SetAttribute(Attribute::Reset),
            Show,
            Print("\r\n")
        );
        terminal::disable_raw_mode()
    }

    fn write_fragment(&mut self, fragment: &Fragment) -> io::Result<()> {
        match fragment.kind() {
            FragmentKind::Raw => self.write_text(&fragment.text()),
            FragmentKind::Output | FragmentKind::Echo => {
                for span in fragment.spans() {
                    self.write_span(span)?;
                }
                Ok(())
            }
        }
    }

    fn write_span(&mut self, span: &Span) -> io::Result<()> {
        if span.style.is_empty() {
            return self.write_text(&span.text);
        }
        self.apply_style(&span.style)?;
        self.write_text(&span.text)?;
        queue!(self.out, SetAttribute(Attribute::Reset), ResetColor)
    }

    /// Raw mode needs explicit carriage returns
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                queue!(self.out, Print("\r\n"))?;
            }
            if !line.is_empty() {
                queue!(self.out, Print(line))?;
            }
        }
        Ok(())
    }

    /// Apply style attributes
    fn apply_style(&mut self, style: &StyleSet) -> io::Result<()> {
        const ATTRIBUTES: [(StyleFlags, Attribute); 5] = [
            (StyleFlags::BOLD, Attribute::Bold),
            (StyleFlags::ITALIC, Attribute::Italic),
            (StyleFlags::UNDERLINE, Attribute::Underlined),
            (StyleFlags::BLINK, Attribute::SlowBlink),
            (StyleFlags::STRIKETHROUGH, Attribute::CrossedOut),
        ];
        for (flag, attribute) in ATTRIBUTES {
            if style.flags.contains(flag) {
                queue!(self.out, SetAttribute(attribute))?;
            }
        }
        if let Some(fg) = style.fg {
            let color = self.scheme.color(fg).to_crossterm();
            queue!(self.out, SetForegroundColor(color))?;
        }
        if let Some(bg) = style.bg {
            let color = self.scheme.color(bg).to_crossterm();
            queue!(self.out, SetBackgroundColor(color))?;
        }
        Ok(())
    }

    fn write_erase(&mut self, removed: char) -> io::Result<()> {
        let width = removed.width().unwrap_or(0) as u16;
        if width > 0 {
            execute!(self.out, MoveLeft(width), Clear(ClearType::UntilNewLine))?;
        }
        Ok(())
    }

    fn report(result: io::Result<()>) {
        if let Err(e) = result {
            tracing::warn!("Console write failed: {}", e);
        }
    }
}

impl<W: Write + Send> DisplaySink for ConsoleSink<W> {
    fn append(&mut self, fragment: &Fragment) {
        let result = self.write_fragment(fragment);
        Self::report(result);
    }

    fn erase(&mut self, removed: char) {
        let result = self.write_erase(removed);
        Self::report(result);
    }

    fn clear(&mut self) {
        let result = execute!(self.out, Clear(ClearType::All), MoveTo(0, 0));
        Self::report(result);
    }

    fn scroll_to_end(&mut self) {
        let result = self.out.flush();
        Self::report(result);
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        let result = if visible {
            execute!(self.out, Show)
        } else {
            execute!(self.out, Hide)
        };
        Self::report(result);
    }
}

impl<W: Write + Send> Drop for ConsoleSink<W> {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            tracing::warn!("Failed to restore console: {}", e);
        }
        let _ = self.out.flush();
    }
}
