//! Session buffer
//!
//! The single owner of "what has been shown". It keeps two logs:
//!
//! - **raw log**: the visible text, used as the transcript. Only grows,
//!   except on [`SessionBuffer::clear`].
//! - **rendered log**: one [`Fragment`] per append. Only the tail fragment is
//!   ever edited, by backspace.

use crate::core::term::markup;
use crate::core::term::style::{self, Span};
use crate::ui::DisplaySink;

/// Where a fragment came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// Program or notification output
    Output,
    /// One echoed input character
    Echo,
    /// Pre-rendered markup passed through untouched
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FragmentBody {
    Spans(Vec<Span>),
    Markup(String),
}

/// One entry of the rendered log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    kind: FragmentKind,
    body: FragmentBody,
}

impl Fragment {
    fn styled(kind: FragmentKind, spans: Vec<Span>) -> Self {
        Self {
            kind,
            body: FragmentBody::Spans(spans),
        }
    }

    fn raw(markup: &str) -> Self {
        Self {
            kind: FragmentKind::Raw,
            body: FragmentBody::Markup(markup.to_string()),
        }
    }

    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    /// Styled spans, empty for raw markup
    pub fn spans(&self) -> &[Span] {
        match &self.body {
            FragmentBody::Spans(spans) => spans,
            FragmentBody::Markup(_) => &[],
        }
    }

    pub fn markup(&self) -> String {
        match &self.body {
            FragmentBody::Spans(spans) => markup::render_spans(spans),
            FragmentBody::Markup(raw) => raw.clone(),
        }
    }

    /// Visible text
    pub fn text(&self) -> String {
        match &self.body {
            FragmentBody::Spans(spans) => style::visible_text(spans),
            FragmentBody::Markup(raw) => markup::markup_to_text(raw),
        }
    }

    fn is_empty(&self) -> bool {
        match &self.body {
            FragmentBody::Spans(spans) => spans.is_empty(),
            FragmentBody::Markup(raw) => raw.is_empty(),
        }
    }

    /// Remove the last visible character. Raw markup is never edited.
    fn pop_char(&mut self) -> Option<char> {
        let FragmentBody::Spans(spans) = &mut self.body else {
            return None;
        };
        let last = spans.last_mut()?;
        let removed = last.text.pop();
        if last.text.is_empty() {
            spans.pop();
        }
        removed
    }
}

/// Append-only session log bound to a display sink
pub struct SessionBuffer {
    raw_log: String,
    rendered: Vec<Fragment>,
    sink: Box<dyn DisplaySink>,
}

impl SessionBuffer {
    pub fn new(sink: Box<dyn DisplaySink>) -> Self {
        Self {
            raw_log: String::new(),
            rendered: Vec::new(),
            sink,
        }
    }

    /// Append text, decoding SGR sequences when `styled`.
    ///
    /// Returns `false` if nothing visible was appended.
    pub fn append(&mut self, text: &str, styled: bool) -> bool {
        let spans = if styled {
            style::resolve_text(text)
        } else if text.is_empty() {
            Vec::new()
        } else {
            vec![Span::plain(text)]
        };
        self.push_spans(FragmentKind::Output, spans, true)
    }

    /// Append pre-rendered markup without decoding it.
    pub fn append_raw(&mut self, markup: &str) -> bool {
        if markup.is_empty() {
            return false;
        }
        let fragment = Fragment::raw(markup);
        self.raw_log.push_str(&fragment.text());
        self.push_fragment(fragment);
        true
    }

    /// Append one unit produced by the typing scheduler.
    pub fn push_unit(&mut self, unit: Span) -> bool {
        self.push_spans(FragmentKind::Output, vec![unit], true)
    }

    /// Echo one typed character. The raw log only learns about input once
    /// the line is committed.
    pub fn echo(&mut self, ch: char) {
        self.push_spans(FragmentKind::Echo, vec![Span::plain(ch.to_string())], false);
    }

    /// Record a submitted input line and end it with a newline.
    pub fn commit_line(&mut self, line: &str) {
        self.raw_log.push_str(line);
        self.push_spans(FragmentKind::Output, vec![Span::plain("\n")], true);
    }

    /// Wipe both logs.
    pub fn clear(&mut self) {
        self.raw_log.clear();
        self.rendered.clear();
        self.sink.clear();
    }

    /// Remove exactly one visible character from the tail of the rendered log.
    ///
    /// Styled fragments are edited span-aware, so a closing tag is never cut.
    /// A raw markup tail is left alone.
    pub fn remove_last_rendered_unit(&mut self) -> Option<char> {
        let fragment = self.rendered.last_mut()?;
        let Some(removed) = fragment.pop_char() else {
            tracing::debug!("Backspace reached a raw markup fragment, leaving it intact");
            return None;
        };
        if fragment.is_empty() {
            self.rendered.pop();
        }
        self.sink.erase(removed);
        Some(removed)
    }

    /// Whether the last rendered fragment is an input echo
    pub fn tail_is_echo(&self) -> bool {
        self.rendered
            .last()
            .is_some_and(|fragment| fragment.kind == FragmentKind::Echo)
    }

    pub fn raw_log(&self) -> &str {
        &self.raw_log
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.rendered
    }

    /// The full rendered log as markup
    pub fn rendered(&self) -> String {
        self.rendered.iter().map(Fragment::markup).collect()
    }

    pub fn sink_mut(&mut self) -> &mut dyn DisplaySink {
        self.sink.as_mut()
    }

    fn push_spans(&mut self, kind: FragmentKind, spans: Vec<Span>, record: bool) -> bool {
        if spans.is_empty() {
            return false;
        }
        if record {
            for span in &spans {
                self.raw_log.push_str(&span.text);
            }
        }
        self.push_fragment(Fragment::styled(kind, spans));
        true
    }

    fn push_fragment(&mut self, fragment: Fragment) {
        self.sink.append(&fragment);
        self.rendered.push(fragment);
        self.sink.scroll_to_end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{NullSink, RecordingSink, SinkEvent};

    fn buffer() -> SessionBuffer {
        SessionBuffer::new(Box::new(NullSink))
    }

    #[test]
    fn test_append_styled_and_plain() {
        let mut buf = buffer();
        assert!(buf.append("\x1b[32mok\x1b[0m done\n", true));
        assert!(buf.append("\x1b[1mraw", false));
        assert_eq!(buf.raw_log(), "ok done\n\x1b[1mraw");
        assert_eq!(
            buf.rendered(),
            "<span class=\"ansi-2\">ok</span> done\n\x1b[1mraw"
        );
        assert_eq!(buf.fragments().len(), 2);
    }

    #[test]
    fn test_style_only_append_is_a_noop() {
        let mut buf = buffer();
        assert!(!buf.append("\x1b[31m", true));
        assert!(!buf.append("", false));
        assert!(buf.fragments().is_empty());
        assert_eq!(buf.raw_log(), "");
    }

    #[test]
    fn test_every_append_scrolls() {
        let sink = RecordingSink::new();
        let mut buf = SessionBuffer::new(Box::new(sink.clone()));
        buf.append("a", true);
        buf.append_raw("<b>b</b>");
        assert_eq!(
            sink.events(),
            vec![
                SinkEvent::Append("a".into()),
                SinkEvent::ScrollToEnd,
                SinkEvent::Append("<b>b</b>".into()),
                SinkEvent::ScrollToEnd,
            ]
        );
        assert_eq!(buf.raw_log(), "ab");
    }

    #[test]
    fn test_backspace_inside_styled_span() {
        let mut buf = buffer();
        buf.append("\x1b[31mab", true);
        assert_eq!(buf.remove_last_rendered_unit(), Some('b'));
        assert_eq!(buf.rendered(), "<span class=\"ansi-1\">a</span>");
        assert_eq!(buf.remove_last_rendered_unit(), Some('a'));
        assert_eq!(buf.rendered(), "");
        assert!(buf.fragments().is_empty());
        assert_eq!(buf.remove_last_rendered_unit(), None);
    }

    #[test]
    fn test_backspace_across_span_boundary() {
        let mut buf = buffer();
        buf.append("x\x1b[1m&", true);
        assert_eq!(buf.rendered(), "x<span class=\"bold\">&amp;</span>");
        assert_eq!(buf.remove_last_rendered_unit(), Some('&'));
        assert_eq!(buf.rendered(), "x");
    }

    #[test]
    fn test_backspace_leaves_raw_markup() {
        let mut buf = buffer();
        buf.append_raw("<pre>art</pre>");
        assert_eq!(buf.remove_last_rendered_unit(), None);
        assert_eq!(buf.rendered(), "<pre>art</pre>");
    }

    #[test]
    fn test_echo_is_presentation_only() {
        let mut buf = buffer();
        buf.echo('h');
        buf.echo('<');
        assert!(buf.tail_is_echo());
        assert_eq!(buf.rendered(), "h&lt;");
        assert_eq!(buf.raw_log(), "");
        buf.commit_line("h<");
        assert!(!buf.tail_is_echo());
        assert_eq!(buf.raw_log(), "h<\n");
    }

    #[test]
    fn test_clear_resets_everything() {
        let sink = RecordingSink::new();
        let mut buf = SessionBuffer::new(Box::new(sink.clone()));
        buf.append("hello", true);
        buf.clear();
        assert_eq!(buf.raw_log(), "");
        assert_eq!(buf.rendered(), "");
        assert_eq!(sink.events().last(), Some(&SinkEvent::Clear));
        assert_eq!(sink.appended_markup(), "");
    }
}
