//! Display sinks
//!
//! A sink owns the actual display surface. The session buffer forwards every
//! change to its sink; nothing else in the engine is platform-specific.

use std::sync::{Arc, Mutex, PoisonError};

use crate::core::buffer::Fragment;

/// Surface that mirrors the session buffer
pub trait DisplaySink: Send {
    /// A fragment was appended at the end of the buffer
    fn append(&mut self, fragment: &Fragment);

    /// The last visible character was removed
    fn erase(&mut self, removed: char);

    /// All content was wiped
    fn clear(&mut self);

    /// Keep the end of the buffer in view
    fn scroll_to_end(&mut self) {}

    /// Show or hide the input cursor
    fn set_cursor_visible(&mut self, _visible: bool) {}
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn append(&mut self, _fragment: &Fragment) {}
    fn erase(&mut self, _removed: char) {}
    fn clear(&mut self) {}
}

/// Change observed by a [`RecordingSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// Markup of an appended fragment
    Append(String),
    Erase(char),
    Clear,
    ScrollToEnd,
    Cursor(bool),
}

/// Sink that records every change into a shared log.
///
/// Clones share the same log, so a test can keep one handle while the
/// terminal owns the other.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events so far
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain the recorded events
    pub fn take(&self) -> Vec<SinkEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Concatenated markup of every append since the last clear
    pub fn appended_markup(&self) -> String {
        let events = self.events();
        let start = events
            .iter()
            .rposition(|event| *event == SinkEvent::Clear)
            .map_or(0, |i| i + 1);
        events[start..]
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Append(markup) => Some(markup.as_str()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: SinkEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl DisplaySink for RecordingSink {
    fn append(&mut self, fragment: &Fragment) {
        self.record(SinkEvent::Append(fragment.markup()));
    }

    fn erase(&mut self, removed: char) {
        self.record(SinkEvent::Erase(removed));
    }

    fn clear(&mut self) {
        self.record(SinkEvent::Clear);
    }

    fn scroll_to_end(&mut self) {
        self.record(SinkEvent::ScrollToEnd);
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        self.record(SinkEvent::Cursor(visible));
    }
}
