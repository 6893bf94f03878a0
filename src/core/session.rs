//! Terminal session
//!
//! [`Terminal`] is the handle every caller writes through: the scripted
//! program, notification producers and the keyboard loop each hold a clone.
//!
//! Writes are applied in call order, at the end of the buffer, whether or not
//! a line request is waiting. When foreign output lands after the echo of a
//! pending line, the pending characters are echoed again on the next
//! keystroke so the line being edited is always the tail. While a slow print
//! is still typing, echo is held back and the pending line is drawn once the
//! print finishes.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;

use super::buffer::SessionBuffer;
use super::input::{InputMachine, Key, KeyOutcome};
use super::term::Span;
use super::typing::{self, TypingConfig};
use crate::error::{EngineError, Result};
use crate::ui::{DisplaySink, NullSink};

/// Shared handle to one terminal session
#[derive(Clone)]
pub struct Terminal {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    buffer: SessionBuffer,
    input: InputMachine,
    typing: TypingConfig,
    /// Bumped by `clear()`; typing tasks from older generations are dropped
    generation: u64,
    /// Slow prints currently emitting
    typing_tasks: usize,
}

/// Marks a slow print as finished, even if its future is dropped early
struct TypingGuard<'a> {
    terminal: &'a Terminal,
}

impl Drop for TypingGuard<'_> {
    fn drop(&mut self) {
        self.terminal.lock().finish_typing();
    }
}

impl Terminal {
    /// Create a terminal drawing into `sink`
    pub fn new(sink: impl DisplaySink + 'static) -> Self {
        Self::with_config(sink, TypingConfig::default())
    }

    pub fn with_config(sink: impl DisplaySink + 'static, typing: TypingConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                buffer: SessionBuffer::new(Box::new(sink)),
                input: InputMachine::new(),
                typing,
                generation: 0,
                typing_tasks: 0,
            })),
        }
    }

    /// Terminal without a display surface
    pub fn headless() -> Self {
        Self::new(NullSink)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wipe the session and cancel any in-flight typing.
    ///
    /// A waiting line request stays open; only keys resolve it.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.generation = inner.generation.wrapping_add(1);
        inner.buffer.clear();
        tracing::debug!("Session cleared, generation={}", inner.generation);
    }

    /// Append text, decoding SGR sequences
    pub fn print(&self, text: &str) {
        self.lock().buffer.append(text, true);
    }

    pub fn println(&self, text: &str) {
        self.print(&format!("{}\n", text));
    }

    /// Append text verbatim, without decoding escape sequences
    pub fn print_plain(&self, text: &str) {
        self.lock().buffer.append(text, false);
    }

    pub fn println_plain(&self, text: &str) {
        self.print_plain(&format!("{}\n", text));
    }

    /// Append pre-rendered markup (art blocks) without decoding it
    pub fn print_raw_markup(&self, markup: &str) {
        self.lock().buffer.append_raw(markup);
    }

    /// Append text one character at a time.
    ///
    /// Uses the configured speed unless `delay_ms` is given. With simulation
    /// off or a zero delay the text is appended at once, without yielding.
    pub async fn print_slow(&self, text: &str, delay_ms: Option<u64>) {
        let (units, delay, generation) = {
            let mut inner = self.lock();
            match inner.typing.delay_for(delay_ms) {
                Some(delay) => {
                    inner.typing_tasks += 1;
                    (typing::units(text), delay, inner.generation)
                }
                None => {
                    inner.buffer.append(text, true);
                    return;
                }
            }
        };
        let _guard = TypingGuard { terminal: self };
        typing::emit(self, units, delay, generation).await;
    }

    pub async fn println_slow(&self, text: &str, delay_ms: Option<u64>) {
        self.print_slow(&format!("{}\n", text), delay_ms).await;
    }

    /// Append one typed unit unless the session was cleared since the task
    /// started.
    pub(crate) fn push_typed(&self, generation: u64, unit: Span) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        inner.buffer.push_unit(unit);
        true
    }

    /// Wait for one line of input.
    ///
    /// Resolves on Enter with the typed line, or with `""` when Space is
    /// pressed on an empty line. Fails only if another request is still
    /// waiting.
    pub async fn request_line(&self, prompt: Option<&str>) -> Result<String> {
        let rx = self.begin_request(prompt)?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// Like [`request_line`](Self::request_line), but submits whatever has
    /// been typed once `timeout` elapses.
    pub async fn request_line_timeout(&self, prompt: Option<&str>, timeout: Duration) -> Result<String> {
        let mut rx = self.begin_request(prompt)?;
        match tokio::time::timeout(timeout, &mut rx).await {
            Ok(line) => line.map_err(|_| EngineError::Closed),
            Err(_) => {
                tracing::debug!("Line request timed out after {:?}, submitting", timeout);
                if let Err(err) = self.submit() {
                    tracing::debug!("Line request resolved before the timeout fired: {}", err);
                }
                rx.await.map_err(|_| EngineError::Closed)
            }
        }
    }

    fn begin_request(&self, prompt: Option<&str>) -> Result<oneshot::Receiver<String>> {
        let mut inner = self.lock();
        let rx = inner.input.begin()?;
        if let Some(prompt) = prompt {
            inner.buffer.append(prompt, true);
        }
        inner.buffer.sink_mut().set_cursor_visible(true);
        Ok(rx)
    }

    /// Feed one keystroke to the pending line request.
    pub fn press_key(&self, key: Key) -> KeyOutcome {
        self.lock().handle_key(key)
    }

    /// Resolve the pending request as if Enter was pressed.
    pub fn submit(&self) -> Result<String> {
        let mut inner = self.lock();
        if !inner.input.is_waiting() {
            tracing::warn!("Synthetic submit with no line request waiting");
            return Err(EngineError::AlreadyResolved);
        }
        match inner.handle_key(Key::Enter) {
            KeyOutcome::Submitted(line) => Ok(line),
            _ => Err(EngineError::AlreadyResolved),
        }
    }

    /// Turn typing simulation on or off for subsequent slow prints
    pub fn set_simulate_speed(&self, enabled: bool) {
        self.lock().typing.simulate_speed = enabled;
    }

    /// Default pause between characters for subsequent slow prints
    pub fn set_typing_speed(&self, ms: u64) {
        self.lock().typing.speed_ms = ms;
    }

    pub fn typing_config(&self) -> TypingConfig {
        self.lock().typing
    }

    /// Transcript of everything shown (visible text only)
    pub fn raw_log(&self) -> String {
        self.lock().buffer.raw_log().to_string()
    }

    /// Rendered log as markup
    pub fn rendered(&self) -> String {
        self.lock().buffer.rendered()
    }

    pub fn is_waiting(&self) -> bool {
        self.lock().input.is_waiting()
    }

    /// Characters typed so far for the waiting request
    pub fn pending_input(&self) -> String {
        self.lock().input.buffer().to_string()
    }
}

impl Inner {
    fn handle_key(&mut self, key: Key) -> KeyOutcome {
        // A foreign write (or a clear) landed after the echo of the pending
        // line: show the line again before editing it.
        let tail_foreign = !self.buffer.tail_is_echo();
        let redraw = self.input.is_waiting() && !self.input.buffer().is_empty() && tail_foreign;
        // A slow print is mid-line: echoing now would split it
        let deferred = self.typing_tasks > 0 && tail_foreign;

        let outcome = self.input.press(key);
        match &outcome {
            KeyOutcome::Ignored => {}
            KeyOutcome::Echoed(_) | KeyOutcome::Erased(_) if deferred => {}
            KeyOutcome::Echoed(ch) => {
                if redraw {
                    let line = self.input.buffer();
                    let before = &line[..line.len() - ch.len_utf8()];
                    before.chars().for_each(|c| self.buffer.echo(c));
                }
                self.buffer.echo(*ch);
            }
            KeyOutcome::Erased(_) => {
                if redraw {
                    self.input.buffer().chars().for_each(|c| self.buffer.echo(c));
                } else {
                    self.buffer.remove_last_rendered_unit();
                }
            }
            KeyOutcome::Submitted(line) => {
                if redraw || deferred {
                    line.chars().for_each(|c| self.buffer.echo(c));
                }
                self.buffer.commit_line(line);
                self.buffer.sink_mut().set_cursor_visible(false);
            }
            KeyOutcome::AnyKey => {
                self.buffer.sink_mut().set_cursor_visible(false);
            }
        }
        outcome
    }

    fn finish_typing(&mut self) {
        self.typing_tasks = self.typing_tasks.saturating_sub(1);
        if self.typing_tasks == 0 {
            self.redraw_pending();
        }
    }

    /// Echo the pending line again if something else was drawn after it
    fn redraw_pending(&mut self) {
        if self.input.is_waiting() && !self.input.buffer().is_empty() && !self.buffer.tail_is_echo() {
            let line = self.input.buffer().to_string();
            line.chars().for_each(|c| self.buffer.echo(c));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{RecordingSink, SinkEvent};
    use tokio::time::Instant;

    fn type_str(term: &Terminal, s: &str) {
        for ch in s.chars() {
            term.press_key(Key::Char(ch));
        }
    }

    /// Let spawned tasks run up to their next suspension point
    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_print_and_println() {
        let term = Terminal::headless();
        term.print("\x1b[1;31mHi\x1b[0mThere");
        term.println(" & more");
        term.println_plain("\x1b[1m");
        assert_eq!(term.raw_log(), "HiThere & more\n\x1b[1m\n");
        assert_eq!(
            term.rendered(),
            "<span class=\"bold ansi-1\">Hi</span>There &amp; more\n\x1b[1m\n"
        );
    }

    #[test]
    fn test_raw_markup_bypasses_decoder() {
        let term = Terminal::headless();
        term.print_raw_markup("<pre class=\"art\">\x1b[31m&lt;3</pre>");
        assert_eq!(term.rendered(), "<pre class=\"art\">\x1b[31m&lt;3</pre>");
        assert_eq!(term.raw_log(), "\x1b[31m<3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_line_with_backspace() {
        let term = Terminal::headless();
        let reader = term.clone();
        let task = tokio::spawn(async move { reader.request_line(Some("> ")).await });
        settle().await;
        assert!(term.is_waiting());

        type_str(&term, "ab");
        assert_eq!(term.press_key(Key::Backspace), KeyOutcome::Erased('b'));
        type_str(&term, "c");
        assert_eq!(term.press_key(Key::Enter), KeyOutcome::Submitted("ac".into()));

        assert_eq!(task.await.unwrap().unwrap(), "ac");
        assert_eq!(term.raw_log(), "> ac\n");
        assert_eq!(term.rendered(), "&gt; ac\n");
        assert!(!term.is_waiting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_notifications_do_not_corrupt_input() {
        let term = Terminal::headless();
        let reader = term.clone();
        let task = tokio::spawn(async move { reader.request_line(None).await });
        settle().await;

        let notifier = term.clone();
        type_str(&term, "a");
        notifier.println("\x1b[36m[chat] bob: hi");
        type_str(&term, "b");
        notifier.println("*** broadcast ***");
        term.press_key(Key::Backspace);
        type_str(&term, "c");
        term.press_key(Key::Enter);

        assert_eq!(task.await.unwrap().unwrap(), "ac");
        let log = term.raw_log();
        assert_eq!(log, "[chat] bob: hi\n*** broadcast ***\nac\n");
        assert!(log.ends_with("ac\n"));
        // The pending line is redrawn below each notification before editing
        assert_eq!(
            term.rendered(),
            "a<span class=\"ansi-6\">[chat] bob: hi</span>\nab*** broadcast ***\nac\n"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_during_slow_print_is_drawn_after_it() {
        let term = Terminal::headless();
        let reader = term.clone();
        let task = tokio::spawn(async move { reader.request_line(Some("> ")).await });
        settle().await;

        let writer = term.clone();
        let notice = tokio::spawn(async move { writer.print_slow("xyz", Some(10)).await });
        settle().await;
        assert_eq!(term.rendered(), "&gt; x");

        // Keys pressed mid-print are buffered, not echoed between its characters
        type_str(&term, "ab");
        tokio::time::sleep(Duration::from_millis(12)).await;
        term.press_key(Key::Backspace);
        type_str(&term, "c");
        assert_eq!(term.rendered(), "&gt; xy");

        notice.await.unwrap();
        assert_eq!(term.rendered(), "&gt; xyzac");

        type_str(&term, "d");
        term.press_key(Key::Enter);
        assert_eq!(task.await.unwrap().unwrap(), "acd");
        assert_eq!(term.rendered(), "&gt; xyzacd\n");
        assert_eq!(term.raw_log(), "> xyzacd\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_any_key_resolves_empty_without_echo() {
        let sink = RecordingSink::new();
        let term = Terminal::new(sink.clone());
        let reader = term.clone();
        let task = tokio::spawn(async move { reader.request_line(Some("Press any key")).await });
        settle().await;

        assert_eq!(term.press_key(Key::Char(' ')), KeyOutcome::AnyKey);
        assert_eq!(task.await.unwrap().unwrap(), "");
        assert_eq!(term.raw_log(), "Press any key");
        assert_eq!(
            sink.events(),
            vec![
                SinkEvent::Append("Press any key".into()),
                SinkEvent::ScrollToEnd,
                SinkEvent::Cursor(true),
                SinkEvent::Cursor(false),
            ]
        );
    }

    #[tokio::test]
    async fn test_second_request_is_rejected() {
        let term = Terminal::headless();
        let reader = term.clone();
        let first = tokio::spawn(async move { reader.request_line(None).await });
        settle().await;

        let second = term.request_line(Some("never shown")).await;
        assert!(matches!(second, Err(EngineError::InputPending)));
        assert_eq!(term.raw_log(), "");

        type_str(&term, "ok");
        term.press_key(Key::Enter);
        assert_eq!(first.await.unwrap().unwrap(), "ok");
    }

    #[test]
    fn test_submit_without_request_is_detected() {
        let term = Terminal::headless();
        assert!(matches!(term.submit(), Err(EngineError::AlreadyResolved)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_submits_pending_input() {
        let term = Terminal::headless();
        let reader = term.clone();
        let task = tokio::spawn(async move {
            reader
                .request_line_timeout(Some("? "), Duration::from_secs(5))
                .await
        });
        settle().await;
        type_str(&term, "par");

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(task.await.unwrap().unwrap(), "par");
        assert_eq!(term.raw_log(), "? par\n");
        assert!(matches!(term.submit(), Err(EngineError::AlreadyResolved)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_print_suspends_between_characters() {
        let term = Terminal::headless();
        let writer = term.clone();
        let task = tokio::spawn(async move { writer.print_slow("hi", Some(10)).await });

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(term.raw_log(), "h");
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(term.raw_log(), "hi");
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_print_is_atomic_without_delay() {
        let sink = RecordingSink::new();
        let term = Terminal::new(sink.clone());
        let start = Instant::now();

        term.print_slow("hi", Some(0)).await;
        term.set_simulate_speed(false);
        term.println_slow("\x1b[32mthere", Some(50)).await;

        assert_eq!(Instant::now(), start);
        assert_eq!(term.raw_log(), "hithere\n");
        let appends = sink
            .events()
            .into_iter()
            .filter(|event| matches!(event, SinkEvent::Append(_)))
            .count();
        assert_eq!(appends, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_typing() {
        let term = Terminal::headless();
        let writer = term.clone();
        let task = tokio::spawn(async move { writer.print_slow("abcde", Some(10)).await });

        tokio::time::sleep(Duration::from_millis(15)).await;
        assert_eq!(term.raw_log(), "ab");
        term.clear();
        term.print("after");

        task.await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(term.raw_log(), "after");
        assert_eq!(term.rendered(), "after");
    }

    #[tokio::test(start_paused = true)]
    async fn test_speed_changes_apply_to_later_calls() {
        let term = Terminal::headless();
        term.set_typing_speed(100);
        let writer = term.clone();
        let task = tokio::spawn(async move { writer.print_slow("xyz", None).await });
        settle().await;
        term.set_typing_speed(1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(term.raw_log(), "xy");
        task.await.unwrap();
        assert_eq!(term.raw_log(), "xyz");
        assert_eq!(term.typing_config().speed_ms, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_keeps_request_open() {
        let term = Terminal::headless();
        let reader = term.clone();
        let task = tokio::spawn(async move { reader.request_line(None).await });
        settle().await;

        type_str(&term, "xy");
        term.clear();
        assert!(term.is_waiting());
        assert_eq!(term.pending_input(), "xy");

        // Next key redraws the pending line on the cleared surface
        type_str(&term, "z");
        assert_eq!(term.rendered(), "xyz");
        term.press_key(Key::Enter);
        assert_eq!(task.await.unwrap().unwrap(), "xyz");
        assert_eq!(term.raw_log(), "xyz\n");
    }
}
