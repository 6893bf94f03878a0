//! Typing simulation
//!
//! Emits text one visible character at a time with a fixed pause between
//! characters. A task is tied to the buffer generation it started in; once
//! `clear()` bumps the generation, its remaining characters are dropped.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::session::Terminal;
use crate::core::term::style::{self, Span};

/// Default pause between characters
pub const DEFAULT_SPEED_MS: u64 = 15;

/// Pacing settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingConfig {
    /// Master switch; when off every slow print is instant
    pub simulate_speed: bool,
    /// Default pause between characters, in milliseconds
    pub speed_ms: u64,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            simulate_speed: true,
            speed_ms: DEFAULT_SPEED_MS,
        }
    }
}

impl TypingConfig {
    /// Pause to use for a slow print, or `None` if it should be instant.
    pub fn delay_for(&self, requested_ms: Option<u64>) -> Option<Duration> {
        let ms = requested_ms.unwrap_or(self.speed_ms);
        (self.simulate_speed && ms > 0).then(|| Duration::from_millis(ms))
    }
}

/// Split styled text into single-character units, each keeping its style.
pub fn units(text: &str) -> Vec<Span> {
    style::resolve_text(text)
        .into_iter()
        .flat_map(|span| {
            let style = span.style;
            span.text
                .chars()
                .map(move |ch| Span::new(style, ch.to_string()))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Emit `units` into `terminal`, pausing `delay` between them.
///
/// Stops as soon as a write is refused because the buffer was cleared.
pub(crate) async fn emit(terminal: &Terminal, units: Vec<Span>, delay: Duration, generation: u64) {
    let total = units.len();
    for (emitted, unit) in units.into_iter().enumerate() {
        if emitted > 0 {
            tokio::time::sleep(delay).await;
        }
        if !terminal.push_typed(generation, unit) {
            tracing::debug!(
                "Typing task cancelled by clear: emitted={}, dropped={}",
                emitted,
                total - emitted
            );
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::term::StyleSet;

    #[test]
    fn test_delay_for() {
        let config = TypingConfig::default();
        assert_eq!(config.delay_for(None), Some(Duration::from_millis(DEFAULT_SPEED_MS)));
        assert_eq!(config.delay_for(Some(40)), Some(Duration::from_millis(40)));
        assert_eq!(config.delay_for(Some(0)), None);

        let off = TypingConfig {
            simulate_speed: false,
            ..TypingConfig::default()
        };
        assert_eq!(off.delay_for(Some(40)), None);
    }

    #[test]
    fn test_units_keep_style_per_character() {
        let red = StyleSet::from_params("31");
        assert_eq!(
            units("\x1b[31mhi\x1b[0m!\n"),
            vec![
                Span::new(red, "h"),
                Span::new(red, "i"),
                Span::plain("!"),
                Span::plain("\n"),
            ]
        );
        assert!(units("\x1b[1m").is_empty());
    }
}
