//! bbsterm - terminal I/O engine for text-mode BBS games
//!
//! A scripted program writes styled text (ANSI SGR sequences) into a
//! [`Terminal`], optionally paced like a typist, and asks the user for lines
//! of input. Network notices may land at any moment, including while a line
//! is being typed, without corrupting it.
//!
//! # Quick Start
//!
//! ```no_run
//! use bbsterm::Terminal;
//!
//! # async fn demo() -> bbsterm::Result<()> {
//! let term = Terminal::headless();
//! term.println("\x1b[1;32mWelcome!\x1b[0m");
//! term.print_slow("Who goes there? ", None).await;
//! let name = term.request_line(None).await?;
//! term.println(&format!("Hello, {}", name));
//! # Ok(())
//! # }
//! ```
//!
//! Every write is kept twice: a plain-text transcript
//! ([`Terminal::raw_log`]) and a markup rendering ([`Terminal::rendered`])
//! that uses `<span class="...">` elements. The CSS for the class vocabulary
//! comes from [`ColorScheme::stylesheet`].

pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod ui;

pub use crate::config::{ColorScheme, Config};
pub use crate::core::input::{Key, KeyOutcome};
pub use crate::core::session::Terminal;
pub use crate::core::typing::TypingConfig;
pub use crate::error::{ConfigError, EngineError, Result};
pub use crate::events::{Notice, NoticeFeed};
pub use crate::ui::{ConsoleSink, DisplaySink, NullSink, RecordingSink};
