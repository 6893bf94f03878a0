//! Terminal I/O engine.
//!
//! This module contains the engine behind every caller-facing operation:
//!
//! - **term**: SGR decoder, style resolver and markup renderer
//! - **buffer**: Session buffer (transcript + rendered mirror)
//! - **typing**: Character-paced output with clear-based cancellation
//! - **input**: Line input state machine
//! - **session**: `Terminal` handle tying it all together
//!
//! # Architecture
//!
//! ```text
//! Terminal
//! ├── SessionBuffer (raw log + fragments)
//! │   └── DisplaySink (platform surface)
//! ├── InputMachine (typed line + completion slot)
//! └── TypingConfig (pacing, generation-checked tasks)
//! ```

pub mod buffer;
pub mod input;
pub mod session;
pub mod term;
pub mod typing;
