//! Display surfaces and keyboard input.
//!
//! - **sink**: `DisplaySink` trait plus headless and recording sinks
//! - **renderer**: crossterm console sink
//! - **keymapper**: crossterm key events to engine keys
//!
//! Only this module touches the host terminal; the engine in `core` is
//! portable and testable without one.

pub mod keymapper;
pub mod renderer;
pub mod sink;

pub use keymapper::KeyMapper;
pub use renderer::ConsoleSink;
pub use sink::{DisplaySink, NullSink, RecordingSink, SinkEvent};
