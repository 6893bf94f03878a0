//! ANSI text pipeline
//!
//! ```text
//! line ──parser::decode──> tokens ──style::resolve──> spans ──markup::render_spans──> markup
//! ```

pub mod markup;
pub mod parser;
pub mod style;

pub use markup::{render, render_text};
pub use parser::{decode, Token};
pub use style::{Span, StyleFlags, StyleSet};
