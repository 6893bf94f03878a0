//! Error types

use std::io;
use thiserror::Error;

/// Errors raised by the terminal engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// `request_line` was called while another request was still waiting
    #[error("A line request is already outstanding")]
    InputPending,

    /// A line request was resolved twice
    #[error("Line request was already resolved")]
    AlreadyResolved,

    #[error("Terminal closed before the line request resolved")]
    Closed,

    #[error("Malformed notice frame: {0}")]
    MalformedNotice(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised while loading or saving the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Could not determine config path")]
    NoHome,
}
