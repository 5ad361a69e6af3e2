// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    /// The context was built without a wrapper (or the wrapper carried no
    /// session) and an operation needed one.
    #[error("execution context has no session attached")]
    MissingSession,

    #[error("session has no command registry attached")]
    MissingRegistry,

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("pipeline is empty")]
    EmptyPipeline,

    #[error("pipeline stage {0} is empty")]
    EmptyStage(usize),

    #[error("Invalid argument for {command}: {message}")]
    InvalidArgument { command: String, message: String },

    #[error("pipeline did not drain within {timeout_ms}ms ({pending} pending)")]
    DrainTimeout { timeout_ms: u64, pending: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ShellError {
    pub fn invalid_argument(command: impl Into<String>, message: impl Into<String>) -> Self {
        ShellError::InvalidArgument {
            command: command.into(),
            message: message.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ShellError>;
