use std::io;
use std::time::Duration;
use thiserror::Error;

/// Custom error type for hostpulse
#[derive(Error, Debug)]
pub enum PulseError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Command failed: {0}")]
    Command(String),

    #[error("{what} timed out after {after:?}")]
    Timeout { what: String, after: Duration },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Broadcaster error: {0}")]
    Broadcaster(String),

    #[error("Startup failed: {0}")]
    Startup(String),
}

/// Result type alias for hostpulse
pub type Result<T> = std::result::Result<T, PulseError>;

impl PulseError {
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        PulseError::Parse(msg.into())
    }

    pub fn command<S: Into<String>>(msg: S) -> Self {
        PulseError::Command(msg.into())
    }

    pub fn timeout<S: Into<String>>(what: S, after: Duration) -> Self {
        PulseError::Timeout {
            what: what.into(),
            after,
        }
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        PulseError::Config(msg.into())
    }

    /// Create an invalid input error (caller-supplied data rejected before any side effect)
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        PulseError::InvalidInput(msg.into())
    }

    pub fn broadcaster<S: Into<String>>(msg: S) -> Self {
        PulseError::Broadcaster(msg.into())
    }

    pub fn startup<S: Into<String>>(msg: S) -> Self {
        PulseError::Startup(msg.into())
    }

    /// True when the error was caused by caller input rather than the host
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, PulseError::InvalidInput(_))
    }
}
