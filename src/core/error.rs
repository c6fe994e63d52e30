use std::io;
use std::time::Duration;
use thiserror::Error;

/// Error types for the raw NTP client
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("Socket error: {0}")]
    Socket(String),

    #[error("No response within {0:?}")]
    Timeout(Duration),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Error::Resolution(msg.into())
    }

    /// Creates a new socket error
    pub fn socket(msg: impl Into<String>) -> Self {
        Error::Socket(msg.into())
    }

    /// Creates a new malformed response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedResponse(msg.into())
    }

    /// Creates a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}
