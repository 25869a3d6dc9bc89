//! Common error types used throughout homereel.
//!
//! Failures that are local to one catalog entry never become an [`Error`];
//! the scanner logs and skips them. Everything else that crosses a module
//! boundary is expressed with this type.

/// Common error type for homereel.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested file or entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The listening port is already bound by another process.
    #[error("Address already in use: {0}")]
    PortInUse(String),

    /// A channel's folders contain no playable files.
    #[error("Channel has no playable files: {0}")]
    ChannelResolutionEmpty(String),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
