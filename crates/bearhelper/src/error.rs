use std::fmt;

/// Unified error type for the bearhelper crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelperError {
    /// Functionality not available in this build.
    NotImplemented,
    /// Invalid input provided by the caller.
    InvalidInput(String),
    /// The current platform cannot perform the operation.
    Unsupported(String),
    /// Internal error.
    Internal(String),
}

impl fmt::Display for HelperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HelperError::NotImplemented => write!(f, "not implemented"),
            HelperError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            HelperError::Unsupported(msg) => write!(f, "unsupported: {msg}"),
            HelperError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for HelperError {}

/// Result type alias using [`HelperError`].
pub type HelperResult<T> = Result<T, HelperError>;
