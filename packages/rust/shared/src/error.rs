//! Error types for PageLens.
//!
//! Library crates use [`PageLensError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Recoverable pipeline conditions (unreachable host, non-2xx response, a
//! model call that times out) are NOT errors in this sense: they travel
//! through the pipeline as `success=false` values. These variants cover the
//! structural tier — configuration problems, contract violations, and
//! genuine I/O failures.

use std::path::PathBuf;

/// Top-level error type for all PageLens operations.
#[derive(Debug, thiserror::Error)]
pub enum PageLensError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error that could not be represented as a soft failure.
    #[error("network error: {0}")]
    Network(String),

    /// Markup parsing or content extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Text generation error (API call failure, or a response not matching
    /// the requested contract).
    #[error("generation error: {0}")]
    Generation(String),

    /// Data validation error (malformed input, unsupported value).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PageLensError>;

impl PageLensError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
