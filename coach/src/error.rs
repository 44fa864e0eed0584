//! Error types for the coach binary and configuration layer.

use std::path::PathBuf;

use chess_core::FenError;
use thiserror::Error;

/// Errors surfaced outside the turn loop: configuration, I/O and
/// command-line input.
#[derive(Error, Debug)]
pub enum CoachError {
    /// Reading or writing a file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Terminal output failed
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    /// A configuration file was not valid JSON for [`crate::CoachConfig`]
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A position given on the command line could not be parsed
    #[error("Invalid position: {0}")]
    Position(#[from] FenError),
}

/// Result type alias for coach operations
pub type CoachResult<T> = Result<T, CoachError>;
