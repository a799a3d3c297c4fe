//! Error handling for the wininfo binary.

use std::{io, result};

use thiserror::Error;

/// Convenient result type for wininfo commands.
pub type Result<T> = result::Result<T, Error>;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrapper for standard I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Errors surfaced by the display connection.
    #[error("{0}")]
    Display(#[from] x_wininfo::Error),
    /// JSON encoding failed.
    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),
    /// RON encoding failed.
    #[error("RON output error: {0}")]
    Ron(#[from] ron::Error),
    /// Neither client list property could be read from the root window.
    #[error("window list unavailable")]
    WindowListUnavailable,
}
