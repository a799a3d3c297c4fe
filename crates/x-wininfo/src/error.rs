use std::result::Result as StdResult;

use thiserror::Error;

/// Errors that can occur while querying a display.
#[derive(Error, Debug)]
pub enum Error {
    /// The display could not be reached or refused the connection.
    #[error("Cannot open display {display}: {message}")]
    Connection {
        /// Display name as requested, or `$DISPLAY` when none was given.
        display: String,
        /// Reason reported by the transport.
        message: String,
    },

    /// A query was issued against a connection that is not open.
    #[error("Display connection is not open")]
    NotOpen,

    /// `open` was called on a connection that is already open.
    #[error("Display connection is already open")]
    AlreadyOpen,

    /// A single protocol request failed.
    #[error("{request} request failed: {message}")]
    Protocol {
        /// Protocol request name (e.g. "GetProperty").
        request: &'static str,
        /// Reason reported by the transport.
        message: String,
    },
}

/// Result alias for display queries.
pub type Result<T> = StdResult<T, Error>;
