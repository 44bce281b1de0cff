//! Crate-level error type.
//!
//! Network failures never escape the comparison controller; they are folded
//! into an [`Outcome`](crate::client::Outcome) at the issuer boundary. This
//! enum covers everything else: local validation, configuration and file I/O,
//! plus the transport/protocol split used by the upload and CLI paths.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompareError {
    /// Input rejected before any request was made.
    #[error("{0}")]
    Validation(String),

    /// The request could not be completed (connect, timeout, body read).
    #[error("{0}")]
    Transport(String),

    /// The server answered, but with a non-2xx status or an in-band error.
    #[error("{message}")]
    Protocol { status: Option<u16>, message: String },

    /// The configuration file could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CompareError {
    /// True for errors raised before touching the network.
    pub fn is_validation(&self) -> bool {
        matches!(self, CompareError::Validation(_))
    }
}

impl From<reqwest::Error> for CompareError {
    fn from(e: reqwest::Error) -> Self {
        CompareError::Transport(e.to_string())
    }
}
