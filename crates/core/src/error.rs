//! Error types for kubesearch
//!
//! The tokenizer, index and searcher are total functions and have no error
//! paths. Errors only arise at the edges: configuration, feed wiring and
//! object resolution.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use thiserror::Error;

/// Result type alias for kubesearch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for kubesearch
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (config file reads and writes)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration could not be parsed or failed validation
    #[error("Config error: {0}")]
    Config(String),

    /// A change feed for this kind is already registered
    #[error("Duplicate kind: {0}")]
    DuplicateKind(String),

    /// The work queue for this kind no longer accepts events
    #[error("Feed closed for kind {0}")]
    FeedClosed(String),

    /// An indexed object could not be resolved in the object store
    #[error("Missing object for key {key} of kind {kind}")]
    MissingObject {
        /// Kind of the missing object
        kind: String,
        /// Object key that could not be resolved
        key: String,
    },

    /// The controller is already running
    #[error("Already started")]
    AlreadyStarted,

    /// Result encoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
