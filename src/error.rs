//! Error types for the ia-backup library.

use thiserror::Error;

/// Errors that can occur while discovering, listing or transferring files.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level HTTP failure (timeout, DNS, connection reset).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote service answered with an unexpected status code.
    #[error("unexpected status {status} while {context}")]
    Status {
        /// HTTP status code returned by the service.
        status: u16,
        /// What was being attempted when the status came back.
        context: &'static str,
    },

    /// The identifier has no backing storage bucket.
    #[error("identifier '{identifier}' not found (no such bucket)")]
    IdentifierNotFound {
        /// The identifier that failed to resolve.
        identifier: String,
    },

    /// A remote response body could not be parsed (JSON or XML).
    #[error("parse error: {0}")]
    Parse(String),

    /// The bucket listing was truncated by the remote service; treating it
    /// as complete would silently drop files.
    #[error("bucket listing is truncated; file set is incomplete")]
    PartialListing,

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for ia-backup operations.
pub type Result<T> = std::result::Result<T, Error>;
