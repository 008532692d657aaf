//! Error types for the NotLocalStorage client

use std::io;
use thiserror::Error;

/// Errors that can occur when talking to the NotLocalStorage service
#[derive(Error, Debug)]
pub enum Error {
    /// A credential was neither passed explicitly nor set in the environment
    #[error("Missing credential: pass it explicitly or set {0}")]
    MissingCredential(&'static str),

    /// The index key was empty
    #[error("Index key must not be empty")]
    EmptyKey,

    /// The service answered with a non-success status
    #[error("Service error (status {code} {reason}): {message}")]
    Status {
        /// HTTP status code
        code: u16,
        /// Canonical reason phrase for the status
        reason: String,
        /// Response body returned by the service, as text
        message: String,
    },

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Request timeout
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// TLS error
    #[error("TLS error: {0}")]
    Tls(String),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Malformed request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;
