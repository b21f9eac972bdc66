//! Error types for the ring transport.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RingError>;

/// Errors produced by construction, open, and close paths.
///
/// Hot-path signals (ring full, no data, overtake, corrupt slot) are never
/// represented as errors — `next_to_dispatch`, `fetch`, `available_to_fetch`,
/// and friends return sentinel values instead, so the busy-spin loops that
/// drive this crate never allocate or unwind.
#[derive(Error, Debug)]
pub enum RingError {
    /// The backing region could not be created, extended, or mapped.
    #[error("failed to acquire shared memory region: {0}")]
    ResourceAcquisition(#[from] std::io::Error),

    /// A supplied parameter does not match what is persisted in, or implied
    /// by, an existing backing file.
    #[error("configuration mismatch for {field}: expected {expected}, found {actual}")]
    ConfigurationMismatch {
        /// Name of the mismatched field (e.g. "capacity").
        field: &'static str,
        /// Value the caller supplied or the binary expects.
        expected: String,
        /// Value actually found.
        actual: String,
    },

    /// Capacity or consumer count was requested to be inferred from a file
    /// that does not exist.
    #[error("cannot infer ring parameters: {path} does not exist")]
    FileNotFound {
        /// Path that was expected to exist.
        path: String,
    },

    /// A supplied argument is out of its valid domain.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of why the argument is invalid.
        message: String,
    },
}

impl RingError {
    /// Build an [`RingError::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument { message: message.into() }
    }

    /// Build a [`RingError::ConfigurationMismatch`].
    pub fn config_mismatch(
        field: &'static str,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display
    ) -> Self {
        Self::ConfigurationMismatch {
            field,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Build a [`RingError::FileNotFound`].
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }
}
