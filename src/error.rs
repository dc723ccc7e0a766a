//! Error types for ez-unzip
//!
//! Codec adapters, the path allocator, junk cleanup and the unwinder all report
//! through [`Error`]. The engine entry points fold every error into
//! [`TaskState::Error`](crate::types::TaskState::Error); the typed error is
//! only visible through the `try_*` entry points.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ez-unzip operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ez-unzip
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "junk_names")
        key: Option<String>,
    },

    /// Codec adapter failure (extraction or compression)
    #[error("{0}")]
    Codec(#[from] CodecError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Destination already taken and the collision policy forbids a new name
    #[error("file collision at {path}: {reason}")]
    Collision {
        /// The path where the collision occurred
        path: PathBuf,
        /// The reason for the collision (e.g., "file already exists")
        reason: String,
    },

    /// A path that cannot be used as input or destination
    #[error("invalid path {path}: {reason}")]
    InvalidPath {
        /// The invalid path that was encountered
        path: PathBuf,
        /// The reason the path is invalid
        reason: String,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised by codec adapters and the directory walkers around them
#[derive(Debug, Error)]
pub enum CodecError {
    /// No adapter can decode this content
    #[error("unsupported format for {archive}: {reason}")]
    UnsupportedFormat {
        /// The archive that was rejected
        archive: PathBuf,
        /// What the adapter could not handle
        reason: String,
    },

    /// The destination directory could not be created
    #[error("failed to create directory {path}: {reason}")]
    DirectoryCreation {
        /// The directory that could not be created
        path: PathBuf,
        /// The underlying failure
        reason: String,
    },

    /// Corrupt archive or unsupported archive internals
    #[error("decompression failed for {archive}: {reason}")]
    Decode {
        /// The archive that failed to decode
        archive: PathBuf,
        /// The reason decoding failed
        reason: String,
    },

    /// Read or write failure while extracting or compressing
    #[error("I/O failure on {path}: {reason}")]
    Io {
        /// The file being read or written
        path: PathBuf,
        /// The underlying failure
        reason: String,
    },

    /// A directory could not be listed during cleanup or unwinding
    #[error("failed to scan directory {path}: {reason}")]
    DirectoryScan {
        /// The directory that could not be listed
        path: PathBuf,
        /// The underlying failure
        reason: String,
    },
}

impl CodecError {
    /// Build a [`CodecError::Decode`] from any displayable error
    pub fn decode(archive: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            archive: archive.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`CodecError::Io`] from any displayable error
    pub fn io(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`CodecError::DirectoryCreation`] from any displayable error
    pub fn directory_creation(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::DirectoryCreation {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`CodecError::DirectoryScan`] from any displayable error
    pub fn directory_scan(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::DirectoryScan {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
