//! Unified error types for the layercopy workspace.
//!
//! Every failure is returned to the immediate caller as a value. Nothing in
//! the workspace retries an operation or rolls back partially written state.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum LayercopyError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Recursively copying a directory tree failed.
    #[error("copy {from} -> {to} failed: {source}")]
    Copy {
        /// Source directory of the copy.
        from: PathBuf,
        /// Destination directory of the copy.
        to: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Decoding or materializing an archive failed.
    #[error("extracting archive into {dest} failed: {source}")]
    Extract {
        /// Directory the archive was being extracted into.
        dest: PathBuf,
        /// Underlying error reported by the decoder.
        source: std::io::Error,
    },

    /// Rewriting the ownership of a filesystem entry failed.
    #[error("changing ownership of {path} failed: {source}")]
    Ownership {
        /// Entry whose ownership could not be changed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A resource that must be created fresh is already present.
    #[error("{kind} already exists: {id}")]
    AlreadyExists {
        /// Type of the existing resource.
        kind: &'static str,
        /// Identifier of the existing resource.
        id: String,
    },

    /// An identifier cannot be used to derive a storage path.
    #[error("invalid {kind} {id:?}: {reason}")]
    InvalidIdentifier {
        /// Type of the identifier.
        kind: &'static str,
        /// The rejected value.
        id: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A caller supplied arguments that violate an operation's preconditions.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the violated precondition.
        message: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// Building the runtime spec descriptor failed.
    #[error("runtime spec error: {source}")]
    Spec {
        /// Underlying builder error.
        #[from]
        source: oci_spec::OciSpecError,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, LayercopyError>;
