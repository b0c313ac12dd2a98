//! Error types for the protoalias-core library.
//!
//! This module provides error handling using the `thiserror` crate. Errors are
//! split between request-level failures (a bad request or parameter aborts the
//! whole plugin run) and file-scoped failures (only the affected file stops
//! generating, see [`Error::is_file_scoped`]).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for protoalias operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all protoalias operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to write a generated file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to create output directory
    #[error("failed to create directory '{path}': {source}")]
    DirectoryCreate {
        /// Path to the directory that failed to create
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Path traversal attempt detected (security error)
    #[error("path traversal detected: '{path}' would escape output directory")]
    PathTraversal {
        /// The suspicious path
        path: PathBuf,
    },

    /// Failed to decode a protobuf message (request or descriptor)
    #[error("failed to decode descriptor: {0}")]
    DescriptorParse(#[from] prost::DecodeError),

    /// Resolved descriptors no longer form a valid schema
    #[error("failed to build file descriptor: {0}")]
    DescriptorBuild(String),

    /// Unsupported proto syntax version
    #[error("unsupported proto syntax: '{syntax}'")]
    UnsupportedSyntax {
        /// The unsupported syntax string
        syntax: String,
    },

    /// The semantic model and the raw descriptor have diverged in shape
    #[error("descriptor mirror mismatch in '{file}' at message {message}{}: {details}", field_suffix(.field))]
    MirrorMismatch {
        /// File being resolved
        file: String,
        /// Message name and index, e.g. `Holder[2]`
        message: String,
        /// Field name and index, if the mismatch is field-level
        field: Option<String>,
        /// What did not line up
        details: String,
    },

    /// Malformed or unknown plugin parameter
    #[error("invalid plugin parameter '{name}': {details}")]
    InvalidParameter {
        /// Parameter name as passed by protoc
        name: String,
        /// Why it was rejected
        details: String,
    },

    /// The deprecated `plugins=` parameter was used
    #[error("plugins are not supported; use a dedicated gRPC plugin to generate service code")]
    PluginsUnsupported,
}

fn field_suffix(field: &Option<String>) -> String {
    field
        .as_ref()
        .map(|f| format!(", field {f}"))
        .unwrap_or_default()
}

impl Error {
    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new directory creation error
    pub fn directory_create(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryCreate {
            path: path.into(),
            source,
        }
    }

    /// Creates a new path traversal error
    pub fn path_traversal(path: impl Into<PathBuf>) -> Self {
        Self::PathTraversal { path: path.into() }
    }

    /// Creates a new descriptor build error
    pub fn descriptor_build(msg: impl Into<String>) -> Self {
        Self::DescriptorBuild(msg.into())
    }

    /// Creates a message-level mirror mismatch error
    pub fn message_mismatch(
        file: impl Into<String>,
        message: &str,
        message_index: usize,
        details: impl Into<String>,
    ) -> Self {
        Self::MirrorMismatch {
            file: file.into(),
            message: format!("{message}[{message_index}]"),
            field: None,
            details: details.into(),
        }
    }

    /// Creates a field-level mirror mismatch error
    pub fn field_mismatch(
        file: impl Into<String>,
        (message, message_index): (&str, usize),
        (field, field_index): (&str, usize),
        details: impl Into<String>,
    ) -> Self {
        Self::MirrorMismatch {
            file: file.into(),
            message: format!("{message}[{message_index}]"),
            field: Some(format!("{field}[{field_index}]")),
            details: details.into(),
        }
    }

    /// Creates a new invalid parameter error
    pub fn invalid_parameter(name: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            details: details.into(),
        }
    }

    /// Returns true if this error only aborts generation of the current file
    pub fn is_file_scoped(&self) -> bool {
        matches!(self, Self::MirrorMismatch { .. })
    }
}
