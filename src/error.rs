//! Error types for treetidy.
//!
//! `OrganizeError` covers failures that abort a run before any file is touched.
//! Failures tied to a single file are recorded as `FileError` values inside the
//! run's outcomes and never abort the traversal.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that stop a run (or prevent it from starting).
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// Invalid or missing settings. Reported before traversal starts.
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    /// The source or target tree cannot be used.
    #[error("Cannot use {}: {reason}", path.display())]
    Structural { path: PathBuf, reason: String },

    /// Anything that does not fit the categories above.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OrganizeError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn structural(path: &Path, reason: impl Into<String>) -> Self {
        Self::Structural {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Process exit status for this error class.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration { .. } => 2,
            Self::Structural { .. } => 3,
            Self::Internal(_) => 1,
        }
    }
}

/// Result type for whole-run operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// The step at which processing of a single file failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileErrorKind {
    /// Reading the file's metadata (needed for classification) failed.
    Metadata,
    /// The walk could not enter or list an entry below the source root.
    Walk,
    /// The destination's parent directory could not be created.
    CreateDir,
    /// The copy or move itself failed.
    Transfer,
}

/// A failure confined to one file. The run records it and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct FileError {
    pub path: PathBuf,
    pub kind: FileErrorKind,
    pub message: String,
}

impl FileError {
    pub fn new(path: &Path, kind: FileErrorKind, source: &std::io::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            kind,
            message: source.to_string(),
        }
    }
}
