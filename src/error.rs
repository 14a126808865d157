//! Error types for package reading and round-trip writing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while reading, writing, or reconciling a package tree
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid file pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Failed to walk {}: {source}", path.display())]
    Traversal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load ignore rules from {}: {message}", path.display())]
    Ignore { path: PathBuf, message: String },

    #[error("Failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    #[error("{}: document {index} is not a resource (missing apiVersion or kind)", path.display())]
    NonResource { path: PathBuf, index: usize },

    #[error("Annotation error: {0}")]
    Annotation(String),

    #[error("Failed to encode {}: {message}", path.display())]
    Encode { path: PathBuf, message: String },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to delete {}: {source}", path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PackageError {
    /// Path the error refers to, when there is one
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            PackageError::Traversal { path, .. }
            | PackageError::Ignore { path, .. }
            | PackageError::Decode { path, .. }
            | PackageError::NonResource { path, .. }
            | PackageError::Encode { path, .. }
            | PackageError::Write { path, .. }
            | PackageError::Delete { path, .. } => Some(path),
            PackageError::Config(_)
            | PackageError::InvalidPattern { .. }
            | PackageError::Annotation(_) => None,
        }
    }
}

impl From<config::ConfigError> for PackageError {
    fn from(err: config::ConfigError) -> Self {
        PackageError::Config(err.to_string())
    }
}
