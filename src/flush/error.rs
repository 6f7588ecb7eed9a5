//! Flush and compiler errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a catalog compiler.
#[derive(Error, Debug)]
pub enum CompileError {
    /// The compiled catalog could not be serialized.
    #[error("Failed to serialize compiled catalog: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The artifact text could not be assembled.
    #[error("Failed to format compiled catalog: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Errors raised while flushing catalogs. None of them abort the build.
#[derive(Error, Debug)]
pub enum FlushError {
    /// A catalog or artifact could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    CatalogWrite {
        /// File or directory that could not be written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An existing catalog could not be parsed.
    #[error("Failed to parse catalog {}: {message}", path.display())]
    CatalogParse {
        /// The unparsable catalog.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// A compiler failed on a result file.
    #[error("Failed to compile {}: {source}", filename.display())]
    Compile {
        /// Output path of the artifact.
        filename: PathBuf,
        /// Underlying error.
        #[source]
        source: CompileError,
    },

    /// The save callback reported an error.
    #[error("Save callback failed: {0}")]
    SaveCallback(String),
}

impl FlushError {
    /// Shorthand for [`FlushError::CatalogWrite`].
    pub(super) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CatalogWrite { path: path.into(), source }
    }
}
