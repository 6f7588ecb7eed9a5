//! Extraction errors.

use thiserror::Error;

/// Errors raised while extracting strings from a single source file.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Error when failing to set the language for the parser
    #[error("Failed to set language for parser: {0}")]
    LanguageSetup(#[from] tree_sitter::LanguageError),
    /// The source could not be parsed by the extraction grammar
    #[error("Failed to parse {path}")]
    ParseFailed {
        /// Reference path of the file.
        path: String,
    },
}
