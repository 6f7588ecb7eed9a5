//! Source extraction: turns one module's source into [`ExtractedStrings`].

mod collector;
mod error;
mod html;
mod javascript;
mod syntax;

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

pub use error::ExtractionError;
pub use syntax::SourceSyntax;

use self::collector::StringsCollector;
use crate::config::{
    FileMatcher,
    MarkerConfig,
};
use crate::types::ExtractedStrings;

/// Produces the strings of a single source file.
///
/// `reference_path` is the path written into `file:line` references.
pub trait Extractor: Send + Sync + Debug {
    /// # Errors
    /// Returns `ExtractionError` if the source cannot be parsed.
    fn extract(
        &self,
        reference_path: &str,
        syntax: SourceSyntax,
        source: &str,
    ) -> Result<ExtractedStrings, ExtractionError>;
}

/// Built-in Tree-sitter extractor for scripts and HTML templates.
#[derive(Debug, Clone)]
pub struct GettextExtractor {
    /// Markers searched for in scripts.
    markers: Vec<MarkerConfig>,
}

impl GettextExtractor {
    /// Creates an extractor for `markers`.
    #[must_use]
    pub const fn new(markers: Vec<MarkerConfig>) -> Self {
        Self { markers }
    }
}

impl Extractor for GettextExtractor {
    fn extract(
        &self,
        reference_path: &str,
        syntax: SourceSyntax,
        source: &str,
    ) -> Result<ExtractedStrings, ExtractionError> {
        let language = syntax.tree_sitter_language();
        let mut collector = StringsCollector::new();

        if syntax.is_script() {
            javascript::extract_calls(
                source,
                &language,
                &self.markers,
                reference_path,
                &mut collector,
            )?;
        } else {
            html::extract_elements(source, &language, reference_path, &mut collector)?;
        }

        Ok(collector.into_strings())
    }
}

/// Applies the file filter before handing a module to the extractor.
#[derive(Debug, Clone)]
pub struct ExtractionAdapter {
    /// Decides which files are extracted.
    matcher: FileMatcher,
    /// Extracts the files that pass the matcher.
    extractor: Arc<dyn Extractor>,
}

impl ExtractionAdapter {
    /// Creates an adapter.
    #[must_use]
    pub fn new(matcher: FileMatcher, extractor: Arc<dyn Extractor>) -> Self {
        Self { matcher, extractor }
    }

    /// The file filter.
    #[must_use]
    pub const fn matcher(&self) -> &FileMatcher {
        &self.matcher
    }

    /// Extracts a loaded module.
    ///
    /// Returns `Ok(None)` for files that are filtered out; their content passes
    /// through the build untouched.
    ///
    /// # Errors
    /// Returns `ExtractionError` if an accepted file cannot be parsed.
    pub fn extract(
        &self,
        path: &Path,
        source: &str,
    ) -> Result<Option<ExtractedStrings>, ExtractionError> {
        let Some(syntax) = self.matcher.syntax_for(path) else {
            tracing::trace!(path = %path.display(), "Skipping file outside the extension filter");
            return Ok(None);
        };

        let reference_path = self.matcher.reference_path(path);
        let strings = self.extractor.extract(&reference_path, syntax, source)?;
        tracing::debug!(path = %reference_path, keys = strings.len(), "Extracted strings");

        Ok(Some(strings))
    }
}
