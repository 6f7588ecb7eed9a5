//! Per-language compiled artifacts.

use std::fmt;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;

use super::compiler::{
    CatalogCompiler,
    compiler_for,
};
use crate::config::{
    LANG_PLACEHOLDER,
    ResultFileConfig,
};

/// Output path of an artifact for a language.
#[derive(Clone)]
pub enum OutputFileName {
    /// Path template; `{lang}` is replaced by the language code.
    Template(String),
    /// Computes the path from the language code.
    Function(Arc<dyn Fn(&str) -> PathBuf + Send + Sync>),
}

impl OutputFileName {
    /// Path for `language`, possibly relative.
    #[must_use]
    pub fn for_language(&self, language: &str) -> PathBuf {
        match self {
            Self::Template(template) => {
                PathBuf::from(template.replace(LANG_PLACEHOLDER, language))
            }
            Self::Function(name) => name(language),
        }
    }
}

impl fmt::Debug for OutputFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Rewrites compiled bytes before they are written.
pub type PostTransform = Arc<dyn Fn(Vec<u8>) -> Vec<u8> + Send + Sync>;

/// A compiled artifact produced for every language on flush.
#[derive(Clone)]
pub struct ResultFile {
    /// Where the artifact goes.
    pub filename: OutputFileName,
    /// Produces the artifact bytes.
    pub compiler: Arc<dyn CatalogCompiler>,
    /// Applied to the compiled bytes before writing.
    pub post_transform: Option<PostTransform>,
    /// Await the write before the pass completes. `false` writes in the background.
    pub save_file: bool,
}

impl ResultFile {
    /// An artifact with an awaited write and no post transform.
    #[must_use]
    pub fn new(filename: OutputFileName, compiler: Arc<dyn CatalogCompiler>) -> Self {
        Self { filename, compiler, post_transform: None, save_file: true }
    }

    /// Sets the post transform.
    #[must_use]
    pub fn with_post_transform(mut self, transform: PostTransform) -> Self {
        self.post_transform = Some(transform);
        self
    }

    /// Sets whether the write is awaited.
    #[must_use]
    pub const fn with_save_file(mut self, save_file: bool) -> Self {
        self.save_file = save_file;
        self
    }

    /// Output path for `language`; relative paths are resolved against `root`.
    #[must_use]
    pub fn path_for(&self, language: &str, root: &Path) -> PathBuf {
        root.join(self.filename.for_language(language))
    }
}

impl From<&ResultFileConfig> for ResultFile {
    fn from(config: &ResultFileConfig) -> Self {
        Self::new(OutputFileName::Template(config.filename.clone()), compiler_for(config))
            .with_save_file(config.save_file)
    }
}

impl fmt::Debug for ResultFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultFile")
            .field("filename", &self.filename)
            .field("compiler", &self.compiler)
            .field("post_transform", &self.post_transform.is_some())
            .field("save_file", &self.save_file)
            .finish()
    }
}
