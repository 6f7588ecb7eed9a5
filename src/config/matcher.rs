//! Decides which source files are extracted and how their references are written.

use std::collections::BTreeMap;
use std::path::{
    Component,
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};

use super::PluginSettings;
use crate::extract::SourceSyntax;

/// Errors raised while building a [`FileMatcher`].
#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    /// An exclude pattern is not a valid glob.
    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidExcludePattern {
        /// The pattern as configured.
        pattern: String,
        /// Underlying error.
        #[source]
        source: globset::Error,
    },

    /// The compiled glob set could not be built.
    #[error("Failed to build glob set: {0}")]
    GlobSetBuild(#[from] globset::Error),
}

/// Matches files against the extension allow-list and exclude patterns.
#[derive(Debug, Clone)]
pub struct FileMatcher {
    /// References are relative to this directory.
    base_dir: PathBuf,
    /// Allow-list: extension to grammar.
    extensions: BTreeMap<String, SourceSyntax>,
    /// Compiled `excludePatterns`.
    exclude_set: GlobSet,
}

impl FileMatcher {
    /// Creates a new matcher from settings.
    pub fn new(base_dir: PathBuf, settings: &PluginSettings) -> Result<Self, MatcherError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &settings.exclude_patterns {
            let glob = Glob::new(pattern).map_err(|source| MatcherError::InvalidExcludePattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }

        Ok(Self {
            base_dir,
            extensions: settings.extensions.clone(),
            exclude_set: builder.build()?,
        })
    }

    /// Directory references are relative to.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the grammar to extract `path` with, or `None` if the file is
    /// not on the allow-list or is excluded.
    #[must_use]
    pub fn syntax_for(&self, path: &Path) -> Option<SourceSyntax> {
        let ext = path.extension()?.to_str()?;
        let syntax = *self.extensions.get(ext)?;

        let excluded = self.exclude_set.is_match(path)
            || path
                .strip_prefix(&self.base_dir)
                .is_ok_and(|relative| self.exclude_set.is_match(relative));

        (!excluded).then_some(syntax)
    }

    /// Path written into `file:line` references: relative to the base
    /// directory when possible, always with `/` separators.
    #[must_use]
    pub fn reference_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.base_dir).unwrap_or(path);

        relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                Component::ParentDir => Some("..".to_string()),
                Component::RootDir | Component::Prefix(_) | Component::CurDir => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn matcher(exclude: &[&str]) -> FileMatcher {
        let settings = PluginSettings {
            exclude_patterns: exclude.iter().copied().map(String::from).collect(),
            ..PluginSettings::default()
        };
        FileMatcher::new(PathBuf::from("/workspace"), &settings).expect("valid patterns")
    }

    #[rstest]
    #[case::js("/workspace/src/app.js", Some(SourceSyntax::JavaScript))]
    #[case::ts("/workspace/src/app.ts", Some(SourceSyntax::TypeScript))]
    #[case::tsx("/workspace/src/App.tsx", Some(SourceSyntax::Tsx))]
    #[case::html("/workspace/views/index.html", Some(SourceSyntax::Html))]
    #[case::not_allowed("/workspace/README.md", None)]
    #[case::no_extension("/workspace/Makefile", None)]
    #[case::excluded("/workspace/node_modules/lib/index.js", None)]
    #[case::outside_base_dir("/other/app.js", Some(SourceSyntax::JavaScript))]
    fn test_syntax_for(#[case] path: &str, #[case] expected: Option<SourceSyntax>) {
        assert_eq!(matcher(&["**/node_modules/**"]).syntax_for(Path::new(path)), expected);
    }

    #[rstest]
    fn relative_exclude_pattern_matches_under_base_dir() {
        let matcher = matcher(&["vendor/**"]);

        assert_eq!(matcher.syntax_for(Path::new("/workspace/vendor/angular.js")), None);
        assert_eq!(
            matcher.syntax_for(Path::new("/workspace/src/vendor.js")),
            Some(SourceSyntax::JavaScript)
        );
    }

    #[rstest]
    fn custom_extension_list_is_honoured() {
        let mut extensions = BTreeMap::new();
        extensions.insert("vue".to_string(), SourceSyntax::Html);
        let settings = PluginSettings { extensions, ..PluginSettings::default() };
        let matcher = FileMatcher::new(PathBuf::from("/workspace"), &settings).unwrap();

        assert_eq!(matcher.syntax_for(Path::new("/workspace/App.vue")), Some(SourceSyntax::Html));
        assert_eq!(matcher.syntax_for(Path::new("/workspace/app.js")), None);
    }

    #[rstest]
    #[case::under_base_dir("/workspace/src/app.js", "src/app.js")]
    #[case::outside_base_dir("/other/app.js", "other/app.js")]
    #[case::relative_input("src/app.js", "src/app.js")]
    fn test_reference_path(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(matcher(&[]).reference_path(Path::new(path)), expected);
    }

    #[rstest]
    fn new_with_invalid_exclude_pattern() {
        let settings = PluginSettings {
            exclude_patterns: vec!["[invalid".to_string()],
            ..PluginSettings::default()
        };

        let result = FileMatcher::new(PathBuf::from("/workspace"), &settings);

        assert!(matches!(result, Err(MatcherError::InvalidExcludePattern { .. })));
    }
}
