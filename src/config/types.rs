//! Settings types and their validation.

use std::collections::{
    BTreeMap,
    HashSet,
};
use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use super::languages::is_known_language_code;
use crate::extract::SourceSyntax;

/// Placeholder replaced by the language code in path templates.
pub const LANG_PLACEHOLDER: &str = "{lang}";

/// A single invalid setting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "excludePatterns[0]")
    pub field_path: String,
    /// What is wrong, with an example of a valid value.
    pub message: String,
}

impl ValidationError {
    /// Creates an error for `field_path`.
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

/// Errors raised while loading or validating settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Every validation problem of the settings.
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    /// The configuration file could not be read.
    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// The configuration file is not valid JSON for the settings.
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Renders validation errors as a numbered list.
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// When a merge pass asks for a catalog flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FlushPolicy {
    /// Flush only when new (key, context) pairs appeared.
    #[default]
    NewKeys,
    /// Flush whenever the key table differs from the last flushed state,
    /// including reference and comment changes.
    SnapshotDiff,
}

/// What a flush appends to the per-language catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FlushScope {
    /// Only the pairs of the delta set.
    #[default]
    Delta,
    /// The whole key table; metadata of known entries is refreshed too.
    FullTable,
}

/// Output format of a compiled result file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputFormat {
    /// `{lang: {msgid: translation}}` JSON.
    #[default]
    Json,
    /// Angular module calling `gettextCatalog.setStrings`.
    Javascript,
}

/// A gettext call marker, e.g. `gettextCatalog.getString(msgid, scope, context)`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerConfig {
    /// Callee as written in source (`gettext`, `gettextCatalog.getString`).
    pub name: String,
    /// Argument index of the message id.
    #[serde(default)]
    pub msgid_index: usize,
    /// Argument index of the context, if the marker takes one.
    #[serde(default)]
    pub context_index: Option<usize>,
}

impl MarkerConfig {
    /// Creates a marker.
    #[must_use]
    pub fn new(name: impl Into<String>, msgid_index: usize, context_index: Option<usize>) -> Self {
        Self { name: name.into(), msgid_index, context_index }
    }
}

/// A compiled artifact written for each language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultFileConfig {
    /// Output path; `{lang}` is replaced by the language code.
    pub filename: String,
    /// Compiler used for the artifact.
    #[serde(default)]
    pub format: OutputFormat,
    /// Angular module name used by the `javascript` format.
    #[serde(default = "default_module_name")]
    pub module_name: String,
    /// Wait for the write before the build continues. `false` writes in the background.
    #[serde(default = "default_save_file")]
    pub save_file: bool,
}

/// Default angular module name.
fn default_module_name() -> String {
    "gettext".to_string()
}

/// Artifacts are written synchronously by default.
const fn default_save_file() -> bool {
    true
}

/// Settings of the extraction plugin (`.gettext-extract.json`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginSettings {
    /// Extension allow-list (without the dot), each mapped to its grammar.
    pub extensions: BTreeMap<String, SourceSyntax>,

    /// Glob patterns of files never extracted.
    pub exclude_patterns: Vec<String>,

    /// References are written relative to this directory.
    /// Defaults to the workspace root.
    pub base_dir: Option<PathBuf>,

    /// Target languages.
    ///
    /// When empty and `po_files` is set, languages are detected from the
    /// existing PO files.
    pub lang_list: Vec<String>,

    /// Call markers the script extractor looks for.
    pub markers: Vec<MarkerConfig>,

    /// Template dump of the full key table.
    pub potfile: Option<PathBuf>,

    /// Entries of the existing template that are no longer extracted.
    pub obsolete_file: Option<PathBuf>,

    /// Per-language PO catalog path, e.g. `po/{lang}.po`.
    pub po_files: Option<String>,

    /// Compiled artifacts written on every flush.
    pub result_files: Vec<ResultFileConfig>,

    /// When a pass flushes.
    pub flush_policy: FlushPolicy,
    /// What a flush appends.
    pub flush_scope: FlushScope,
}

impl PluginSettings {
    /// # Errors
    /// - Empty extension allow-list or dotted extension
    /// - Invalid glob pattern
    /// - Empty or duplicated language code
    /// - Invalid marker
    /// - Path templates missing `{lang}`
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.extensions.is_empty() {
            errors.push(ValidationError::new(
                "extensions",
                "At least one extension is required. Example: {\"js\": \"javascript\"}",
            ));
        }
        for ext in self.extensions.keys() {
            if ext.is_empty() || ext.starts_with('.') {
                errors.push(ValidationError::new(
                    format!("extensions.{ext}"),
                    "Write the extension without the leading dot, for example: \"js\"",
                ));
            }
        }

        for (index, pattern) in self.exclude_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("excludePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        let mut seen = HashSet::new();
        for (index, lang) in self.lang_list.iter().enumerate() {
            if lang.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("langList[{index}]"),
                    "The language code cannot be empty",
                ));
            } else if !seen.insert(lang.as_str()) {
                errors.push(ValidationError::new(
                    format!("langList[{index}]"),
                    format!("Duplicate language code '{lang}'"),
                ));
            }
        }

        if self.markers.is_empty() {
            errors.push(ValidationError::new(
                "markers",
                "At least one marker is required. Example: [{\"name\": \"gettext\"}]",
            ));
        }
        for (index, marker) in self.markers.iter().enumerate() {
            if marker.name.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("markers[{index}].name"),
                    "The marker name cannot be empty",
                ));
            }
            if marker.context_index == Some(marker.msgid_index) {
                errors.push(ValidationError::new(
                    format!("markers[{index}].contextIndex"),
                    "The context argument must differ from the msgid argument",
                ));
            }
        }

        if let Some(template) = &self.po_files
            && !template.contains(LANG_PLACEHOLDER)
        {
            errors.push(ValidationError::new(
                "poFiles",
                format!("The path must contain '{LANG_PLACEHOLDER}'. Example: \"po/{{lang}}.po\""),
            ));
        }

        if !self.result_files.is_empty() && self.lang_list.is_empty() && self.po_files.is_none() {
            errors.push(ValidationError::new(
                "resultFiles",
                "Result files need target languages. Set 'langList' or 'poFiles'",
            ));
        }

        for (index, result_file) in self.result_files.iter().enumerate() {
            if result_file.filename.is_empty() {
                errors.push(ValidationError::new(
                    format!("resultFiles[{index}].filename"),
                    "The filename cannot be empty. Example: \"dist/i18n/{lang}.json\"",
                ));
            } else if self.lang_list.len() > 1 && !result_file.filename.contains(LANG_PLACEHOLDER)
            {
                errors.push(ValidationError::new(
                    format!("resultFiles[{index}].filename"),
                    format!(
                        "With several languages the filename must contain '{LANG_PLACEHOLDER}'"
                    ),
                ));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Language codes of `lang_list` that are not known language codes.
    #[must_use]
    pub fn unknown_languages(&self) -> Vec<&str> {
        self.lang_list
            .iter()
            .map(String::as_str)
            .filter(|lang| !is_known_language_code(lang))
            .collect()
    }
}

/// Default extension allow-list.
fn default_extensions() -> BTreeMap<String, SourceSyntax> {
    let mut extensions = BTreeMap::new();
    for ext in ["js", "jsx", "mjs", "cjs"] {
        extensions.insert(ext.to_string(), SourceSyntax::JavaScript);
    }
    extensions.insert("ts".to_string(), SourceSyntax::TypeScript);
    extensions.insert("tsx".to_string(), SourceSyntax::Tsx);
    for ext in ["html", "htm", "php", "phtml", "tml", "ejs", "erb", "tag", "jsp"] {
        extensions.insert(ext.to_string(), SourceSyntax::Html);
    }
    extensions
}

/// `gettext(msgid)` and `gettextCatalog.getString(msgid, scope, context)`.
fn default_markers() -> Vec<MarkerConfig> {
    vec![
        MarkerConfig::new("gettext", 0, None),
        MarkerConfig::new("gettextCatalog.getString", 0, Some(2)),
    ]
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude_patterns: vec!["**/node_modules/**".to_string()],
            base_dir: None,
            lang_list: Vec::new(),
            markers: default_markers(),
            potfile: None,
            obsolete_file: None,
            po_files: None,
            result_files: Vec::new(),
            flush_policy: FlushPolicy::default(),
            flush_scope: FlushScope::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    fn result_file(filename: &str) -> ResultFileConfig {
        ResultFileConfig {
            filename: filename.to_string(),
            format: OutputFormat::Json,
            module_name: default_module_name(),
            save_file: true,
        }
    }

    #[rstest]
    fn validate_valid_settings() {
        let settings = PluginSettings::default();

        assert_that!(settings.validate(), ok(anything()));
    }

    #[rstest]
    fn deserialize_empty_settings() {
        let settings: PluginSettings = serde_json::from_str("{}").unwrap();

        assert_eq!(settings.extensions.get("ts"), Some(&SourceSyntax::TypeScript));
        assert_eq!(settings.extensions.get("html"), Some(&SourceSyntax::Html));
        assert_that!(settings.exclude_patterns, elements_are![eq("**/node_modules/**")]);
        assert_that!(settings.markers, len(eq(2)));
        assert_that!(settings.flush_policy, eq(FlushPolicy::NewKeys));
        assert_that!(settings.flush_scope, eq(FlushScope::Delta));
    }

    #[rstest]
    fn deserialize_full_settings() {
        let json = r#"{
            "extensions": {"js": "javascript", "html": "html"},
            "excludePatterns": ["**/vendor/**"],
            "baseDir": "app",
            "langList": ["de", "fr"],
            "potfile": "po/template.pot",
            "poFiles": "po/{lang}.po",
            "resultFiles": [
                {"filename": "dist/{lang}.json"},
                {
                    "filename": "dist/{lang}.js",
                    "format": "javascript",
                    "moduleName": "app",
                    "saveFile": false
                }
            ],
            "flushPolicy": "snapshotDiff",
            "flushScope": "fullTable"
        }"#;

        let settings: PluginSettings = serde_json::from_str(json).unwrap();

        assert_that!(settings.extensions, len(eq(2)));
        assert_that!(settings.lang_list, elements_are![eq("de"), eq("fr")]);
        assert_that!(settings.result_files, len(eq(2)));
        assert_that!(settings.result_files[0].save_file, eq(true));
        assert_that!(settings.result_files[0].module_name, eq("gettext"));
        assert_that!(settings.result_files[1].format, eq(OutputFormat::Javascript));
        assert_that!(settings.result_files[1].save_file, eq(false));
        assert_that!(settings.flush_policy, eq(FlushPolicy::SnapshotDiff));
        assert_that!(settings.flush_scope, eq(FlushScope::FullTable));
        assert_that!(settings.validate(), ok(anything()));
    }

    #[rstest]
    fn validate_empty_extensions() {
        let settings = PluginSettings { extensions: BTreeMap::new(), ..PluginSettings::default() };

        assert_that!(
            settings.validate(),
            err(elements_are![field!(ValidationError.field_path, eq("extensions"))])
        );
    }

    #[rstest]
    fn validate_dotted_extension() {
        let mut extensions = BTreeMap::new();
        extensions.insert(".js".to_string(), SourceSyntax::JavaScript);
        let settings = PluginSettings { extensions, ..PluginSettings::default() };

        assert_that!(
            settings.validate(),
            err(elements_are![all![
                field!(ValidationError.field_path, eq("extensions..js")),
                field!(ValidationError.message, contains_substring("leading dot"))
            ]])
        );
    }

    #[rstest]
    fn validate_invalid_exclude_pattern() {
        let settings = PluginSettings {
            exclude_patterns: vec!["dist/**".to_string(), "invalid[pattern".to_string()],
            ..PluginSettings::default()
        };

        assert_that!(
            settings.validate(),
            err(elements_are![all![
                field!(ValidationError.field_path, eq("excludePatterns[1]")),
                field!(ValidationError.message, contains_substring("invalid[pattern"))
            ]])
        );
    }

    #[rstest]
    fn validate_duplicate_and_empty_languages() {
        let settings = PluginSettings {
            lang_list: vec!["de".to_string(), String::new(), "de".to_string()],
            ..PluginSettings::default()
        };

        assert_that!(
            settings.validate(),
            err(elements_are![
                field!(ValidationError.field_path, eq("langList[1]")),
                all![
                    field!(ValidationError.field_path, eq("langList[2]")),
                    field!(ValidationError.message, contains_substring("Duplicate"))
                ]
            ])
        );
    }

    #[rstest]
    fn validate_marker_with_same_context_and_msgid_index() {
        let settings = PluginSettings {
            markers: vec![MarkerConfig::new("tr", 1, Some(1))],
            ..PluginSettings::default()
        };

        assert_that!(
            settings.validate(),
            err(elements_are![field!(ValidationError.field_path, eq("markers[0].contextIndex"))])
        );
    }

    #[rstest]
    fn validate_po_files_without_placeholder() {
        let settings =
            PluginSettings { po_files: Some("po/all.po".to_string()), ..PluginSettings::default() };

        assert_that!(
            settings.validate(),
            err(elements_are![field!(ValidationError.field_path, eq("poFiles"))])
        );
    }

    #[rstest]
    fn validate_result_files_without_languages() {
        let settings = PluginSettings {
            result_files: vec![result_file("dist/{lang}.json")],
            ..PluginSettings::default()
        };

        assert_that!(
            settings.validate(),
            err(elements_are![field!(ValidationError.field_path, eq("resultFiles"))])
        );
    }

    #[rstest]
    fn validate_shared_filename_for_several_languages() {
        let settings = PluginSettings {
            lang_list: vec!["de".to_string(), "fr".to_string()],
            result_files: vec![result_file("dist/strings.json")],
            ..PluginSettings::default()
        };

        assert_that!(
            settings.validate(),
            err(elements_are![field!(ValidationError.field_path, eq("resultFiles[0].filename"))])
        );
    }

    #[rstest]
    fn unknown_languages_are_reported() {
        let settings = PluginSettings {
            lang_list: vec!["de".to_string(), "klingon".to_string(), "pt_BR".to_string()],
            ..PluginSettings::default()
        };

        assert_that!(settings.unknown_languages(), elements_are![eq(&"klingon")]);
    }

    #[rstest]
    fn config_error_validation_errors_format() {
        let settings = PluginSettings {
            extensions: BTreeMap::new(),
            markers: vec![],
            ..PluginSettings::default()
        };

        let errors = settings.validate().unwrap_err();
        let error_message = format!("{}", ConfigError::ValidationErrors(errors));

        assert_that!(error_message, contains_substring("Configuration validation failed"));
        assert_that!(error_message, contains_substring("1. extensions"));
        assert_that!(error_message, contains_substring("2. markers"));
    }
}
