//! Plugin configuration: settings, loading, validation and file matching.
/// Known language codes
mod languages;
/// Config file loader
mod loader;
/// Configuration manager
mod manager;
/// Source file matcher
mod matcher;
/// Configuration types and settings
mod types;

pub use languages::{
    detect_language_from_path,
    is_known_language_code,
    normalize_language_code,
};
pub use loader::{
    CONFIG_FILE_NAME,
    PACKAGE_JSON_KEY,
};
pub use manager::ConfigManager;
pub use matcher::{
    FileMatcher,
    MatcherError,
};
pub use types::{
    ConfigError,
    FlushPolicy,
    FlushScope,
    LANG_PLACEHOLDER,
    MarkerConfig,
    OutputFormat,
    PluginSettings,
    ResultFileConfig,
    ValidationError,
};
