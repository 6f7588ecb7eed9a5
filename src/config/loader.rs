//! Configuration file loading.

use std::path::Path;

use serde_json::Value;

use super::{
    ConfigError,
    PluginSettings,
};

/// Name of the configuration file looked up in the workspace root.
pub const CONFIG_FILE_NAME: &str = ".gettext-extract.json";

/// Key of the settings section in `package.json`, used when there is no
/// [`CONFIG_FILE_NAME`].
pub const PACKAGE_JSON_KEY: &str = "gettextExtract";

/// Loads the settings of a workspace.
///
/// [`CONFIG_FILE_NAME`] wins; otherwise the [`PACKAGE_JSON_KEY`] section of
/// `package.json` is used. A `package.json` that is not valid JSON is ignored.
///
/// # Returns
/// - `Ok(Some(settings))`: settings were found and parsed
/// - `Ok(None)`: the workspace has no settings
/// - `Err(ConfigError)`: the settings could not be read or parsed
pub(super) fn load_from_workspace(
    workspace_root: &Path,
) -> Result<Option<PluginSettings>, ConfigError> {
    let config_path = workspace_root.join(CONFIG_FILE_NAME);
    if config_path.is_file() {
        tracing::debug!(path = %config_path.display(), "Loading configuration");
        let content = std::fs::read_to_string(&config_path)?;
        return Ok(Some(serde_json::from_str(&content)?));
    }

    let package_path = workspace_root.join("package.json");
    if !package_path.is_file() {
        tracing::debug!(workspace = %workspace_root.display(), "No configuration found");
        return Ok(None);
    }

    let content = std::fs::read_to_string(&package_path)?;
    let mut manifest: Value = match serde_json::from_str(&content) {
        Ok(manifest) => manifest,
        Err(e) => {
            tracing::warn!(path = %package_path.display(), error = %e, "Ignoring package.json");
            return Ok(None);
        }
    };
    let Some(section) = manifest.get_mut(PACKAGE_JSON_KEY).map(Value::take) else {
        return Ok(None);
    };

    tracing::debug!(path = %package_path.display(), "Loading configuration from package.json");
    Ok(Some(serde_json::from_value(section)?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    #[rstest]
    fn test_load_from_workspace_with_valid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_content = r#"{"langList": ["de"], "potfile": "po/template.pot"}"#;
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), config_content).unwrap();

        let result = load_from_workspace(temp_dir.path());

        assert!(result.is_ok());
        let settings = result.unwrap().unwrap();
        assert_eq!(settings.lang_list, vec!["de".to_string()]);
        assert_eq!(settings.potfile.as_deref(), Some(Path::new("po/template.pot")));
    }

    #[rstest]
    fn test_load_from_workspace_no_config_file() {
        let temp_dir = TempDir::new().unwrap();

        let result = load_from_workspace(temp_dir.path());

        assert!(result.is_ok());
        assert!(result.unwrap().is_none());
    }

    #[rstest]
    fn test_load_from_workspace_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "invalid json").unwrap();

        let result = load_from_workspace(temp_dir.path());

        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[rstest]
    fn package_json_section_is_used_without_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = r#"{"name": "app", "gettextExtract": {"langList": ["fr"]}}"#;
        fs::write(temp_dir.path().join("package.json"), manifest).unwrap();

        let settings = load_from_workspace(temp_dir.path()).unwrap().unwrap();

        assert_eq!(settings.lang_list, vec!["fr".to_string()]);
    }

    #[rstest]
    fn config_file_wins_over_package_json() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), r#"{"langList": ["de"]}"#).unwrap();
        let manifest = r#"{"gettextExtract": {"langList": ["fr"]}}"#;
        fs::write(temp_dir.path().join("package.json"), manifest).unwrap();

        let settings = load_from_workspace(temp_dir.path()).unwrap().unwrap();

        assert_eq!(settings.lang_list, vec!["de".to_string()]);
    }

    #[rstest]
    #[case::no_section(r#"{"name": "app"}"#)]
    #[case::not_json("{ name: app")]
    fn package_json_without_settings_is_ignored(#[case] manifest: &str) {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("package.json"), manifest).unwrap();

        let result = load_from_workspace(temp_dir.path());

        assert!(result.unwrap().is_none());
    }

    #[rstest]
    fn invalid_package_json_section_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = r#"{"gettextExtract": {"langList": "de"}}"#;
        fs::write(temp_dir.path().join("package.json"), manifest).unwrap();

        let result = load_from_workspace(temp_dir.path());

        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
