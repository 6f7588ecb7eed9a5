//! Settings of the current workspace.

use std::path::{
    Path,
    PathBuf,
};

use super::{
    ConfigError,
    PluginSettings,
    loader,
};

/// Holds the validated settings and the workspace they were loaded for.
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    /// Always validated.
    current_settings: PluginSettings,

    /// `None` until settings are loaded for a workspace.
    workspace_root: Option<PathBuf>,
}

impl ConfigManager {
    /// Creates a manager holding the default settings.
    #[must_use]
    pub fn new() -> Self {
        Self { current_settings: PluginSettings::default(), workspace_root: None }
    }

    /// Loads the workspace configuration file, falling back to defaults.
    ///
    /// # Errors
    /// - The file cannot be read
    /// - Invalid JSON
    /// - Validation errors
    pub fn load_settings(&mut self, workspace_root: Option<PathBuf>) -> Result<(), ConfigError> {
        tracing::debug!("Loading settings for workspace: {:?}", workspace_root);

        let settings = if let Some(root) = &workspace_root {
            loader::load_from_workspace(root)?.map_or_else(PluginSettings::default, |ws| {
                tracing::debug!("Loaded workspace settings: {:?}", ws);
                ws
            })
        } else {
            PluginSettings::default()
        };

        self.update_settings(settings)?;
        self.workspace_root = workspace_root;

        Ok(())
    }

    /// Replaces the settings. Unknown language codes only produce a warning.
    ///
    /// # Errors
    /// Validation errors
    pub fn update_settings(&mut self, new_settings: PluginSettings) -> Result<(), ConfigError> {
        new_settings.validate().map_err(ConfigError::ValidationErrors)?;

        for lang in new_settings.unknown_languages() {
            tracing::warn!(language = lang, "Unknown language code in langList");
        }

        self.current_settings = new_settings;
        tracing::debug!("Settings updated successfully");

        Ok(())
    }

    /// The current, validated settings.
    #[must_use]
    pub const fn get_settings(&self) -> &PluginSettings {
        &self.current_settings
    }

    /// Root of the workspace the settings were loaded for.
    #[must_use]
    pub const fn workspace_root(&self) -> Option<&PathBuf> {
        self.workspace_root.as_ref()
    }

    /// Directory references are made relative to.
    ///
    /// A relative `baseDir` is resolved against the workspace root.
    #[must_use]
    pub fn base_dir(&self) -> PathBuf {
        let root = self.workspace_root.as_deref().unwrap_or_else(|| Path::new("."));
        self.current_settings
            .base_dir
            .as_ref()
            .map_or_else(|| root.to_path_buf(), |dir| root.join(dir))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::config::loader::CONFIG_FILE_NAME;

    #[rstest]
    fn test_new_creates_default_settings() {
        let manager = ConfigManager::new();

        assert!(manager.get_settings().lang_list.is_empty());
        assert!(manager.workspace_root().is_none());
    }

    #[rstest]
    fn test_load_settings_without_workspace() {
        let mut manager = ConfigManager::new();

        let result = manager.load_settings(None);

        assert!(result.is_ok());
        assert!(manager.workspace_root().is_none());
        assert_eq!(manager.base_dir(), PathBuf::from("."));
    }

    #[rstest]
    #[allow(clippy::unwrap_used)]
    fn test_load_settings_with_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_content = r#"{"langList": ["de", "fr"], "baseDir": "app"}"#;
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), config_content).unwrap();

        let mut manager = ConfigManager::new();
        let result = manager.load_settings(Some(temp_dir.path().to_path_buf()));

        assert!(result.is_ok());
        assert_eq!(manager.get_settings().lang_list.len(), 2);
        assert_eq!(manager.base_dir(), temp_dir.path().join("app"));
    }

    #[rstest]
    #[allow(clippy::unwrap_used)]
    fn test_load_settings_with_invalid_config_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), r#"{"markers": []}"#).unwrap();

        let mut manager = ConfigManager::new();
        let result = manager.load_settings(Some(temp_dir.path().to_path_buf()));

        assert!(matches!(result, Err(ConfigError::ValidationErrors(_))));
        assert!(manager.workspace_root().is_none());
    }

    #[rstest]
    fn test_update_settings_invalid() {
        let mut manager = ConfigManager::new();
        let new_settings = PluginSettings { markers: vec![], ..PluginSettings::default() };

        let result = manager.update_settings(new_settings);

        assert!(result.is_err());
        assert_eq!(manager.get_settings().markers.len(), 2);
    }
}
