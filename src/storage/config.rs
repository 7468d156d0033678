//! JSON Configuration Management
//!
//! Handles reading and writing the application configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::settings::AppConfig;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_code_insight_dir};

/// Configuration service for managing app settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: AppConfig,
}

impl ConfigService {
    /// Load the default config file, creating it with defaults when missing
    pub fn new() -> AppResult<Self> {
        ensure_code_insight_dir()?;
        Self::from_path(config_path()?)
    }

    /// Load from an explicit path, creating it with defaults when missing
    pub fn from_path(config_path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = config_path.into();
        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let default_config = AppConfig::default();
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }
            Self::save_to_file(&config_path, &default_config)?;
            default_config
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<AppConfig> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| AppError::config(format!("{}: {}", path.display(), e)))?;
        config.validate().map_err(AppError::config)?;
        Ok(config)
    }

    /// Save configuration to a file with pretty formatting.
    /// The advisory API key is never written.
    fn save_to_file(path: &Path, config: &AppConfig) -> AppResult<()> {
        config.validate().map_err(AppError::config)?;
        let mut on_disk = config.clone();
        on_disk.advisory.api_key = None;
        let content = serde_json::to_string_pretty(&on_disk)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// Get a clone of the current configuration
    pub fn get_config_clone(&self) -> AppConfig {
        self.config.clone()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::{RuntimeErrorPolicy, StorageBackend};

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("sub").join("config.json");

        let service = ConfigService::from_path(&path).unwrap();
        assert!(path.exists());
        assert_eq!(service.get_config().batch_concurrency, 4);
        assert_eq!(service.config_path(), path.as_path());
    }

    #[test]
    fn test_load_partial_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"storage": "sqlite", "execution": {"runtime_error_policy": "exit_status"}}"#,
        )
        .unwrap();

        let service = ConfigService::from_path(&path).unwrap();
        let config = service.get_config();
        assert_eq!(config.storage, StorageBackend::Sqlite);
        assert_eq!(
            config.execution.runtime_error_policy,
            RuntimeErrorPolicy::ExitStatus
        );
        assert_eq!(config.execution.timeout_secs, 30);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"batch_concurrency": 0}"#).unwrap();
        assert!(matches!(
            ConfigService::from_path(&path),
            Err(AppError::Config(_))
        ));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            ConfigService::from_path(&path),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_api_key_not_persisted() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.advisory.api_key = Some("secret".to_string());
        config.batch_concurrency = 2;
        ConfigService::save_to_file(&path, &config).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("secret"));

        let service = ConfigService::from_path(&path).unwrap();
        assert_eq!(service.get_config().batch_concurrency, 2);
        assert!(service.get_config().advisory.api_key.is_none());
    }

    #[test]
    fn test_invalid_config_is_never_written() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        let mut config = AppConfig::default();
        config.execution.timeout_secs = 0;
        assert!(matches!(
            ConfigService::save_to_file(&path, &config),
            Err(AppError::Config(_))
        ));
        assert!(!path.exists());
    }
}
