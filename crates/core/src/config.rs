//! Application Configuration
//!
//! Manages inspector settings:
//! - Android SDK location
//! - Logging output
//! - Report contents

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use tracing::{info, debug};

use crate::error::{Result, SdkError};

/// Android SDK configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidConfig {
    /// Path to Android SDK
    pub sdk_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level filter, overridden by RUST_LOG
    pub level: String,
    /// Include source file in log lines
    pub with_file: bool,
    /// Include line numbers in log lines
    pub with_line_number: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_file: true,
            with_line_number: true,
        }
    }
}

/// Inventory report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Compute placeholder targets for orphaned system images
    pub include_missing_targets: bool,
    /// Include skipped-directory diagnostics
    pub include_diagnostics: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_missing_targets: true,
            include_diagnostics: true,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration version for migrations
    pub version: u32,
    /// Android SDK settings
    pub android: AndroidConfig,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Report settings
    pub report: ReportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            android: AndroidConfig::default(),
            logging: LoggingConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl AppConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "droidsdk", "DroidSdk")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load configuration from the default location
    pub async fn load() -> Result<Self> {
        let config_file = Self::config_file()
            .ok_or_else(|| SdkError::Config("Cannot determine config path".into()))?;
        Self::load_from(&config_file).await
    }

    /// Load configuration from `path`, writing defaults when it does not exist
    pub async fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading config from {:?}", path);
            let contents = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            info!("Config file not found, using defaults");
            let config = AppConfig::default();
            config.save_to(path).await?;
            Ok(config)
        }
    }

    /// Save configuration to the default location
    pub async fn save(&self) -> Result<()> {
        let config_file = Self::config_file()
            .ok_or_else(|| SdkError::Config("Cannot determine config path".into()))?;
        self.save_to(&config_file).await
    }

    /// Save configuration to `path`
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    /// Get Android SDK path, with auto-detection
    pub fn get_sdk_path(&self) -> Option<PathBuf> {
        self.android.sdk_path.clone().or_else(|| {
            let from_env = ["ANDROID_SDK_ROOT", "ANDROID_HOME"]
                .iter()
                .filter_map(|var| std::env::var_os(var))
                .map(PathBuf::from)
                .find(|p| p.is_dir());
            if from_env.is_some() {
                return from_env;
            }

            // Auto-detect common paths
            let candidates = if cfg!(windows) {
                vec![
                    dirs::config_local_dir().map(|d| d.join("Android").join("Sdk")),
                    Some(PathBuf::from("C:\\Android\\sdk")),
                ]
            } else {
                vec![
                    dirs::home_dir().map(|h: PathBuf| h.join("Android").join("Sdk")),
                    Some(PathBuf::from("/usr/local/android-sdk")),
                ]
            };

            candidates.into_iter()
                .flatten()
                .find(|p: &PathBuf| p.exists())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.version, 1);
        assert_eq!(config.logging.level, "info");
        assert!(config.report.include_missing_targets);
        assert!(config.android.sdk_path.is_none());
    }

    #[test]
    fn test_configured_sdk_path_wins() {
        let mut config = AppConfig::default();
        config.android.sdk_path = Some(PathBuf::from("/configured/sdk"));
        assert_eq!(config.get_sdk_path(), Some(PathBuf::from("/configured/sdk")));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.with_file);
        assert!(config.report.include_diagnostics);
    }

    #[tokio::test]
    async fn test_load_creates_defaults_then_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = AppConfig::load_from(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(created.logging.level, "info");

        let mut edited = created.clone();
        edited.android.sdk_path = Some(PathBuf::from("/opt/android-sdk"));
        edited.save_to(&path).await.unwrap();

        let reloaded = AppConfig::load_from(&path).await.unwrap();
        assert_eq!(reloaded.android.sdk_path, Some(PathBuf::from("/opt/android-sdk")));
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "version = [").await.unwrap();

        let err = AppConfig::load_from(&path).await.unwrap_err();
        assert!(matches!(err, SdkError::TomlParse(_)));
    }
}
