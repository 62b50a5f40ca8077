//! Settings for the command-line tools.
//!
//! The library functions take every parameter explicitly. The binary resolves those
//! parameters from command-line flags first and falls back to these settings, which
//! are loaded from a TOML file.
//!
//! # Configuration File Format
//!
//! ```toml
//! [search]
//! recursive = true
//! case_insensitive = true
//!
//! [time]
//! formats = ["%Y-%m-%d %H:%M:%S", "%Y%m%d%H%M%S"]
//!
//! [output]
//! color = true
//! progress = true
//! ```

use crate::timestamp::DEFAULT_FORMATS;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory settings file.
pub const LOCAL_CONFIG_NAME: &str = ".treemirror.toml";

/// Errors that can occur during settings loading.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// A configured timestamp format cannot be used for parsing.
    InvalidTimeFormat {
        /// The offending format string.
        format: String,
        /// Why it was rejected.
        reason: String,
    },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidTimeFormat { format, reason } => {
                write!(f, "Invalid timestamp format '{}': {}", format, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// All settings, as deserialized from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub time: TimeSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

/// Defaults for traversal and pattern compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Walk the whole tree unless a command says otherwise.
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Compile regex and glob patterns case-insensitively.
    #[serde(default = "default_true")]
    pub case_insensitive: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            recursive: true,
            case_insensitive: true,
        }
    }
}

/// Accepted formats for `--since` timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSettings {
    #[serde(default = "default_time_formats")]
    pub formats: Vec<String>,
}

impl Default for TimeSettings {
    fn default() -> Self {
        Self {
            formats: default_time_formats(),
        }
    }
}

/// Terminal output preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_true")]
    pub color: bool,

    /// Show a spinner while batch commands run.
    #[serde(default = "default_true")]
    pub progress: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            color: true,
            progress: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_time_formats() -> Vec<String> {
    DEFAULT_FORMATS.iter().map(|f| f.to_string()).collect()
}

impl Settings {
    /// Load settings from a file, with fallback to defaults.
    ///
    /// Attempts to load settings in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.treemirror.toml` in the current directory
    /// 3. Look for `~/.config/treemirror/config.toml` in home directory
    /// 4. Fall back to default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file is found or explicitly provided but cannot
    /// be read, parsed or validated.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_NAME);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("treemirror")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load settings from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Self =
            toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks that every timestamp format is usable.
    ///
    /// A format is usable when a reference moment formatted with it parses back.
    /// Formats that cannot represent a full date and time fail this check.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.time.formats.is_empty() {
            return Err(ConfigError::ConfigInvalid(
                "time.formats must list at least one format".to_string(),
            ));
        }

        let reference = NaiveDateTime::parse_from_str("2001-02-03 04:05:06", "%Y-%m-%d %H:%M:%S")
            .map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        for format in &self.time.formats {
            let mut rendered = String::new();
            if write!(rendered, "{}", reference.format(format)).is_err() {
                return Err(ConfigError::InvalidTimeFormat {
                    format: format.clone(),
                    reason: "unsupported specifier".to_string(),
                });
            }
            NaiveDateTime::parse_from_str(&rendered, format).map_err(|e| {
                ConfigError::InvalidTimeFormat {
                    format: format.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.search.recursive);
        assert!(settings.search.case_insensitive);
        assert!(settings.output.color);
        assert_eq!(settings.time.formats.len(), DEFAULT_FORMATS.len());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml("[search]\nrecursive = false\n").unwrap();
        assert!(!settings.search.recursive);
        assert!(settings.search.case_insensitive);
        assert_eq!(settings.output, OutputSettings::default());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let result = Settings::from_toml("[search\nrecursive = ");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let result = Settings::from_toml("[output]\ncolor = \"yes\"\n");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_date_without_time_format_is_rejected() {
        let result = Settings::from_toml("[time]\nformats = [\"%Y-%m-%d\"]\n");
        assert!(matches!(result, Err(ConfigError::InvalidTimeFormat { .. })));
    }

    #[test]
    fn test_empty_format_list_is_rejected() {
        let result = Settings::from_toml("[time]\nformats = []\n");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_load_explicit_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("settings.toml");
        fs::write(&path, "[output]\nprogress = false\n").unwrap();

        let settings = Settings::load(Some(path.as_path())).unwrap();
        assert!(!settings.output.progress);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = Settings::load(Some(temp_dir.path().join("absent.toml").as_path()));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }
}
