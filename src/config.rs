//! Application configuration.
//!
//! Everything is optional: a missing file, or missing fields in it, fall back
//! to defaults. The file path comes from `AETHERIA_CONFIG`; `AETHERIA_LANG`
//! overrides the display language.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::connections::ConnectionStrategy;
use crate::error::ConfigError;
use crate::i18n::Language;
use crate::oracle::OracleSettings;
use crate::params::ParameterSet;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "AETHERIA_CONFIG";
/// Environment variable overriding [`AppConfig::language`].
pub const LANG_ENV: &str = "AETHERIA_LANG";

/// Window settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Aetheria".to_string(),
            width: 1280,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Initial slider values; coherence is always derived.
    pub params: ParameterSet,
    pub language: Language,
    /// Fixed RNG seed for reproducible fields.
    pub seed: Option<u64>,
    /// Per-step random jitter.
    pub noise: bool,
    pub connection_strategy: ConnectionStrategy,
    pub window: WindowConfig,
    pub oracle: OracleSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            params: ParameterSet::default(),
            language: Language::default(),
            seed: None,
            noise: true,
            connection_strategy: ConnectionStrategy::default(),
            window: WindowConfig::default(),
            oracle: OracleSettings::default(),
        }
    }
}

impl AppConfig {
    /// Parse a config file. Loaded parameters are clamped into range.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let mut config: Self = serde_json::from_str(text)?;
        config.params = config.params.sanitized();
        Ok(config)
    }

    /// Write as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load from `AETHERIA_CONFIG` if set, else defaults; then apply
    /// environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                tracing::info!(path = ?path, "loading config");
                Self::load(path)?
            }
            None => Self::default(),
        };
        if let Ok(tag) = std::env::var(LANG_ENV) {
            match Language::from_tag(&tag) {
                Some(language) => config.language = language,
                None => tracing::warn!(%tag, "ignoring unknown {LANG_ENV}"),
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert!((config.params.coherence - 22.0).abs() < 1e-4);
    }

    #[test]
    fn test_partial_config() {
        let config = AppConfig::from_json(
            r#"{
                "language": "en",
                "seed": 7,
                "connection_strategy": "grid",
                "params": { "complexity": 120, "recursion": 90 },
                "oracle": { "temperature": 0.5 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.language, Language::En);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.connection_strategy, ConnectionStrategy::Grid);
        assert_eq!(config.params.frequency, 30.0);
        assert!((config.params.coherence - 93.6).abs() < 1e-3);
        assert_eq!(config.oracle.model, "gemini-2.5-flash");
        assert_eq!(config.oracle.temperature, 0.5);
    }

    #[test]
    fn test_out_of_range_params_clamped() {
        let json = r#"{ "params": { "complexity": 5000 } }"#;
        let config = AppConfig::from_json(json).unwrap();
        assert_eq!(config.params.complexity, 200.0);
    }

    #[test]
    fn test_save_and_load() {
        let file = format!("aetheria-config-{}.json", std::process::id());
        let path = std::env::temp_dir().join(file);
        let config = AppConfig {
            seed: Some(42),
            noise: false,
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AppConfig::load("/nonexistent/aetheria.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
