//! Configuration loading and validation.
//!
//! A TOML file (default `~/.config/pointlens/config.toml`) plus an
//! environment override for the API key. Construction of the reasoning
//! provider goes through here so a missing credential fails fast at
//! startup, not on the first tap.

use crate::error::{PointLensError, Result};
use crate::language::Language;
use crate::provider::gemini::{DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use crate::provider::GeminiProvider;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `provider.api_key`.
pub const API_KEY_ENV: &str = "POINTLENS_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Reasoning-service API key. Empty means unconfigured.
    pub api_key: String,
    /// Model used for both identification and chat.
    pub model: String,
    /// API base URL override (normally unset).
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Startup language.
    pub language: Language,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            language: Language::En,
        }
    }
}

impl Config {
    /// Default config file location for this platform.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "pointlens").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from `path` (or the default location), then apply environment
    /// overrides. A missing file yields the defaults; a malformed file is
    /// a configuration error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path(),
        };

        let mut config = match path {
            Some(ref p) if p.exists() => {
                let raw = std::fs::read_to_string(p)
                    .map_err(|e| PointLensError::Config(format!("{}: {e}", p.display())))?;
                toml::from_str(&raw)
                    .map_err(|e| PointLensError::Config(format!("{}: {e}", p.display())))?
            }
            _ => Self::default(),
        };

        config.apply_env(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    /// Parse from a TOML string (tests, embedded defaults).
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| PointLensError::Config(e.to_string()))
    }

    fn apply_env(&mut self, api_key: Option<String>) {
        if let Some(key) = api_key {
            if !key.trim().is_empty() {
                self.provider.api_key = key;
            }
        }
    }

    /// Whether a credential is present (file or environment).
    pub fn has_credentials(&self) -> bool {
        !self.provider.api_key.trim().is_empty()
    }

    /// Build the injected reasoning provider; fails fast on a missing key.
    pub fn build_provider(&self) -> Result<GeminiProvider> {
        let mut provider = GeminiProvider::new(self.provider.api_key.clone())?
            .with_model(self.provider.model.clone())
            .with_timeout(Duration::from_secs(self.provider.timeout_secs));
        if let Some(base_url) = &self.provider.base_url {
            provider = provider.with_base_url(base_url.clone());
        }
        Ok(provider)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.provider.model, DEFAULT_MODEL);
        assert_eq!(config.provider.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.ui.language, Language::En);
        assert!(!config.has_credentials());
    }

    #[test]
    fn parses_partial_toml() {
        let config = Config::from_toml(
            r#"
            [provider]
            api_key = "k-123"

            [ui]
            language = "ko"
            "#,
        )
        .unwrap();
        assert_eq!(config.provider.api_key, "k-123");
        assert_eq!(config.provider.model, DEFAULT_MODEL);
        assert_eq!(config.ui.language, Language::Ko);
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = Config::from_toml("provider = 3").unwrap_err();
        assert!(matches!(err, PointLensError::Config(_)));
    }

    #[test]
    fn env_key_overrides_file_key() {
        let mut config = Config::from_toml("[provider]\napi_key = \"from-file\"").unwrap();
        config.apply_env(Some("from-env".into()));
        assert_eq!(config.provider.api_key, "from-env");

        // Blank env values don't clobber the file.
        config.apply_env(Some("  ".into()));
        assert_eq!(config.provider.api_key, "from-env");
        config.apply_env(None);
        assert_eq!(config.provider.api_key, "from-env");
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[provider]\napi_key = \"disk-key\"\ntimeout_secs = 5").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.provider.timeout_secs, 5);
        assert!(config.has_credentials());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config.provider.model, DEFAULT_MODEL);
    }

    #[test]
    fn provider_build_fails_without_key() {
        let config = Config::default();
        assert!(matches!(
            config.build_provider(),
            Err(PointLensError::Config(_))
        ));
    }

    #[test]
    fn provider_build_succeeds_with_key() {
        let mut config = Config::default();
        config.provider.api_key = "k".into();
        assert!(config.build_provider().is_ok());
    }
}
