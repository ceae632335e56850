//! Configuration types for the keyward custodian.
//!
//! Configuration is stored in TOML format at `~/.keyward/config.toml`. All
//! fields have defaults, so a missing file or an empty file is a valid
//! configuration.
//!
//! # Default TOML Output
//!
//! ```toml
//! [state]
//! path = "~/.keyward/state"
//!
//! [consent]
//! timeout_ms = 5000
//! poll_ms = 50
//! button = "probe"
//! ```
//!
//! # Examples
//!
//! ```
//! use keyward_core::config::Config;
//!
//! let config = Config::default();
//! assert_eq!(config.state.path, "~/.keyward/state");
//! assert_eq!(config.consent.timeout_ms, 5000);
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

/// Top-level configuration for the keyward custodian.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Persistent state-blob settings.
    #[serde(default)]
    pub state: StateConfig,

    /// Consent-gate settings.
    #[serde(default)]
    pub consent: ConsentConfig,
}

/// Location of the persistent state blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateConfig {
    /// Path to the 129-byte state blob. Supports `~` expansion.
    ///
    /// Default: `~/.keyward/state`
    #[serde(default = "default_state_path")]
    pub path: String,
}

fn default_state_path() -> String {
    "~/.keyward/state".to_string()
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

/// Consent-gate timing and button behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsentConfig {
    /// Maximum time to wait for a button press, in milliseconds.
    ///
    /// Default: 5000
    #[serde(default = "default_consent_timeout")]
    pub timeout_ms: u64,

    /// Button sampling interval, in milliseconds.
    ///
    /// Default: 50
    #[serde(default = "default_consent_poll")]
    pub poll_ms: u64,

    /// Button behavior: probe for one at startup, or force-disable the gate.
    #[serde(default)]
    pub button: ButtonMode,
}

const fn default_consent_timeout() -> u64 {
    5000
}

const fn default_consent_poll() -> u64 {
    50
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_consent_timeout(),
            poll_ms: default_consent_poll(),
            button: ButtonMode::default(),
        }
    }
}

/// Whether the consent gate should look for a physical button.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ButtonMode {
    /// Probe the button line at startup; disable the gate if nothing answers.
    #[default]
    Probe,
    /// Never gate on a button, even if one is wired.
    Disabled,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] if the path does not exist and
    /// [`ConfigError::ParseFailed`] if the contents are not valid TOML.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::file_not_found(path.display().to_string()))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::parse_failed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default path, falling back to defaults
    /// when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error only for a file that exists but fails to parse or
    /// validate.
    pub fn load_or_default() -> ConfigResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// The default configuration file path (`~/.keyward/config.toml`).
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".keyward")
            .join("config.toml")
    }

    /// Resolve the state-blob path, expanding a leading `~`.
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        expand_tilde(&self.state.path)
    }

    /// Render the default configuration as TOML.
    ///
    /// # Panics
    ///
    /// Never panics in practice: the default configuration always
    /// serializes.
    #[must_use]
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Check field-level constraints.
    fn validate(&self) -> ConfigResult<()> {
        if self.consent.timeout_ms == 0 {
            return Err(ConfigError::invalid_value("consent.timeout_ms", "0"));
        }
        if self.consent.poll_ms == 0 || self.consent.poll_ms > self.consent.timeout_ms {
            return Err(ConfigError::invalid_value(
                "consent.poll_ms",
                self.consent.poll_ms.to_string(),
            ));
        }
        Ok(())
    }
}

/// Expand a leading `~/` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.state.path, "~/.keyward/state");
        assert_eq!(config.consent.timeout_ms, 5000);
        assert_eq!(config.consent.poll_ms, 50);
        assert_eq!(config.consent.button, ButtonMode::Probe);
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config: Config = toml::from_str("").expect("empty TOML should parse");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [consent]
            button = "disabled"
            "#,
        )
        .expect("valid TOML");
        assert_eq!(config.consent.button, ButtonMode::Disabled);
        assert_eq!(config.consent.timeout_ms, 5000);
        assert_eq!(config.state.path, "~/.keyward/state");
    }

    #[test]
    fn test_default_toml_round_trips() {
        let rendered = Config::default_toml();
        let parsed: Config = toml::from_str(&rendered).expect("default TOML should parse");
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/keyward.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"this is { not toml").expect("write");
        let result = Config::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseFailed { .. })));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"[consent]\ntimeout_ms = 0\n").expect("write");
        let result = Config::load(file.path());
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_poll_longer_than_timeout_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"[consent]\ntimeout_ms = 100\npoll_ms = 200\n")
            .expect("write");
        let result = Config::load(file.path());
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/state");
        assert!(!expanded.to_string_lossy().starts_with('~'));

        let absolute = expand_tilde("/var/lib/keyward/state");
        assert_eq!(absolute, PathBuf::from("/var/lib/keyward/state"));
    }
}
