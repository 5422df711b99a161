use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::{ErrorClassifier, RetryPolicy, RetryPreset};

/// Retry settings (optional `[retry]` section in config.toml).
///
/// Every field is optional; set fields override the chosen preset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Starting point: "default", "none" or "aggressive".
    #[serde(default)]
    pub preset: Option<RetryPreset>,
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Retries after the initial try.
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub initial_delay_ms: Option<u64>,
    #[serde(default)]
    pub max_delay_ms: Option<u64>,
    /// Upper bound of the random jitter as a fraction of the exponential delay.
    #[serde(default)]
    pub jitter_ratio: Option<f64>,
    /// Replaces the built-in transient status set when present.
    #[serde(default)]
    pub transient_status_codes: Option<Vec<u16>>,
    /// Replaces the built-in transient error-code set when present.
    #[serde(default)]
    pub transient_error_codes: Option<Vec<String>>,
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        let mut policy = RetryPolicy::from_preset(self.preset.unwrap_or_default());
        if let Some(enabled) = self.enabled {
            policy.enabled = enabled;
        }
        if let Some(n) = self.max_attempts {
            policy.max_attempts = n;
        }
        if let Some(ms) = self.initial_delay_ms {
            policy.initial_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.max_delay_ms {
            policy.max_delay = Duration::from_millis(ms);
        }
        if let Some(ratio) = self.jitter_ratio {
            policy.jitter_ratio = ratio.clamp(0.0, 1.0);
        }
        policy
    }

    pub fn to_classifier(&self) -> ErrorClassifier {
        let defaults = ErrorClassifier::default();
        let status = self
            .transient_status_codes
            .clone()
            .unwrap_or_else(|| defaults.transient_status_codes().to_vec());
        let codes = self
            .transient_error_codes
            .clone()
            .unwrap_or_else(|| defaults.transient_error_codes().to_vec());
        ErrorClassifier::new(status, codes)
    }
}

/// Global configuration loaded from `~/.config/strata/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrataConfig {
    /// Account name the emulator answers as.
    pub account: String,
    /// Emulator database path; defaults to the XDG state directory.
    #[serde(default)]
    pub emulator_path: Option<PathBuf>,
    /// Optional retry settings; if missing, the default preset is used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for StrataConfig {
    fn default() -> Self {
        Self {
            account: "devstoreaccount1".to_string(),
            emulator_path: None,
            retry: None,
        }
    }
}

impl StrataConfig {
    /// Effective retry policy (default preset when the section is absent).
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryConfig::to_policy)
            .unwrap_or_default()
    }

    pub fn classifier(&self) -> ErrorClassifier {
        self.retry
            .as_ref()
            .map(RetryConfig::to_classifier)
            .unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("strata")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<StrataConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = StrataConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: StrataConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = StrataConfig::default();
        assert_eq!(cfg.account, "devstoreaccount1");
        assert!(cfg.emulator_path.is_none());
        assert_eq!(cfg.retry_policy(), RetryPolicy::default_preset());
        assert_eq!(cfg.classifier(), ErrorClassifier::default());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = StrataConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: StrataConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_preset_only() {
        let toml = r#"
            account = "dev"

            [retry]
            preset = "aggressive"
        "#;
        let cfg: StrataConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.account, "dev");
        assert_eq!(cfg.retry_policy(), RetryPolicy::aggressive());
    }

    #[test]
    fn config_toml_overrides_preset() {
        let toml = r#"
            account = "dev"
            emulator_path = "/tmp/strata.db"

            [retry]
            preset = "default"
            max_attempts = 7
            initial_delay_ms = 250
            max_delay_ms = 5000
            jitter_ratio = 0.5
            transient_status_codes = [503]
            transient_error_codes = ["ServerBusy", "InternalError"]
        "#;
        let cfg: StrataConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.emulator_path, Some(PathBuf::from("/tmp/strata.db")));

        let policy = cfg.retry_policy();
        assert!(policy.enabled);
        assert_eq!(policy.max_attempts, 7);
        assert_eq!(policy.initial_delay, Duration::from_millis(250));
        assert_eq!(policy.max_delay, Duration::from_secs(5));
        assert!((policy.jitter_ratio - 0.5).abs() < 1e-9);

        let classifier = cfg.classifier();
        assert_eq!(classifier.transient_status_codes(), &[503]);
        assert_eq!(
            classifier.transient_error_codes(),
            &["ServerBusy".to_string(), "InternalError".to_string()]
        );
    }

    #[test]
    fn config_toml_disable_retries() {
        let toml = r#"
            account = "dev"

            [retry]
            enabled = false
        "#;
        let cfg: StrataConfig = toml::from_str(toml).unwrap();
        let policy = cfg.retry_policy();
        assert!(!policy.enabled);
        assert_eq!(policy.max_attempts, 3);
    }

    #[test]
    fn jitter_ratio_is_clamped() {
        let retry = RetryConfig {
            jitter_ratio: Some(4.0),
            ..RetryConfig::default()
        };
        assert_eq!(retry.to_policy().jitter_ratio, 1.0);
    }
}
