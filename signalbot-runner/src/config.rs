//! Application configuration, loaded from an optional TOML file.
//!
//! Every section and field has a default, so an empty file (or no file) is valid.
//!
//! ```toml
//! [data]
//! api_key = "..."
//! period = "2y"
//!
//! [model]
//! dir = "models"
//! [model.forest]
//! n_trees = 200
//!
//! [backtest]
//! initial_capital = 25000.0
//!
//! [monitor]
//! duration_minutes = 30
//! interval = "1min"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use signalbot_core::data::Period;
use signalbot_core::model::ModelConfig;

use crate::backtest::BacktestSettings;
use crate::monitor::MonitorSettings;

/// Environment variable consulted for the Alpha Vantage key.
pub const API_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";

pub const MAX_RETRIES: u32 = 10;
pub const MAX_RETRY_BASE_DELAY_MS: u64 = 60_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataSettings,
    pub model: ModelSettings,
    pub backtest: BacktestSettings,
    pub monitor: MonitorSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub api_key: Option<String>,
    pub period: Period,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub breaker_cooldown_secs: u64,
    pub breaker_failure_threshold: u32,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            period: Period::OneYear,
            max_retries: 3,
            retry_base_delay_ms: 500,
            breaker_cooldown_secs: 30 * 60,
            breaker_failure_threshold: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Directory holding `trading_model_{SYMBOL}.json` files.
    pub dir: PathBuf,
    #[serde(flatten)]
    pub training: ModelConfig,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("models"),
            training: ModelConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// The file at `path` if given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backtest
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let m = &self.model.training;
        if !(0.0..1.0).contains(&m.test_fraction) || m.test_fraction == 0.0 {
            return Err(ConfigError::Invalid(format!(
                "model.test_fraction must be in (0, 1), got {}",
                m.test_fraction
            )));
        }
        if m.forest.n_trees == 0 {
            return Err(ConfigError::Invalid("model.forest.n_trees must be at least 1".into()));
        }
        self.monitor
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("monitor: {e}")))?;
        let d = &self.data;
        if d.max_retries > MAX_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "data.max_retries must be at most {MAX_RETRIES}, got {}",
                d.max_retries
            )));
        }
        if d.retry_base_delay_ms > MAX_RETRY_BASE_DELAY_MS {
            return Err(ConfigError::Invalid(format!(
                "data.retry_base_delay_ms must be at most {MAX_RETRY_BASE_DELAY_MS}, got {}",
                d.retry_base_delay_ms
            )));
        }
        Ok(())
    }

    /// API key precedence: explicit flag, then environment, then config file.
    pub fn resolve_api_key(&self, flag: Option<&str>) -> Option<String> {
        pick_api_key(flag, std::env::var(API_KEY_ENV).ok().as_deref(), self.data.api_key.as_deref())
    }
}

fn pick_api_key(flag: Option<&str>, env: Option<&str>, file: Option<&str>) -> Option<String> {
    [flag, env, file]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|k| !k.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use signalbot_core::data::Interval;

    #[test]
    fn empty_config_is_all_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.backtest.confidence_threshold, 0.6);
        assert_eq!(config.model.dir, PathBuf::from("models"));
        assert_eq!(config.model.training.forest.n_trees, 100);
    }

    #[test]
    fn sections_override_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [data]
            period = "2y"

            [model]
            dir = "/tmp/models"
            test_fraction = 0.25
            [model.forest]
            n_trees = 10

            [backtest]
            initial_capital = 25000.0

            [monitor]
            duration_minutes = 30
            interval = "1min"
            "#,
        )
        .unwrap();
        assert_eq!(config.data.period, Period::TwoYears);
        assert_eq!(config.model.training.test_fraction, 0.25);
        assert_eq!(config.model.training.forest.n_trees, 10);
        assert_eq!(config.model.training.forest.max_depth, 10);
        assert_eq!(config.backtest.initial_capital, 25_000.0);
        assert_eq!(config.backtest.min_bars, 50);
        assert_eq!(config.monitor.duration_minutes, 30);
        assert_eq!(config.monitor.interval, Interval::OneMinute);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            AppConfig::from_toml("[backtest]\ninitial_capital = -1.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[data]\nperiod = \"7y\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn monitor_bounds_are_enforced() {
        let huge = u64::MAX / 2;
        assert!(matches!(
            AppConfig::from_toml(&format!("[monitor]\nduration_minutes = {huge}")),
            Err(ConfigError::Invalid(_))
        ));
        let huge = u64::MAX / 10;
        assert!(matches!(
            AppConfig::from_toml(&format!("[monitor]\npoll_minutes = {huge}")),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[monitor]\npoll_minutes = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(AppConfig::from_toml("[monitor]\nduration_minutes = 10080").is_ok());
    }

    #[test]
    fn retry_bounds_are_enforced() {
        assert!(matches!(
            AppConfig::from_toml("[data]\nmax_retries = 4000000000"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[data]\nretry_base_delay_ms = 60001"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(AppConfig::from_toml("[data]\nmax_retries = 10").is_ok());
    }

    #[test]
    fn api_key_precedence() {
        assert_eq!(pick_api_key(Some("flag"), Some("env"), Some("file")).as_deref(), Some("flag"));
        assert_eq!(pick_api_key(None, Some("env"), Some("file")).as_deref(), Some("env"));
        assert_eq!(pick_api_key(Some(" "), None, Some("file")).as_deref(), Some("file"));
        assert_eq!(pick_api_key(None, None, None), None);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signalbot.toml");
        std::fs::write(&path, "[monitor]\npoll_minutes = 5\n").unwrap();
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.monitor.poll_minutes, 5);
        assert!(matches!(
            AppConfig::load(Some(&dir.path().join("missing.toml"))),
            Err(ConfigError::Read { .. })
        ));
    }
}
