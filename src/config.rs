//! Dashboard settings
//!
//! Settings are resolved in three layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. The first TOML file found in [`Config::search_paths`]
//! 3. Environment variables (`LOG_LEVEL`, `LOG_FORMAT`, `LOG_OUTPUT` and the
//!    `COHORT_*` family)
//!
//! The merged result is validated before use. Every section accepts partial
//! input; missing keys keep their defaults.

use crate::format::DEFAULT_CURRENCY_SYMBOL;
use crate::matrix::{DEFAULT_MAX_COHORTS, DEFAULT_MAX_PERIODS};
use crate::models::MetricKind;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{info, warn};

const CONFIG_FILE_NAME: &str = "cohort-dashboard.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    /// Analysis backend
    pub api: ApiConfig,
    /// Matrix caps, currency and chart defaults
    pub display: DisplayConfig,
    pub output: OutputConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// `console`, `file` or `both`
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Prefix for backend-relative asset paths such as the heatmap image.
    pub asset_base_url: String,
    pub timeout_secs: u64,
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub max_cohorts: usize,
    pub max_periods: usize,
    pub currency_symbol: String,
    /// Metric plotted by the trend chart until another is selected.
    pub default_metric: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub json_pretty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub log_directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "ERROR".into(),
            format: "pretty".into(),
            output: "console".into(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".into(),
            asset_base_url: "http://localhost:8000".into(),
            timeout_secs: 60,
            poll_interval_secs: 3,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_cohorts: DEFAULT_MAX_COHORTS,
            max_periods: DEFAULT_MAX_PERIODS,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.into(),
            default_metric: MetricKind::Retention.as_str().into(),
        }
    }
}

impl DisplayConfig {
    pub fn default_metric(&self) -> Result<MetricKind> {
        self.default_metric.parse()
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { json_pretty: true }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_directory: "logs".into(),
        }
    }
}

impl Config {
    /// Resolve defaults, the first config file found, and the environment.
    pub fn load() -> Result<Self> {
        let mut config = match Self::search_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => {
                info!(config_file = %path.display(), "Using configuration file");
                Self::load_from_file(&path)?
            }
            None => Config::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Working directory first, then the user config directory.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(CONFIG_FILE_NAME),
            PathBuf::from(format!(".{}", CONFIG_FILE_NAME)),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("cohort-dashboard").join("config.toml"));
        }
        paths
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        env_string("LOG_LEVEL", &mut self.logging.level);
        env_string("LOG_FORMAT", &mut self.logging.format);
        env_string("LOG_OUTPUT", &mut self.logging.output);

        env_string("COHORT_API_URL", &mut self.api.base_url);
        env_string("COHORT_ASSET_URL", &mut self.api.asset_base_url);
        env_parsed("COHORT_API_TIMEOUT_SECS", &mut self.api.timeout_secs)?;
        env_parsed("COHORT_POLL_INTERVAL_SECS", &mut self.api.poll_interval_secs)?;

        env_parsed("COHORT_MAX_COHORTS", &mut self.display.max_cohorts)?;
        env_parsed("COHORT_MAX_PERIODS", &mut self.display.max_periods)?;
        env_string("COHORT_CURRENCY_SYMBOL", &mut self.display.currency_symbol);

        if let Ok(dir) = env::var("COHORT_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(dir);
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.display.max_cohorts == 0 {
            bail!("display.max_cohorts must be greater than 0");
        }
        if self.display.max_periods == 0 {
            bail!("display.max_periods must be greater than 0");
        }
        if self.display.max_periods > 52 {
            warn!(
                max_periods = self.display.max_periods,
                "Wide matrices may not fit the terminal"
            );
        }
        self.display
            .default_metric()
            .context("Invalid display.default_metric")?;

        if self.api.timeout_secs == 0 {
            bail!("api.timeout_secs must be greater than 0");
        }
        if self.api.poll_interval_secs == 0 {
            bail!("api.poll_interval_secs must be greater than 0");
        }
        if self.api.base_url.trim().is_empty() {
            bail!("api.base_url cannot be empty");
        }

        Ok(())
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path, text)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }
}

fn env_string(var: &str, slot: &mut String) {
    if let Ok(value) = env::var(var) {
        *slot = value;
    }
}

fn env_parsed<T>(var: &str, slot: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: Display,
{
    if let Ok(value) = env::var(var) {
        *slot = value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {}={:?}: {}", var, value, e))?;
    }
    Ok(())
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Process-wide settings. An unusable configuration is reported once on
/// stderr and replaced by the defaults.
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(|| match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: ignoring invalid configuration: {:#}", e);
            Config::default()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.poll_interval(), Duration::from_secs(3));
    }

    #[test]
    fn test_env_parsed_rejects_garbage() {
        env::set_var("COHORT_TEST_PARSED", "many");
        let mut slot = 4usize;
        assert!(env_parsed("COHORT_TEST_PARSED", &mut slot).is_err());
        assert_eq!(slot, 4);

        env::set_var("COHORT_TEST_PARSED", " 7 ");
        env_parsed("COHORT_TEST_PARSED", &mut slot).unwrap();
        assert_eq!(slot, 7);
        env::remove_var("COHORT_TEST_PARSED");
    }

    #[test]
    fn test_zero_caps_rejected() {
        let mut config = Config::default();
        config.display.max_cohorts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_search_paths_start_local() {
        let paths = Config::search_paths();
        assert_eq!(paths[0], PathBuf::from("cohort-dashboard.toml"));
        assert_eq!(paths[1], PathBuf::from(".cohort-dashboard.toml"));
    }
}
