use crate::core::market::TimeRange;
use crate::core::projection::GrowthScenario;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CryptoCompareProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AlternativeMeProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub cryptocompare: Option<CryptoCompareProviderConfig>,
    pub alternative_me: Option<AlternativeMeProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            cryptocompare: Some(CryptoCompareProviderConfig {
                base_url: "https://min-api.cryptocompare.com".to_string(),
            }),
            alternative_me: Some(AlternativeMeProviderConfig {
                base_url: "https://api.alternative.me".to_string(),
            }),
        }
    }
}

impl ProvidersConfig {
    pub fn cryptocompare_url(&self) -> &str {
        self.cryptocompare
            .as_ref()
            .map_or("https://min-api.cryptocompare.com", |p| &p.base_url)
    }

    pub fn alternative_me_url(&self) -> &str {
        self.alternative_me
            .as_ref()
            .map_or("https://api.alternative.me", |p| &p.base_url)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_secs: u64,
    pub request_timeout_secs: u64,
    pub retries: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        PollingConfig {
            interval_secs: 3600,
            request_timeout_secs: 10,
            retries: 0,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SimulatorConfig {
    pub monthly_contribution: f64,
    pub horizon_years: u32,
    pub scenario: GrowthScenario,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            monthly_contribution: 100.0,
            horizon_years: 5,
            scenario: GrowthScenario::Moderate,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default = "default_range")]
    pub default_range: TimeRange,
}

fn default_range() -> TimeRange {
    TimeRange::Week
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            polling: PollingConfig::default(),
            simulator: SimulatorConfig::default(),
            default_range: default_range(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, using built-in defaults
    /// when no file has been set up.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "btcboard", "btcboard")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
providers:
  cryptocompare:
    base_url: "http://example.com/cc"
  alternative_me:
    base_url: "http://example.com/fng"
polling:
  interval_secs: 600
  request_timeout_secs: 5
  retries: 2
simulator:
  monthly_contribution: 250
  horizon_years: 10
  scenario: aggressive
default_range: 1Y
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.providers.cryptocompare_url(), "http://example.com/cc");
        assert_eq!(config.providers.alternative_me_url(), "http://example.com/fng");
        assert_eq!(config.polling.interval(), Duration::from_secs(600));
        assert_eq!(config.polling.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.polling.retries, 2);
        assert_eq!(config.simulator.monthly_contribution, 250.0);
        assert_eq!(config.simulator.horizon_years, 10);
        assert_eq!(config.simulator.scenario, GrowthScenario::Aggressive);
        assert_eq!(config.default_range, TimeRange::Year);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");

        assert_eq!(
            config.providers.cryptocompare_url(),
            "https://min-api.cryptocompare.com"
        );
        assert_eq!(
            config.providers.alternative_me_url(),
            "https://api.alternative.me"
        );
        assert_eq!(config.polling.interval(), Duration::from_secs(3600));
        assert_eq!(config.simulator.scenario, GrowthScenario::Moderate);
        assert_eq!(config.default_range, TimeRange::Week);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let yaml_str = r#"
providers:
  cryptocompare:
    base_url: "http://localhost:9000"
polling:
  retries: 1
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");

        assert_eq!(config.providers.cryptocompare_url(), "http://localhost:9000");
        // Provider entries left out fall back to the public endpoints
        assert_eq!(
            config.providers.alternative_me_url(),
            "https://api.alternative.me"
        );
        assert_eq!(config.polling.retries, 1);
        assert_eq!(config.polling.interval_secs, 3600);
    }

    #[test]
    fn test_invalid_range_is_rejected() {
        let result = serde_yaml::from_str::<AppConfig>("default_range: 2W");
        assert!(result.is_err());
    }
}
