//! Runtime configuration
//!
//! Defaults come from `constants`; each can be overridden with an
//! environment variable:
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `SPOT_PROVIDER` | `METALS_DEV` (default), `METALS_API`, `METAL_PRICE_API`, `CUSTOM` |
//! | `SPOT_API_KEY` | Substituted for `{API_KEY}` |
//! | `SPOT_BASE_URL` | Overrides the provider's base URL |
//! | `SPOT_REFRESH_INTERVAL_SECS` | Cache freshness window |
//! | `SPOT_REQUEST_TIMEOUT_SECS` | Per-request timeout |
//! | `SPOT_HISTORY_CAP` | Maximum history entries |
//! | `SPOT_METALS` | Comma-separated metals to track |
//! | `SPOT_DATA_DIR` | Directory of the file store |
//! | `SPOT_CUSTOM_ENDPOINT` | `CUSTOM` only: endpoint template |
//! | `SPOT_CUSTOM_PRICE_POINTER` | `CUSTOM` only: JSON pointer to the price |
//! | `SPOT_CUSTOM_INVERT` | `CUSTOM` only: price is metal per USD |

use crate::{
    constants::{
        DEFAULT_DATA_DIR, DEFAULT_HISTORY_CAP, DEFAULT_REFRESH_INTERVAL_SECS, ENABLED_METALS,
        REQUEST_TIMEOUT_SECS,
    },
    error::ConfigError,
    providers::{CustomFormat, ProviderChoice, ProviderConfig},
    types::Metal,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Cache and history settings used by the tracker
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshSettings {
    /// Metals fetched on every refresh
    pub metals: Vec<Metal>,
    /// Age after which cached prices are stale
    pub refresh_interval: Duration,
    /// Maximum number of history entries
    pub history_cap: usize,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            metals: ENABLED_METALS.to_vec(),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            history_cap: DEFAULT_HISTORY_CAP,
        }
    }
}

/// Everything needed to build a tracker
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub provider: ProviderConfig,
    pub refresh: RefreshSettings,
    pub request_timeout: Duration,
    pub data_dir: PathBuf,
}

impl TrackerConfig {
    /// Reads the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = var("SPOT_API_KEY");
        let choice = match var("SPOT_PROVIDER") {
            Some(name) => name.parse::<ProviderChoice>()?,
            None => ProviderChoice::MetalsDev,
        };

        let mut provider = match choice {
            ProviderChoice::MetalsDev => ProviderConfig::metals_dev(api_key),
            ProviderChoice::MetalsApi => ProviderConfig::metals_api(api_key),
            ProviderChoice::MetalPriceApi => ProviderConfig::metal_price_api(api_key),
            ProviderChoice::Custom => {
                let base_url = var("SPOT_BASE_URL")
                    .ok_or_else(|| ConfigError::Missing("SPOT_BASE_URL".to_string()))?;
                let endpoint = var("SPOT_CUSTOM_ENDPOINT")
                    .ok_or_else(|| ConfigError::Missing("SPOT_CUSTOM_ENDPOINT".to_string()))?;
                let price_pointer = var("SPOT_CUSTOM_PRICE_POINTER")
                    .ok_or_else(|| ConfigError::Missing("SPOT_CUSTOM_PRICE_POINTER".to_string()))?;
                let invert = parse_or("SPOT_CUSTOM_INVERT", var("SPOT_CUSTOM_INVERT"), false)?;
                ProviderConfig::custom(base_url, &endpoint, CustomFormat { price_pointer, invert }, api_key)
            }
        };
        if let Some(base_url) = var("SPOT_BASE_URL") {
            provider = provider.with_base_url(base_url);
        }

        let metals = match var("SPOT_METALS") {
            Some(list) => parse_metals(&list)?,
            None => ENABLED_METALS.to_vec(),
        };

        let refresh_secs = parse_or(
            "SPOT_REFRESH_INTERVAL_SECS",
            var("SPOT_REFRESH_INTERVAL_SECS"),
            DEFAULT_REFRESH_INTERVAL_SECS,
        )?;
        let timeout_secs = parse_or(
            "SPOT_REQUEST_TIMEOUT_SECS",
            var("SPOT_REQUEST_TIMEOUT_SECS"),
            REQUEST_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::invalid("SPOT_REQUEST_TIMEOUT_SECS", "0"));
        }
        let history_cap = parse_or("SPOT_HISTORY_CAP", var("SPOT_HISTORY_CAP"), DEFAULT_HISTORY_CAP)?;

        Ok(Self {
            provider,
            refresh: RefreshSettings {
                metals,
                refresh_interval: Duration::from_secs(refresh_secs),
                history_cap,
            },
            request_timeout: Duration::from_secs(timeout_secs),
            data_dir: var("SPOT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
        })
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw.parse().map_err(|_| ConfigError::invalid(key, raw)),
        None => Ok(default),
    }
}

/// Parses a comma-separated metal list, dropping duplicates
fn parse_metals(list: &str) -> Result<Vec<Metal>, ConfigError> {
    let mut metals = Vec::new();
    for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let metal = item.parse::<Metal>()?;
        if !metals.contains(&metal) {
            metals.push(metal);
        }
    }
    if metals.is_empty() {
        return Err(ConfigError::invalid("SPOT_METALS", list));
    }
    Ok(metals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderKind;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<TrackerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TrackerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::MetalsDev);
        assert_eq!(config.provider.api_key, None);
        assert_eq!(config.refresh, RefreshSettings::default());
        assert_eq!(config.request_timeout, Duration::from_secs(REQUEST_TIMEOUT_SECS));
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("SPOT_PROVIDER", "metal_price_api"),
            ("SPOT_API_KEY", "secret"),
            ("SPOT_BASE_URL", "http://127.0.0.1:8080/"),
            ("SPOT_METALS", "gold, XAG, gold"),
            ("SPOT_REFRESH_INTERVAL_SECS", "600"),
            ("SPOT_HISTORY_CAP", "25"),
            ("SPOT_DATA_DIR", "/var/lib/spot"),
        ])
        .unwrap();

        assert_eq!(config.provider.kind, ProviderKind::MetalPriceApi);
        assert_eq!(config.provider.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.refresh.metals, vec![Metal::Gold, Metal::Silver]);
        assert_eq!(config.refresh.refresh_interval, Duration::from_secs(600));
        assert_eq!(config.refresh.history_cap, 25);
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/spot"));
        assert_eq!(
            config.provider.build_url(Metal::Gold).unwrap(),
            "http://127.0.0.1:8080/latest?api_key=secret&base=USD&currencies=XAU"
        );
    }

    #[test]
    fn test_custom_provider_requires_settings() {
        let err = config_from(&[("SPOT_PROVIDER", "CUSTOM")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("SPOT_BASE_URL".to_string()));

        let config = config_from(&[
            ("SPOT_PROVIDER", "custom"),
            ("SPOT_BASE_URL", "https://prices.example"),
            ("SPOT_CUSTOM_ENDPOINT", "/v2/{SYMBOL}"),
            ("SPOT_CUSTOM_PRICE_POINTER", "/usd"),
            ("SPOT_CUSTOM_INVERT", "true"),
        ])
        .unwrap();
        assert_eq!(
            config.provider.kind,
            ProviderKind::Custom(CustomFormat {
                price_pointer: "/usd".to_string(),
                invert: true
            })
        );
        assert_eq!(
            config.provider.build_url(Metal::Silver).unwrap(),
            "https://prices.example/v2/XAG"
        );
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            config_from(&[("SPOT_HISTORY_CAP", "lots")]).unwrap_err(),
            ConfigError::invalid("SPOT_HISTORY_CAP", "lots")
        );
        assert!(matches!(
            config_from(&[("SPOT_PROVIDER", "coingecko")]),
            Err(ConfigError::UnknownProvider(_))
        ));
        assert!(matches!(
            config_from(&[("SPOT_METALS", "silver,copper")]),
            Err(ConfigError::UnknownMetal(_))
        ));
        assert!(config_from(&[("SPOT_REQUEST_TIMEOUT_SECS", "0")]).is_err());
    }
}
