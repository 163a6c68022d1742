//! Configuration: watchlist, valuation parameters and runtime settings
//!
//! Loaded once at startup from TOML and passed to whatever needs it. When no
//! file exists the built-in watchlist is used.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::provider::DEFAULT_TIMEOUT_SECS;
use crate::valuation::{GlobalParams, GrowthAssumptions, ValuationInput};

const CONFIG_FILENAME: &str = "config.toml";

/// Built-in watchlist: (display name, ticker, currency)
const DEFAULT_WATCHLIST: [(&str, &str, Option<&str>); 9] = [
    ("NetEase", "09999.HK", Some("HKD")),
    ("Tencent", "00700.HK", Some("HKD")),
    ("Kuaishou", "01024.HK", Some("HKD")),
    ("JD.com", "09618.HK", Some("HKD")),
    ("Meituan", "03690.HK", Some("HKD")),
    ("PDD", "PDD.O", Some("USD")),
    ("Apple", "AAPL.O", None),
    ("Microsoft", "MSFT.O", None),
    ("NVIDIA", "NVDA.O", None),
];

/// One watchlist entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityEntry {
    /// Display name; also the key current prices are joined on
    pub name: String,
    pub ticker: String,
    #[serde(default)]
    pub currency: Option<String>,
    /// Growth assumptions; securities without them are skipped by `value`
    #[serde(default)]
    pub valuation: Option<GrowthAssumptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub valuation: GlobalParams,
    #[serde(default)]
    pub securities: Vec<SecurityEntry>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            timeout_secs: default_timeout_secs(),
            valuation: GlobalParams::default(),
            securities: DEFAULT_WATCHLIST
                .iter()
                .map(|(name, ticker, currency)| SecurityEntry {
                    name: name.to_string(),
                    ticker: ticker.to_string(),
                    currency: currency.map(str::to_string),
                    valuation: None,
                })
                .collect(),
        }
    }
}

/// `$XDG_CONFIG_HOME/value-analysis`, falling back to the platform config dir
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(dir_spec::config_home)
        .ok_or_else(|| anyhow!("Could not determine config directory"))?;
    Ok(config_dir.join("value-analysis"))
}

impl Config {
    /// Load from `path`, or from the default location if present.
    ///
    /// An explicit path must exist; a missing default file yields the
    /// built-in configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default_path = get_config_dir()?.join(CONFIG_FILENAME);
                if !default_path.exists() {
                    debug!("No config at {:?}, using built-in watchlist", default_path);
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {:?}", path))?;
        debug!(
            "Loaded config from {:?} ({} securities)",
            path,
            config.securities.len()
        );
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for entry in &self.securities {
            if entry.name.trim().is_empty() || entry.ticker.trim().is_empty() {
                bail!("Watchlist entries need a name and a ticker");
            }
            if !names.insert(entry.name.as_str()) {
                bail!("Duplicate watchlist name: {}", entry.name);
            }
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be positive");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Look up an entry by display name or ticker (case-insensitive)
    pub fn find(&self, key: &str) -> Option<&SecurityEntry> {
        self.securities
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(key) || e.ticker.eq_ignore_ascii_case(key))
    }

    /// Valuation inputs for every entry that carries growth assumptions
    pub fn valuation_inputs(&self) -> Vec<ValuationInput> {
        self.securities
            .iter()
            .filter_map(|e| {
                e.valuation.as_ref().map(|assumptions| ValuationInput {
                    security: e.name.clone(),
                    assumptions: assumptions.clone(),
                })
            })
            .collect()
    }
}
