use crate::core::cache::Operation;
use crate::core::metrics::MAX_LOOKBACK_DAYS;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_FMARKET_URL: &str = "https://api.fmarket.vn";
pub const DEFAULT_VCI_URL: &str = "https://trading.vietcap.com.vn";
/// Longest cache expiry window accepted from config: one year.
pub const MAX_CACHE_MINUTES: u64 = 366 * 24 * 60;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FmarketProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VciProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub fmarket: Option<FmarketProviderConfig>,
    pub vci: Option<VciProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            fmarket: Some(FmarketProviderConfig {
                base_url: DEFAULT_FMARKET_URL.to_string(),
            }),
            vci: Some(VciProviderConfig {
                base_url: DEFAULT_VCI_URL.to_string(),
            }),
        }
    }
}

/// Expiry windows per data kind, in minutes.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub fund_listing_minutes: u64,
    pub nav_history_minutes: u64,
    pub holdings_minutes: u64,
    pub index_history_minutes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            fund_listing_minutes: 30,
            nav_history_minutes: 4 * 60,
            holdings_minutes: 12 * 60,
            index_history_minutes: 2 * 60,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self, operation: Operation) -> Duration {
        let minutes = match operation {
            Operation::ListFunds => self.fund_listing_minutes,
            Operation::NavHistory => self.nav_history_minutes,
            Operation::TopHoldings | Operation::IndustryHoldings | Operation::AssetHoldings => {
                self.holdings_minutes
            }
            Operation::IndexHistory => self.index_history_minutes,
        };
        Duration::from_secs(minutes.saturating_mul(60))
    }

    fn validate(&self) -> Result<()> {
        for (name, minutes) in [
            ("fund_listing_minutes", self.fund_listing_minutes),
            ("nav_history_minutes", self.nav_history_minutes),
            ("holdings_minutes", self.holdings_minutes),
            ("index_history_minutes", self.index_history_minutes),
        ] {
            if minutes > MAX_CACHE_MINUTES {
                bail!("cache.{name} must be at most {MAX_CACHE_MINUTES}, got {minutes}");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MarketIndex {
    pub symbol: String,
    pub name: String,
}

fn default_indices() -> Vec<MarketIndex> {
    [
        ("VNINDEX", "VN-Index"),
        ("VN30", "VN30 Index"),
        ("HNXINDEX", "HNX-Index"),
        ("UPCOMINDEX", "UPCOM-Index"),
        ("HNX30", "HNX30 Index"),
    ]
    .into_iter()
    .map(|(symbol, name)| MarketIndex {
        symbol: symbol.to_string(),
        name: name.to_string(),
    })
    .collect()
}

fn default_comparison_days() -> i64 {
    365
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Indices offered for benchmarking, in display order.
    #[serde(default = "default_indices")]
    pub indices: Vec<MarketIndex>,
    /// Length of the default comparison date range, ending today.
    #[serde(default = "default_comparison_days")]
    pub comparison_days: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            cache: CacheConfig::default(),
            indices: default_indices(),
            comparison_days: default_comparison_days(),
        }
    }
}

impl AppConfig {
    /// Loads the default config file, falling back to built-in defaults when there is none.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("vn", "navdash", "navdash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.cache.validate()?;
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.comparison_days) {
            bail!(
                "comparison_days must be between 1 and {MAX_LOOKBACK_DAYS}, got {}",
                self.comparison_days
            );
        }
        Ok(())
    }

    pub fn fmarket_url(&self) -> &str {
        self.providers
            .fmarket
            .as_ref()
            .map_or(DEFAULT_FMARKET_URL, |p| &p.base_url)
    }

    pub fn vci_url(&self) -> &str {
        self.providers
            .vci
            .as_ref()
            .map_or(DEFAULT_VCI_URL, |p| &p.base_url)
    }

    pub fn index(&self, symbol: &str) -> Option<&MarketIndex> {
        self.indices
            .iter()
            .find(|index| index.symbol.eq_ignore_ascii_case(symbol))
    }
}
