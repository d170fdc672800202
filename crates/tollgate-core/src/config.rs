//! Configuration system for Tollgate.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $TOLLGATE_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/tollgate/config.toml
//!   3. ~/.config/tollgate/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::pricing::{CongestionTiers, DeEscalation, ScaleFactor};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TollgateConfig {
    pub throttling: ThrottlingConfig,
    pub fees: FeesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottlingConfig {
    /// JSON throttle definitions, identical on every node.
    pub definitions_path: PathBuf,
    /// Charge gas-metered operations against the gas throttle.
    pub throttle_by_gas: bool,
    /// Network-wide gas per second. 0 with `throttle_by_gas` rejects all
    /// gas-metered operations.
    pub max_gas_per_sec: u64,
    /// Payers with account numbers 1..=N are never throttled.
    pub last_throttle_exempt: u64,
    /// "numerator:denominator" applied to the NFT count of a mint.
    pub nft_mint_scale_factor: String,
    /// Charge implicit account creations against the CryptoCreate throttle.
    pub auto_creation_enabled: bool,
    /// Also charge creations implied by an `EthereumTransaction` to an
    /// unknown address. Only read when `auto_creation_enabled` is set.
    pub lazy_creation_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeesConfig {
    /// Tiers driven by transaction-rate utilization.
    pub percent_congestion_multipliers: String,
    /// Tiers driven by gas-throttle utilization.
    pub gas_percent_congestion_multipliers: String,
    /// Seconds a tier must stay crossed before its multiplier applies.
    pub min_congestion_period_secs: u64,
    pub de_escalation: DeEscalation,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for ThrottlingConfig {
    fn default() -> Self {
        Self {
            definitions_path: config_dir().join("throttles.json"),
            throttle_by_gas: true,
            max_gas_per_sec: 15_000_000,
            last_throttle_exempt: 100,
            nft_mint_scale_factor: "5:2".to_string(),
            auto_creation_enabled: true,
            lazy_creation_enabled: true,
        }
    }
}

impl Default for FeesConfig {
    fn default() -> Self {
        Self {
            percent_congestion_multipliers: "90,10x,95,25x,99,100x".to_string(),
            gas_percent_congestion_multipliers: "90,10x,95,25x,99,100x".to_string(),
            min_congestion_period_secs: 60,
            de_escalation: DeEscalation::Immediate,
        }
    }
}

// ── Typed accessors ───────────────────────────────────────────────────────────

impl ThrottlingConfig {
    pub fn nft_scale_factor(&self) -> Result<ScaleFactor, ConfigError> {
        self.nft_mint_scale_factor.parse()
    }
}

impl FeesConfig {
    pub fn congestion_tiers(&self) -> Result<CongestionTiers, ConfigError> {
        self.percent_congestion_multipliers.parse()
    }

    pub fn gas_congestion_tiers(&self) -> Result<CongestionTiers, ConfigError> {
        self.gas_percent_congestion_multipliers.parse()
    }

    pub fn min_congestion_period(&self) -> Duration {
        Duration::from_secs(self.min_congestion_period_secs)
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

pub fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("tollgate")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
    #[error("failed to parse throttle definitions: {0}")]
    DefinitionsParseFailed(serde_json::Error),
    #[error("failed to serialize throttle definitions: {0}")]
    DefinitionsSerializeFailed(serde_json::Error),
    #[error("invalid congestion tiers: {0}")]
    InvalidTiers(String),
    #[error("invalid scale factor '{0}', expected numerator:denominator")]
    InvalidScaleFactor(String),
    #[error("invalid de-escalation policy '{0}'")]
    InvalidDeEscalation(String),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl TollgateConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            Self::from_toml(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            TollgateConfig::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("TOLLGATE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&TollgateConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Parse every string-typed setting so a bad value fails at load time
    /// instead of on first use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.throttling.nft_scale_factor()?;
        self.fees.congestion_tiers()?;
        self.fees.gas_congestion_tiers()?;
        Ok(())
    }

    /// Apply TOLLGATE_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("TOLLGATE_THROTTLING__DEFINITIONS_PATH") {
            self.throttling.definitions_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("TOLLGATE_THROTTLING__THROTTLE_BY_GAS") {
            self.throttling.throttle_by_gas = v == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("TOLLGATE_THROTTLING__MAX_GAS_PER_SEC") {
            if let Ok(n) = v.parse() {
                self.throttling.max_gas_per_sec = n;
            }
        }
        if let Ok(v) = std::env::var("TOLLGATE_THROTTLING__LAST_THROTTLE_EXEMPT") {
            if let Ok(n) = v.parse() {
                self.throttling.last_throttle_exempt = n;
            }
        }
        if let Ok(v) = std::env::var("TOLLGATE_THROTTLING__AUTO_CREATION_ENABLED") {
            self.throttling.auto_creation_enabled = v == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("TOLLGATE_THROTTLING__LAZY_CREATION_ENABLED") {
            self.throttling.lazy_creation_enabled = v == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("TOLLGATE_FEES__MIN_CONGESTION_PERIOD_SECS") {
            if let Ok(n) = v.parse() {
                self.fees.min_congestion_period_secs = n;
            }
        }
    }
}
