//! Congestion tiers, throttle scale factors, and the de-escalation policy.
//!
//! Tiers are written in config as alternating thresholds and multipliers:
//! `"90,10x,95,25x,99,100x"` means 10x fees once utilization has stayed at
//! or above 90% for the minimum congestion period, 25x at 95%, 100x at 99%.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CongestionTier {
    pub threshold_percent: u32,
    pub multiplier: u64,
}

/// Tiers in strictly ascending threshold order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CongestionTiers(Vec<CongestionTier>);

impl CongestionTiers {
    pub fn new(tiers: Vec<CongestionTier>) -> Result<Self, ConfigError> {
        for pair in tiers.windows(2) {
            if pair[1].threshold_percent <= pair[0].threshold_percent {
                return Err(ConfigError::InvalidTiers(format!(
                    "thresholds must ascend, got {} after {}",
                    pair[1].threshold_percent, pair[0].threshold_percent
                )));
            }
        }
        if let Some(tier) = tiers.iter().find(|t| t.multiplier == 0) {
            return Err(ConfigError::InvalidTiers(format!(
                "multiplier at {}% must be at least 1",
                tier.threshold_percent
            )));
        }
        Ok(Self(tiers))
    }

    pub fn as_slice(&self) -> &[CongestionTier] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for CongestionTiers {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::default());
        }
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() % 2 != 0 {
            return Err(ConfigError::InvalidTiers(format!(
                "expected threshold,multiplier pairs in '{s}'"
            )));
        }
        let mut tiers = Vec::with_capacity(parts.len() / 2);
        for pair in parts.chunks(2) {
            let threshold_percent = pair[0].parse::<u32>().map_err(|_| {
                ConfigError::InvalidTiers(format!("bad threshold '{}'", pair[0]))
            })?;
            let multiplier = pair[1]
                .strip_suffix('x')
                .and_then(|m| m.parse::<u64>().ok())
                .ok_or_else(|| ConfigError::InvalidTiers(format!("bad multiplier '{}'", pair[1])))?;
            tiers.push(CongestionTier {
                threshold_percent,
                multiplier,
            });
        }
        Self::new(tiers)
    }
}

impl fmt::Display for CongestionTiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .0
            .iter()
            .map(|t| format!("{},{}x", t.threshold_percent, t.multiplier))
            .collect();
        f.write_str(&rendered.join(","))
    }
}

/// Scales a nominal count of operations into throttle calls, e.g. an NFT
/// mint of `k` serials costs `max(1, k * numerator / denominator)` mints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleFactor {
    pub numerator: u32,
    pub denominator: u32,
}

impl ScaleFactor {
    pub const ONE: Self = Self {
        numerator: 1,
        denominator: 1,
    };

    pub fn scale(&self, nominal: u32) -> u64 {
        let scaled = u64::from(nominal) * u64::from(self.numerator) / u64::from(self.denominator);
        scaled.max(1)
    }
}

impl FromStr for ScaleFactor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ConfigError::InvalidScaleFactor(s.to_string());
        let (num, den) = s.trim().split_once(':').ok_or_else(bad)?;
        let numerator = num.trim().parse::<u32>().map_err(|_| bad())?;
        let denominator = den.trim().parse::<u32>().map_err(|_| bad())?;
        if denominator == 0 {
            return Err(bad());
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.numerator, self.denominator)
    }
}

/// How a crossed congestion tier is released once utilization falls back
/// below its threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeEscalation {
    /// The tier's start is cleared on the first sample below threshold.
    #[default]
    Immediate,
    /// The tier's start is cleared only after utilization has stayed below
    /// threshold for the same minimum congestion period.
    AfterDwell,
}

impl FromStr for DeEscalation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "immediate" => Ok(Self::Immediate),
            "after-dwell" => Ok(Self::AfterDwell),
            other => Err(ConfigError::InvalidDeEscalation(other.to_string())),
        }
    }
}
