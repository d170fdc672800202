//! Throttle definitions: the network-wide bucket configuration.
//!
//! Every node must load byte-identical definitions. The JSON form is:
//!
//! ```json
//! {"buckets":[{"name":"A","burstPeriod":2,"throttleGroups":[
//!     {"opsPerSec":12,"operations":["ContractCall"]}]}]}
//! ```
//!
//! Semantic validation (degenerate rates, duplicate operations, overflow)
//! happens when a bucket is compiled, not here.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::ConfigError;
use crate::operation::OperationTag;

/// One group of operations sharing a nominal throughput inside a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrottleGroupSpec {
    /// Network-wide calls per second allowed for this group.
    pub ops_per_sec: i64,
    pub operations: Vec<OperationTag>,
}

/// A named shared capacity and the operation groups drawing on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrottleBucketSpec {
    /// Diagnostic only.
    pub name: String,
    /// Seconds of rate that may accumulate as burst capacity.
    pub burst_period: i64,
    pub throttle_groups: Vec<ThrottleGroupSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleDefinitions {
    pub buckets: Vec<ThrottleBucketSpec>,
}

impl ThrottleGroupSpec {
    pub fn new(ops_per_sec: i64, operations: impl IntoIterator<Item = OperationTag>) -> Self {
        Self {
            ops_per_sec,
            operations: operations.into_iter().collect(),
        }
    }
}

impl ThrottleBucketSpec {
    pub fn new(
        name: impl Into<String>,
        burst_period: i64,
        throttle_groups: Vec<ThrottleGroupSpec>,
    ) -> Self {
        Self {
            name: name.into(),
            burst_period,
            throttle_groups,
        }
    }
}

impl ThrottleDefinitions {
    pub fn new(buckets: Vec<ThrottleBucketSpec>) -> Self {
        Self { buckets }
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(ConfigError::DefinitionsParseFailed)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string(self).map_err(ConfigError::DefinitionsSerializeFailed)
    }

    /// Read definitions from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        Self::from_json(&text)
    }

    /// BLAKE3 of the canonical JSON encoding, hex encoded.
    ///
    /// Nodes log this on every rebuild so operators can confirm the whole
    /// network is running the same definitions.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let canonical = serde_json::to_vec(self).map_err(ConfigError::DefinitionsSerializeFailed)?;
        Ok(hex::encode(blake3::hash(&canonical).as_bytes()))
    }
}
