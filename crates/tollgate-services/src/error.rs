//! Configuration errors raised while compiling throttle definitions.
//!
//! Every one of these is fatal to startup or reconfiguration: a node that
//! tolerated a definition its peers rejected would diverge from them.

use tollgate_core::{ConfigError, OperationTag};

#[derive(Debug, thiserror::Error)]
pub enum ThrottleConfigError {
    #[error("node count must be at least 1")]
    ZeroNodeCount,
    #[error("bucket '{bucket}' has no throttle groups")]
    EmptyBucket { bucket: String },
    #[error("bucket '{bucket}' has a throttle group with no operations")]
    EmptyGroup { bucket: String },
    #[error("bucket '{bucket}' has a group with non-positive opsPerSec {ops_per_sec}")]
    NonPositiveOpsPerSec { bucket: String, ops_per_sec: i64 },
    #[error("bucket '{bucket}' lists {operation} in more than one group")]
    DuplicateOperation {
        bucket: String,
        operation: OperationTag,
    },
    #[error("bucket '{bucket}' needs an unrepresentable number of logical ops per call")]
    LogicalOpsOverflow { bucket: String },
    #[error("bucket '{bucket}' capacity overflows with {node_count} nodes")]
    CapacityOverflow { bucket: String, node_count: u64 },
    #[error("bucket '{bucket}' contains an unsatisfiable opsPerSec with {node_count} nodes")]
    InsufficientNodeCapacity { bucket: String, node_count: u64 },
    #[error("throttle gate has a missing member throttle")]
    MissingThrottle,
    #[error(transparent)]
    Config(#[from] ConfigError),
}
