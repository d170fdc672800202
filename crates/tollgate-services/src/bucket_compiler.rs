//! Compiles one configured bucket into a sized throttle plus the logical-op
//! cost of each operation drawing on it.
//!
//! For a bucket with groups `g₁..gₖ`, the reference capacity `R` is the
//! least common multiple of the groups' `opsPerSec`. One call of an
//! operation in group `g` costs `ceil(R / g.opsPerSec)` logical ops, so at
//! full capacity every group gets exactly its configured share. The
//! network-wide rate `R` is split evenly across `n` nodes, truncating:
//! each node enforces `R * 1000 / n` milli-ops per second.

use std::collections::BTreeSet;

use tollgate_core::{OperationTag, ThrottleBucketSpec};

use crate::bucket_throttle::{BucketThrottle, MILLI_UNITS_PER_OP};
use crate::error::ThrottleConfigError;

/// Output of [`compile_bucket`]. Identical on every node for the same
/// `(spec, node_count)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledBucket {
    pub name: String,
    pub throttle: BucketThrottle,
    /// `(operation, logical ops per call)` in group order.
    pub requirements: Vec<(OperationTag, u64)>,
}

pub fn compile_bucket(
    spec: &ThrottleBucketSpec,
    node_count: u64,
) -> Result<CompiledBucket, ThrottleConfigError> {
    let bucket = || spec.name.clone();
    if node_count == 0 {
        return Err(ThrottleConfigError::ZeroNodeCount);
    }
    if spec.throttle_groups.is_empty() {
        return Err(ThrottleConfigError::EmptyBucket { bucket: bucket() });
    }

    let mut seen = BTreeSet::new();
    let mut rates = Vec::with_capacity(spec.throttle_groups.len());
    for group in &spec.throttle_groups {
        let ops_per_sec = u64::try_from(group.ops_per_sec)
            .ok()
            .filter(|&ops| ops > 0)
            .ok_or(ThrottleConfigError::NonPositiveOpsPerSec {
                bucket: bucket(),
                ops_per_sec: group.ops_per_sec,
            })?;
        if group.operations.is_empty() {
            return Err(ThrottleConfigError::EmptyGroup { bucket: bucket() });
        }
        for &operation in &group.operations {
            if !seen.insert(operation) {
                return Err(ThrottleConfigError::DuplicateOperation {
                    bucket: bucket(),
                    operation,
                });
            }
        }
        rates.push(ops_per_sec);
    }

    let overflow = || ThrottleConfigError::CapacityOverflow {
        bucket: bucket(),
        node_count,
    };
    let reference = rates
        .iter()
        .try_fold(1u64, |acc, &rate| checked_lcm(acc, rate))
        .ok_or_else(overflow)?;

    let mut logical_ops = Vec::with_capacity(rates.len());
    for &rate in &rates {
        let ops = reference.div_ceil(rate);
        if ops == 0 || ops.checked_mul(MILLI_UNITS_PER_OP).is_none() {
            return Err(ThrottleConfigError::LogicalOpsOverflow { bucket: bucket() });
        }
        logical_ops.push(ops);
    }
    logical_ops
        .iter()
        .try_fold(0u64, |acc, &ops| acc.checked_add(ops))
        .and_then(|total| total.checked_mul(node_count))
        .ok_or_else(overflow)?;

    let mtps = reference
        .checked_mul(MILLI_UNITS_PER_OP)
        .ok_or_else(overflow)?
        / node_count;
    let burst_secs = u64::try_from(spec.burst_period).unwrap_or(0);
    let capacity = mtps.checked_mul(burst_secs).ok_or_else(overflow)?;

    // Every group must be able to admit at least one call on this node.
    if logical_ops
        .iter()
        .any(|&ops| ops * MILLI_UNITS_PER_OP > capacity)
    {
        return Err(ThrottleConfigError::InsufficientNodeCapacity {
            bucket: bucket(),
            node_count,
        });
    }

    let requirements = spec
        .throttle_groups
        .iter()
        .zip(&logical_ops)
        .flat_map(|(group, &ops)| group.operations.iter().map(move |&op| (op, ops)))
        .collect();

    Ok(CompiledBucket {
        name: spec.name.clone(),
        throttle: BucketThrottle::with_mtps_and_burst(mtps, burst_secs),
        requirements,
    })
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn checked_lcm(a: u64, b: u64) -> Option<u64> {
    (a / gcd(a, b)).checked_mul(b)
}
