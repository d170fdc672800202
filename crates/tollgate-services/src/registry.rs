//! Functionality throttle registry.
//!
//! One generation of compiled throttles for a fixed node count. The registry
//! owns its throttle arena; a node-count or definitions change builds a new
//! registry and drops the old one whole, never adjusting rates in place.

use std::collections::BTreeMap;

use tollgate_core::{ConsensusTime, OperationTag, ThrottleDefinitions};

use crate::bucket_compiler::compile_bucket;
use crate::bucket_throttle::{BucketThrottle, MILLI_UNITS_PER_OP};
use crate::error::ThrottleConfigError;
use crate::gate::{GateMember, ThrottleGate};

#[derive(Debug, Clone)]
pub struct ThrottleRegistry {
    node_count: u64,
    definitions: ThrottleDefinitions,
    throttles: Vec<BucketThrottle>,
    /// Parallel to `throttles`.
    bucket_names: Vec<String>,
    /// Members are in bucket order, which fixes the gate's check order.
    gates: BTreeMap<OperationTag, ThrottleGate>,
}

impl ThrottleRegistry {
    /// Compile every bucket for `node_count` nodes. Any bad bucket fails the
    /// whole build.
    pub fn build(
        definitions: &ThrottleDefinitions,
        node_count: u64,
    ) -> Result<Self, ThrottleConfigError> {
        let mut throttles = Vec::with_capacity(definitions.buckets.len());
        let mut bucket_names = Vec::with_capacity(definitions.buckets.len());
        let mut members: BTreeMap<OperationTag, Vec<GateMember>> = BTreeMap::new();

        for spec in &definitions.buckets {
            let compiled = compile_bucket(spec, node_count)?;
            let index = throttles.len();
            for (operation, ops) in compiled.requirements {
                members.entry(operation).or_default().push(GateMember {
                    throttle: index,
                    ops,
                });
            }
            throttles.push(compiled.throttle);
            bucket_names.push(compiled.name);
        }

        let mut gates = BTreeMap::new();
        for (op, members) in members {
            gates.insert(op, ThrottleGate::new(&throttles, Some(members))?);
        }

        Ok(Self {
            node_count,
            definitions: definitions.clone(),
            throttles,
            bucket_names,
            gates,
        })
    }

    /// Admit one call of `op`. Operations with no throttle always pass.
    pub fn allow(&mut self, op: OperationTag, now: ConsensusTime) -> bool {
        self.allow_n(op, 1, now)
    }

    /// Admit `n` calls of `op` as one all-or-nothing decision.
    pub fn allow_n(&mut self, op: OperationTag, n: u64, now: ConsensusTime) -> bool {
        self.allow_all(&[(op, n)], now)
    }

    /// Admit every `(op, n)` demand together or none of them. Members are
    /// checked in demand order, then bucket order within each demand.
    pub fn allow_all(&mut self, demands: &[(OperationTag, u64)], now: ConsensusTime) -> bool {
        let mut members = Vec::new();
        for &(op, n) in demands {
            let Some(gate) = self.gates.get(&op) else {
                continue;
            };
            match gate.scaled(n) {
                Some(scaled) => members.extend_from_slice(scaled.members()),
                None => return false,
            }
        }
        match ThrottleGate::new(&self.throttles, Some(members)) {
            Ok(gate) => gate.allow(&mut self.throttles, now),
            Err(_) => false,
        }
    }

    pub fn is_managed(&self, op: OperationTag) -> bool {
        self.gates.contains_key(&op)
    }

    /// `(throttle index, logical ops)` per call of `op`, in check order.
    pub fn requirements_for(&self, op: OperationTag) -> &[GateMember] {
        self.gates.get(&op).map(ThrottleGate::members).unwrap_or(&[])
    }

    pub fn throttles_for(&self, op: OperationTag) -> Vec<&BucketThrottle> {
        self.requirements_for(op)
            .iter()
            .filter_map(|m| self.throttles.get(m.throttle))
            .collect()
    }

    pub fn all_throttles(&self) -> &[BucketThrottle] {
        &self.throttles
    }

    pub(crate) fn throttles_mut(&mut self) -> &mut [BucketThrottle] {
        &mut self.throttles
    }

    pub fn bucket_name(&self, throttle: usize) -> Option<&str> {
        self.bucket_names.get(throttle).map(String::as_str)
    }

    pub fn node_count(&self) -> u64 {
        self.node_count
    }

    /// The definitions this generation was compiled from.
    pub fn definitions(&self) -> &ThrottleDefinitions {
        &self.definitions
    }

    /// Per-operation effective rates on this node, sorted by operation name.
    pub fn summary(&self) -> String {
        let mut ops: Vec<_> = self.gates.iter().collect();
        ops.sort_by_key(|(op, _)| op.name());

        let mut out = format!(
            "Resolved throttles (after splitting capacity {} ways) - ",
            self.node_count
        );
        for (op, gate) in ops {
            let rates: Vec<String> = gate
                .members()
                .iter()
                .filter_map(|m| {
                    let throttle = self.throttles.get(m.throttle)?;
                    let name = self.bucket_name(m.throttle)?;
                    let tps = throttle.mtps() as f64 / (m.ops * MILLI_UNITS_PER_OP) as f64;
                    Some(format!("{tps:.2} tps ({name})"))
                })
                .collect();
            out.push_str(&format!("\n  {}: min{{{}}}", op, rates.join(", ")));
        }
        out
    }
}
