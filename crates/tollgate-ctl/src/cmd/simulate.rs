//! Replay a steady stream of one operation against fresh throttles.

use std::path::Path;

use anyhow::{Context, Result};
use tollgate_core::{ConsensusTime, OperationTag, ThrottleDefinitions};
use tollgate_services::ThrottleRegistry;

const NANOS_PER_SEC: u64 = 1_000_000_000;

pub fn cmd_simulate(path: &Path, op: OperationTag, count: u64, tps: u64, nodes: u64) -> Result<()> {
    let defs = ThrottleDefinitions::load(path)
        .with_context(|| format!("failed to load definitions from {}", path.display()))?;
    let mut registry = ThrottleRegistry::build(&defs, nodes)
        .with_context(|| format!("definitions rejected for {} nodes", nodes))?;

    if !registry.is_managed(op) {
        println!("{} has no throttle; every call is admitted.", op);
        return Ok(());
    }

    let spacing = NANOS_PER_SEC / tps.max(1);
    tracing::debug!(operation = %op, count, tps, nodes, "simulating");
    let mut admitted = 0u64;
    let mut first_denial = None;
    for i in 0..count {
        let now = ConsensusTime::EPOCH.plus_nanos(i.saturating_mul(spacing));
        if registry.allow(op, now) {
            admitted += 1;
        } else if first_denial.is_none() {
            first_denial = Some(i);
        }
    }

    println!("  Operation : {}", op);
    println!("  Offered   : {} calls at {} tps", count, tps);
    println!("  Admitted  : {}", admitted);
    println!("  Denied    : {}", count - admitted);
    match first_denial {
        Some(i) => println!("  First denial at call {}", i + 1),
        None => println!("  No denials."),
    }
    Ok(())
}
