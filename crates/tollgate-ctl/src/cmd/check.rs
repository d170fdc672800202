//! Validate throttle definitions for a network size.

use std::path::Path;

use anyhow::{Context, Result};
use tollgate_core::ThrottleDefinitions;
use tollgate_services::ThrottleRegistry;

pub fn cmd_check(path: &Path, nodes: u64) -> Result<()> {
    tracing::debug!(path = %path.display(), nodes, "checking definitions");
    let defs = ThrottleDefinitions::load(path)
        .with_context(|| format!("failed to load definitions from {}", path.display()))?;
    let registry = ThrottleRegistry::build(&defs, nodes)
        .with_context(|| format!("definitions rejected for {} nodes", nodes))?;

    println!("═══════════════════════════════════════");
    println!("  Throttle Definitions");
    println!("═══════════════════════════════════════");
    println!("  File        : {}", path.display());
    println!("  Buckets     : {}", defs.buckets.len());
    println!("  Fingerprint : {}", defs.fingerprint()?);
    println!();

    for (index, throttle) in registry.all_throttles().iter().enumerate() {
        let name = registry.bucket_name(index).unwrap_or("?");
        println!("  ┌─ {}", name);
        println!("  │  rate     : {} milli-ops/sec", throttle.mtps());
        println!("  │  burst    : {}s", throttle.burst_secs());
        println!("  └─ capacity : {} ops", throttle.capacity());
    }
    println!();
    println!("{}", registry.summary());

    Ok(())
}
