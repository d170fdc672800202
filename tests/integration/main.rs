//! Tollgate integration test harness.
//!
//! Tests here drive whole nodes: an accumulator plus its multiplier sources,
//! fed a scripted transaction stream with explicit consensus times. Nothing
//! reads the wall clock, so every run is reproducible.

use anyhow::{Context, Result};
use tollgate_core::{
    ConsensusTime, FeesConfig, OperationTag, ThrottleDefinitions, ThrottlingConfig, TollgateConfig,
};
use tollgate_services::{MultiplierSources, ThrottleAccumulator, TxnUsage};

mod concurrency;
mod config;
mod determinism;
mod reconfiguration;
mod restart;

// ── Harness ───────────────────────────────────────────────────────────────────

pub const FIXTURE: &str = include_str!("../../crates/tollgate-services/tests/fixtures/throttles.json");

/// Ordinary (non-exempt) payer account.
pub const PAYER: u64 = 50_001;

pub fn t0() -> ConsensusTime {
    ConsensusTime::from_secs(1_700_000_000)
}

pub fn definitions() -> ThrottleDefinitions {
    ThrottleDefinitions::from_json(FIXTURE).expect("fixture parses")
}

/// One node's throttling and pricing state.
pub struct Node {
    pub accumulator: ThrottleAccumulator,
    pub sources: MultiplierSources,
}

impl Node {
    pub fn new(node_count: u64, config: &TollgateConfig) -> Result<Self> {
        let mut accumulator = ThrottleAccumulator::new(node_count, &config.throttling)
            .context("accumulator rejected config")?;
        accumulator
            .rebuild_for(&definitions())
            .context("fixture rejected")?;
        let sources = MultiplierSources::from_config(&config.fees).context("bad fee tiers")?;
        Ok(Self {
            accumulator,
            sources,
        })
    }

    /// Admit or reject one transaction, then resample congestion. Returns
    /// `true` if admitted.
    pub fn handle(&mut self, usage: &TxnUsage, now: ConsensusTime) -> bool {
        let admitted = !self.accumulator.should_throttle(usage, now);
        self.sources.update_multiplier(&self.accumulator, now);
        admitted
    }
}

pub fn test_config() -> TollgateConfig {
    TollgateConfig {
        throttling: ThrottlingConfig {
            max_gas_per_sec: 2_000_000,
            ..ThrottlingConfig::default()
        },
        fees: FeesConfig {
            min_congestion_period_secs: 5,
            ..FeesConfig::default()
        },
    }
}

/// A deterministic mixed workload: contract calls, transfers with and
/// without implicit creations, NFT mints, and queries, spaced `step_nanos`
/// apart.
pub fn workload(len: usize, step_nanos: u64) -> Vec<(TxnUsage, ConsensusTime)> {
    let mix = [
        TxnUsage::new(OperationTag::ContractCall, PAYER).with_gas_limit(150_000),
        TxnUsage::new(OperationTag::CryptoTransfer, PAYER),
        TxnUsage::new(OperationTag::CryptoTransfer, PAYER).with_implicit_creations(1),
        TxnUsage::new(OperationTag::TokenMint, PAYER).with_nft_count(4),
        TxnUsage::new(OperationTag::EthereumTransaction, PAYER).with_gas_limit(400_000),
        TxnUsage::new(OperationTag::CryptoGetAccountBalance, PAYER),
        TxnUsage::new(OperationTag::TokenMint, PAYER),
        TxnUsage::new(OperationTag::ContractCall, 7).with_gas_limit(1_000_000),
    ];
    (0..len)
        .map(|i| {
            let usage = mix[(i * 7 + i / 3) % mix.len()];
            (usage, t0().plus_nanos(i as u64 * step_nanos))
        })
        .collect()
}
