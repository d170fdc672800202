//! Per-node throttle accumulator.
//!
//! The dispatch pipeline's single entry point for admission. Owns the
//! current registry generation and the gas throttle, and turns one
//! transaction's usage into one all-or-nothing decision across every
//! throttle it touches.

use tollgate_core::{ConsensusTime, OperationTag, ScaleFactor, ThrottleDefinitions, ThrottlingConfig};

use crate::bucket_throttle::{BucketThrottle, MILLI_UNITS_PER_OP};
use crate::error::ThrottleConfigError;
use crate::registry::ThrottleRegistry;
use crate::usage::TxnUsage;

#[derive(Debug)]
pub struct ThrottleAccumulator {
    node_count: u64,
    throttle_by_gas: bool,
    max_gas_per_sec: u64,
    last_throttle_exempt: u64,
    nft_scale_factor: ScaleFactor,
    auto_creation_enabled: bool,
    lazy_creation_enabled: bool,
    registry: ThrottleRegistry,
    gas_throttle: Option<BucketThrottle>,
    last_txn_gas_throttled: bool,
}

impl ThrottleAccumulator {
    /// An accumulator with no buckets yet. Every managed operation is
    /// rejected until [`rebuild_for`](Self::rebuild_for) installs definitions.
    pub fn new(node_count: u64, config: &ThrottlingConfig) -> Result<Self, ThrottleConfigError> {
        if node_count == 0 {
            return Err(ThrottleConfigError::ZeroNodeCount);
        }
        let mut accumulator = Self {
            node_count,
            throttle_by_gas: config.throttle_by_gas,
            max_gas_per_sec: config.max_gas_per_sec,
            last_throttle_exempt: config.last_throttle_exempt,
            nft_scale_factor: config.nft_scale_factor()?,
            auto_creation_enabled: config.auto_creation_enabled,
            lazy_creation_enabled: config.lazy_creation_enabled,
            registry: ThrottleRegistry::build(&ThrottleDefinitions::default(), node_count)?,
            gas_throttle: None,
            last_txn_gas_throttled: false,
        };
        accumulator.apply_gas_config();
        Ok(accumulator)
    }

    /// Compile `definitions` for the current node count and replace the
    /// registry generation. On error the old generation stays in place.
    pub fn rebuild_for(&mut self, definitions: &ThrottleDefinitions) -> Result<(), ThrottleConfigError> {
        let registry = ThrottleRegistry::build(definitions, self.node_count)?;
        let fingerprint = definitions.fingerprint()?;
        tracing::info!(
            node_count = self.node_count,
            buckets = definitions.buckets.len(),
            fingerprint = %fingerprint,
            "{}",
            registry.summary()
        );
        self.registry = registry;
        Ok(())
    }

    /// Rebuild the current definitions for a new membership size.
    pub fn set_node_count(&mut self, node_count: u64) -> Result<(), ThrottleConfigError> {
        if node_count == 0 {
            return Err(ThrottleConfigError::ZeroNodeCount);
        }
        let previous = self.node_count;
        self.node_count = node_count;
        let definitions = self.registry.definitions().clone();
        if let Err(e) = self.rebuild_for(&definitions) {
            self.node_count = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Take new throttling settings. Bucket definitions are untouched; the
    /// gas throttle is rebuilt.
    pub fn apply_config(&mut self, config: &ThrottlingConfig) -> Result<(), ThrottleConfigError> {
        self.nft_scale_factor = config.nft_scale_factor()?;
        self.throttle_by_gas = config.throttle_by_gas;
        self.max_gas_per_sec = config.max_gas_per_sec;
        self.last_throttle_exempt = config.last_throttle_exempt;
        self.auto_creation_enabled = config.auto_creation_enabled;
        self.lazy_creation_enabled = config.lazy_creation_enabled;
        self.apply_gas_config();
        Ok(())
    }

    /// (Re)build the gas throttle. The gas budget is enforced per node
    /// without splitting across the network.
    pub fn apply_gas_config(&mut self) {
        if self.throttle_by_gas && self.max_gas_per_sec == 0 {
            tracing::warn!("consensus gas throttling enabled, but limited to 0 gas/sec");
            self.gas_throttle = None;
            return;
        }
        self.gas_throttle = Some(BucketThrottle::with_mtps_and_burst(
            self.max_gas_per_sec.saturating_mul(MILLI_UNITS_PER_OP),
            1,
        ));
        if self.throttle_by_gas {
            tracing::info!(
                "Resolved gas throttle -\n  {} gas/sec (throttling ON)",
                self.max_gas_per_sec
            );
        } else {
            tracing::debug!(
                "Resolved gas throttle -\n  {} gas/sec (throttling OFF)",
                self.max_gas_per_sec
            );
        }
    }

    /// `true` means reject. A rejected transaction leaves every throttle as
    /// it found it, apart from leak.
    pub fn should_throttle(&mut self, usage: &TxnUsage, now: ConsensusTime) -> bool {
        self.last_txn_gas_throttled = false;
        if self.is_exempt(usage.payer) {
            return false;
        }
        let op = usage.operation;
        if !self.registry.is_managed(op) {
            return true;
        }

        let mut gas_reserved = None;
        if self.throttle_by_gas && op.is_gas_metered() {
            let admitted = self
                .gas_throttle
                .as_mut()
                .is_some_and(|gas| gas.allow_ops(usage.gas_limit, now));
            if !admitted {
                self.last_txn_gas_throttled = true;
                return true;
            }
            gas_reserved = Some(usage.gas_limit);
        }

        let calls = match op {
            OperationTag::TokenMint if usage.nft_count > 0 => {
                self.nft_scale_factor.scale(usage.nft_count)
            }
            _ => 1,
        };
        let mut demands = vec![(op, calls)];
        let creations = if self.charges_implicit_creations(op) {
            usage.implicit_creations
        } else {
            0
        };
        let mut admitted = true;
        if creations > 0 {
            if self.registry.is_managed(OperationTag::CryptoCreate) {
                demands.push((OperationTag::CryptoCreate, u64::from(creations)));
            } else {
                admitted = false;
            }
        }
        admitted = admitted && self.registry.allow_all(&demands, now);

        if !admitted {
            if let (Some(gas), Some(reserved)) = (self.gas_throttle.as_mut(), gas_reserved) {
                gas.reclaim(reserved);
            }
        }
        !admitted
    }

    /// `true` means reject `n` calls of `op`, with no scaling, exemption, or
    /// gas check applied.
    pub fn should_throttle_n_of_unscaled(&mut self, n: u64, op: OperationTag, now: ConsensusTime) -> bool {
        if !self.registry.is_managed(op) {
            return true;
        }
        !self.registry.allow_n(op, n, now)
    }

    /// Return gas reserved by an earlier admission that execution did not
    /// use.
    pub fn leak_unused_gas_previously_reserved(&mut self, payer: u64, unused_gas: u64) {
        if self.is_exempt(payer) || !self.throttle_by_gas {
            return;
        }
        if let Some(gas) = self.gas_throttle.as_mut() {
            gas.reclaim(unused_gas);
        }
    }

    pub fn reset_usage(&mut self) {
        self.registry
            .throttles_mut()
            .iter_mut()
            .for_each(BucketThrottle::reset_usage);
        if let Some(gas) = self.gas_throttle.as_mut() {
            gas.reset_usage();
        }
    }

    pub fn was_last_txn_gas_throttled(&self) -> bool {
        self.last_txn_gas_throttled
    }

    pub fn active_throttles_for(&self, op: OperationTag) -> Vec<&BucketThrottle> {
        self.registry.throttles_for(op)
    }

    pub fn all_active_throttles(&self) -> &[BucketThrottle] {
        self.registry.all_throttles()
    }

    pub fn gas_limit_throttle(&self) -> Option<&BucketThrottle> {
        self.gas_throttle.as_ref()
    }

    pub fn registry(&self) -> &ThrottleRegistry {
        &self.registry
    }

    pub fn node_count(&self) -> u64 {
        self.node_count
    }

    fn charges_implicit_creations(&self, op: OperationTag) -> bool {
        match op {
            OperationTag::EthereumTransaction => {
                self.auto_creation_enabled && self.lazy_creation_enabled
            }
            _ => self.auto_creation_enabled && op.may_auto_create(),
        }
    }

    fn is_exempt(&self, payer: u64) -> bool {
        (1..=self.last_throttle_exempt).contains(&payer)
    }
}
