//! The two congestion multiplier sources a node maintains: one driven by
//! transaction-rate utilization of the operation throttles, one by the gas
//! throttle. How a fee calculator combines them is its own business.

use serde::{Deserialize, Serialize};
use tollgate_core::{ConfigError, ConsensusTime, FeesConfig, OperationTag};

use crate::accumulator::ThrottleAccumulator;
use crate::multiplier::{CongestionLevelStarts, CongestionMultiplierSource, MultiplierReader, MultiplierSettings};

/// Saved start times and de-escalation timers of both sources, for the
/// persistence layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplierSnapshot {
    pub generic: Vec<Option<ConsensusTime>>,
    pub gas: Vec<Option<ConsensusTime>>,
    #[serde(default)]
    pub generic_below: Vec<Option<ConsensusTime>>,
    #[serde(default)]
    pub gas_below: Vec<Option<ConsensusTime>>,
}

#[derive(Debug)]
pub struct MultiplierSources {
    generic: CongestionMultiplierSource,
    gas: CongestionMultiplierSource,
}

impl MultiplierSources {
    pub fn new(generic: CongestionMultiplierSource, gas: CongestionMultiplierSource) -> Self {
        Self { generic, gas }
    }

    pub fn from_config(fees: &FeesConfig) -> Result<Self, ConfigError> {
        let dwell = fees.min_congestion_period();
        let generic = MultiplierSettings::new(fees.congestion_tiers()?, dwell)
            .with_de_escalation(fees.de_escalation);
        let gas = MultiplierSettings::new(fees.gas_congestion_tiers()?, dwell)
            .with_de_escalation(fees.de_escalation);
        Ok(Self::new(
            CongestionMultiplierSource::new("generic", generic),
            CongestionMultiplierSource::new("gas", gas),
        ))
    }

    /// Sample the accumulator's throttles at `now`.
    pub fn update_multiplier(&mut self, accumulator: &ThrottleAccumulator, now: ConsensusTime) {
        let active: Vec<_> = accumulator.all_active_throttles().iter().collect();
        self.generic.update_multiplier(&active, now);
        let gas: Vec<_> = accumulator.gas_limit_throttle().into_iter().collect();
        self.gas.update_multiplier(&gas, now);
    }

    pub fn reset_expectations(&mut self) {
        self.generic.reset_expectations();
        self.gas.reset_expectations();
    }

    pub fn reset_congestion_level_starts(
        &mut self,
        generic: &[Option<ConsensusTime>],
        gas: &[Option<ConsensusTime>],
    ) {
        self.generic.reset_congestion_level_starts(generic);
        self.gas.reset_congestion_level_starts(gas);
    }

    pub fn generic_congestion_starts(&self) -> CongestionLevelStarts {
        self.generic.congestion_level_starts()
    }

    pub fn gas_congestion_starts(&self) -> CongestionLevelStarts {
        self.gas.congestion_level_starts()
    }

    pub fn snapshot(&self) -> MultiplierSnapshot {
        MultiplierSnapshot {
            generic: self.generic_congestion_starts().to_vec(),
            gas: self.gas_congestion_starts().to_vec(),
            generic_below: self.generic.below_threshold_since(),
            gas_below: self.gas.below_threshold_since(),
        }
    }

    pub fn restore(&mut self, snapshot: &MultiplierSnapshot) {
        self.reset_congestion_level_starts(&snapshot.generic, &snapshot.gas);
        self.generic.reset_below_threshold_since(&snapshot.generic_below);
        self.gas.reset_below_threshold_since(&snapshot.gas_below);
    }

    /// Multiplier of the source responsible for `op`.
    pub fn current_multiplier(&self, op: OperationTag, now: ConsensusTime) -> u64 {
        self.source_for(op).current_multiplier(now)
    }

    pub fn generic(&self) -> &CongestionMultiplierSource {
        &self.generic
    }

    pub fn gas(&self) -> &CongestionMultiplierSource {
        &self.gas
    }

    pub fn readers(&self) -> MultiplierReaders {
        MultiplierReaders {
            generic: self.generic.reader(),
            gas: self.gas.reader(),
        }
    }

    fn source_for(&self, op: OperationTag) -> &CongestionMultiplierSource {
        if op.is_gas_metered() {
            &self.gas
        } else {
            &self.generic
        }
    }
}

/// Query-side handles for both sources.
#[derive(Debug, Clone)]
pub struct MultiplierReaders {
    pub generic: MultiplierReader,
    pub gas: MultiplierReader,
}

impl MultiplierReaders {
    pub fn current_multiplier(&self, op: OperationTag, now: ConsensusTime) -> u64 {
        if op.is_gas_metered() {
            self.gas.current_multiplier(now)
        } else {
            self.generic.current_multiplier(now)
        }
    }
}
