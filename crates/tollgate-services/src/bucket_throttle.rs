//! Deterministic token-bucket throttle.
//!
//! Capacity is tracked in milli-units (thousandths of a logical operation)
//! so fractional rates survive without floating point. One call of `n`
//! logical operations costs `n * 1000` milli-units. Usage leaks at
//! `mtps` milli-units per second of consensus time.
//!
//! Given the same rate/burst history and the same `(n, now)` sequence, every
//! replica computes the same decisions and the same final state.

use tollgate_core::ConsensusTime;

/// Milli-units consumed by one logical operation.
pub const MILLI_UNITS_PER_OP: u64 = 1_000;

const NANOS_PER_SEC: u128 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketThrottle {
    mtps: u64,
    burst_secs: u64,
    capacity: u64,
    used: u64,
    last_decision: Option<ConsensusTime>,
}

impl BucketThrottle {
    pub fn with_tps_and_burst(tps: i64, burst_secs: i64) -> Self {
        let mut throttle = Self::empty();
        throttle.set_tps(tps);
        throttle.set_burst_secs(burst_secs);
        throttle
    }

    pub fn with_mtps_and_burst(mtps: u64, burst_secs: u64) -> Self {
        let mut throttle = Self::empty();
        throttle.mtps = mtps;
        throttle.burst_secs = burst_secs;
        throttle.recompute_capacity();
        throttle
    }

    fn empty() -> Self {
        Self {
            mtps: 0,
            burst_secs: 0,
            capacity: 0,
            used: 0,
            last_decision: None,
        }
    }

    /// Negative rates clamp to zero.
    pub fn set_tps(&mut self, tps: i64) {
        let tps = u64::try_from(tps).unwrap_or(0);
        self.set_mtps(tps.saturating_mul(MILLI_UNITS_PER_OP));
    }

    pub fn set_mtps(&mut self, mtps: u64) {
        self.mtps = mtps;
        self.recompute_capacity();
    }

    /// Negative bursts clamp to zero.
    pub fn set_burst_secs(&mut self, burst_secs: i64) {
        self.burst_secs = u64::try_from(burst_secs).unwrap_or(0);
        self.recompute_capacity();
    }

    fn recompute_capacity(&mut self) {
        self.capacity = self.mtps.saturating_mul(self.burst_secs);
        // Never raised, only clamped down.
        self.used = self.used.min(self.capacity);
    }

    /// Admit one logical operation.
    pub fn allow_one(&mut self, now: ConsensusTime) -> bool {
        self.allow(1, now)
    }

    /// Admit `n` logical operations. A negative `n` is denied without
    /// touching any state.
    pub fn allow(&mut self, n: i64, now: ConsensusTime) -> bool {
        match u64::try_from(n) {
            Ok(n) => self.allow_ops(n, now),
            Err(_) => false,
        }
    }

    /// Admit `n` logical operations. The leak up to `now` is committed even
    /// when the request is denied, so idle buckets keep draining.
    pub fn allow_ops(&mut self, n: u64, now: ConsensusTime) -> bool {
        let drained = self.used_at(now);
        let requested = u128::from(n) * u128::from(MILLI_UNITS_PER_OP);
        let admitted = u128::from(drained) + requested <= u128::from(self.capacity);
        self.used = if admitted {
            // Bounded by capacity, so the narrowing cannot truncate.
            (u128::from(drained) + requested) as u64
        } else {
            drained
        };
        self.last_decision = Some(now);
        admitted
    }

    /// Credit back `n` logical operations; the exact inverse of a successful
    /// `allow_ops(n, _)`.
    pub fn reclaim(&mut self, n: u64) {
        self.used = self
            .used
            .saturating_sub(n.saturating_mul(MILLI_UNITS_PER_OP));
    }

    /// Usage projected forward to `now` without committing the leak.
    pub fn used_at(&self, now: ConsensusTime) -> u64 {
        let elapsed = self
            .last_decision
            .map(|last| now.nanos_since(last))
            .unwrap_or(0);
        let leaked = u128::from(elapsed) * u128::from(self.mtps) / NANOS_PER_SEC;
        u64::try_from(u128::from(self.used).saturating_sub(leaked)).unwrap_or(0)
    }

    /// Integer percentage of capacity in use at `now`. A zero-capacity
    /// throttle reports 0.
    pub fn percent_used(&self, now: ConsensusTime) -> u64 {
        if self.capacity == 0 {
            return 0;
        }
        (u128::from(self.used_at(now)) * 100 / u128::from(self.capacity)) as u64
    }

    pub fn reset_usage(&mut self) {
        self.used = 0;
    }

    /// Capacity in whole logical operations.
    pub fn capacity(&self) -> u64 {
        self.capacity / MILLI_UNITS_PER_OP
    }

    pub fn capacity_milli(&self) -> u64 {
        self.capacity
    }

    /// Milli-units in use as of the last decision.
    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn mtps(&self) -> u64 {
        self.mtps
    }

    pub fn tps(&self) -> u64 {
        self.mtps / MILLI_UNITS_PER_OP
    }

    pub fn burst_secs(&self) -> u64 {
        self.burst_secs
    }

    pub fn last_decision(&self) -> Option<ConsensusTime> {
        self.last_decision
    }
}
