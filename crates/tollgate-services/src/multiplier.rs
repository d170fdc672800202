//! Congestion multiplier source.
//!
//! Tracks, per congestion tier, the consensus time at which the monitored
//! throttles first crossed that tier's utilization threshold. A tier's
//! multiplier applies once it has stayed crossed for the minimum dwell.
//!
//! The start array is published as an immutable `Arc<[_]>` and replaced
//! whole on change, so [`MultiplierReader`]s on query threads always see a
//! consistent array while the single writer updates it.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tollgate_core::{CongestionTier, CongestionTiers, ConsensusTime, DeEscalation};

use crate::bucket_throttle::BucketThrottle;

/// One optional start time per tier, parallel to the tier list.
pub type CongestionLevelStarts = Arc<[Option<ConsensusTime>]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiplierSettings {
    pub tiers: CongestionTiers,
    pub min_dwell: Duration,
    pub de_escalation: DeEscalation,
}

impl MultiplierSettings {
    pub fn new(tiers: CongestionTiers, min_dwell: Duration) -> Self {
        Self {
            tiers,
            min_dwell,
            de_escalation: DeEscalation::default(),
        }
    }

    pub fn with_de_escalation(mut self, de_escalation: DeEscalation) -> Self {
        self.de_escalation = de_escalation;
        self
    }
}

#[derive(Debug)]
struct Published {
    tiers: Vec<CongestionTier>,
    min_dwell_nanos: u64,
    starts: RwLock<CongestionLevelStarts>,
}

impl Published {
    fn snapshot(&self) -> CongestionLevelStarts {
        self.starts.read().clone()
    }

    fn multiplier_at(&self, now: ConsensusTime) -> u64 {
        let starts = self.snapshot();
        self.tiers
            .iter()
            .zip(starts.iter().copied())
            .rev()
            .find_map(|(tier, start)| {
                start
                    .filter(|&since| now.nanos_since(since) >= self.min_dwell_nanos)
                    .map(|_| tier.multiplier)
            })
            .unwrap_or(1)
    }
}

/// Read-only view of a source's published starts, safe to share with query
/// threads.
#[derive(Debug, Clone)]
pub struct MultiplierReader {
    published: Arc<Published>,
}

impl MultiplierReader {
    pub fn current_multiplier(&self, now: ConsensusTime) -> u64 {
        self.published.multiplier_at(now)
    }

    pub fn congestion_level_starts(&self) -> CongestionLevelStarts {
        self.published.snapshot()
    }
}

/// Integer trigger points in milli-units, `[throttle][tier]`, for the
/// throttle capacities they were computed from.
#[derive(Debug)]
struct Triggers {
    capacities: Vec<u64>,
    values: Vec<Vec<u64>>,
}

impl Triggers {
    fn compute(capacities: Vec<u64>, tiers: &[CongestionTier]) -> Self {
        let values = capacities
            .iter()
            .map(|&capacity| {
                tiers
                    .iter()
                    .map(|tier| {
                        let trigger =
                            u128::from(capacity) * u128::from(tier.threshold_percent) / 100;
                        u64::try_from(trigger).unwrap_or(u64::MAX)
                    })
                    .collect()
            })
            .collect();
        Self { capacities, values }
    }
}

/// The single-writer side of one multiplier source.
#[derive(Debug)]
pub struct CongestionMultiplierSource {
    label: &'static str,
    de_escalation: DeEscalation,
    published: Arc<Published>,
    /// When utilization last dropped below each tier, for `AfterDwell`.
    below_since: Vec<Option<ConsensusTime>>,
    triggers: Option<Triggers>,
}

impl CongestionMultiplierSource {
    pub fn new(label: &'static str, settings: MultiplierSettings) -> Self {
        let tiers = settings.tiers.as_slice().to_vec();
        let tier_count = tiers.len();
        let min_dwell_nanos = u64::try_from(settings.min_dwell.as_nanos()).unwrap_or(u64::MAX);
        Self {
            label,
            de_escalation: settings.de_escalation,
            published: Arc::new(Published {
                tiers,
                min_dwell_nanos,
                starts: RwLock::new(vec![None; tier_count].into()),
            }),
            below_since: vec![None; tier_count],
            triggers: None,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn reader(&self) -> MultiplierReader {
        MultiplierReader {
            published: Arc::clone(&self.published),
        }
    }

    /// Sample the monitored throttles at `now` and move tier start times.
    /// Zero-capacity throttles never count as congested.
    pub fn update_multiplier(&mut self, throttles: &[&BucketThrottle], now: ConsensusTime) {
        let tier_count = self.published.tiers.len();
        if tier_count == 0 {
            return;
        }
        self.refresh_triggers(throttles);
        let Some(triggers) = &self.triggers else {
            return;
        };

        let mut crossed = vec![false; tier_count];
        for (throttle, trigger_row) in throttles.iter().zip(&triggers.values) {
            if throttle.capacity_milli() == 0 {
                continue;
            }
            let used = throttle.used_at(now);
            for (hit, &trigger) in crossed.iter_mut().zip(trigger_row) {
                *hit |= used >= trigger;
            }
        }

        let current = self.published.snapshot();
        let mut next: Vec<Option<ConsensusTime>> = current.to_vec();
        for (i, &hit) in crossed.iter().enumerate() {
            if hit {
                self.below_since[i] = None;
                if next[i].is_none() {
                    tracing::debug!(source = self.label, tier = i, at = %now, "congestion tier crossed");
                    next[i] = Some(now);
                }
                continue;
            }
            if next[i].is_none() {
                self.below_since[i] = None;
                continue;
            }
            let clear = match self.de_escalation {
                DeEscalation::Immediate => true,
                DeEscalation::AfterDwell => {
                    let since = *self.below_since[i].get_or_insert(now);
                    now.nanos_since(since) >= self.published.min_dwell_nanos
                }
            };
            if clear {
                tracing::debug!(source = self.label, tier = i, at = %now, "congestion tier cleared");
                next[i] = None;
                self.below_since[i] = None;
            }
        }

        if next.as_slice() != &current[..] {
            *self.published.starts.write() = next.into();
        }
    }

    pub fn current_multiplier(&self, now: ConsensusTime) -> u64 {
        self.published.multiplier_at(now)
    }

    /// Forget cached trigger points so the next update recomputes them from
    /// the throttles it is handed. Start times and de-escalation timers are
    /// kept.
    pub fn reset_expectations(&mut self) {
        self.triggers = None;
    }

    pub fn congestion_level_starts(&self) -> CongestionLevelStarts {
        self.published.snapshot()
    }

    /// Restore a saved start array verbatim. An array whose length does not
    /// match the tier count cannot be aligned and is discarded.
    pub fn reset_congestion_level_starts(&mut self, saved: &[Option<ConsensusTime>]) {
        let restored: CongestionLevelStarts = self.aligned(saved, "congestion starts").into();
        *self.published.starts.write() = restored;
    }

    /// Per tier, when utilization last fell below the tier while its start
    /// was still set. Only `AfterDwell` sources ever fill this in, and it is
    /// persisted alongside the starts.
    pub fn below_threshold_since(&self) -> Vec<Option<ConsensusTime>> {
        self.below_since.clone()
    }

    /// Restore saved de-escalation timers, with the same length rule as
    /// [`reset_congestion_level_starts`](Self::reset_congestion_level_starts).
    pub fn reset_below_threshold_since(&mut self, saved: &[Option<ConsensusTime>]) {
        self.below_since = self.aligned(saved, "de-escalation timers");
    }

    fn aligned(&self, saved: &[Option<ConsensusTime>], what: &'static str) -> Vec<Option<ConsensusTime>> {
        let tier_count = self.published.tiers.len();
        if saved.len() == tier_count {
            return saved.to_vec();
        }
        tracing::warn!(
            source = self.label,
            saved = saved.len(),
            tiers = tier_count,
            "ignoring saved {what} with mismatched length"
        );
        vec![None; tier_count]
    }

    fn refresh_triggers(&mut self, throttles: &[&BucketThrottle]) {
        let capacities: Vec<u64> = throttles.iter().map(|t| t.capacity_milli()).collect();
        let stale = self
            .triggers
            .as_ref()
            .map_or(true, |cached| cached.capacities != capacities);
        if stale {
            self.triggers = Some(Triggers::compute(capacities, &self.published.tiers));
        }
    }
}
