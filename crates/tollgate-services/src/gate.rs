//! Atomic multi-throttle admission.
//!
//! A gate names a list of `(throttle, ops)` members over a throttle arena it
//! does not own. `allow` is all-or-nothing: members are tried in list order,
//! and if one denies, every member already granted in the same call is
//! credited back the exact ops it consumed before the gate reports denial.
//!
//! The member order is part of the configuration. It decides which throttle
//! denies first (diagnostics) but never the final outcome.

use tollgate_core::ConsensusTime;

use crate::bucket_throttle::BucketThrottle;
use crate::error::ThrottleConfigError;

/// One throttle the gate must pass, and the logical ops it costs there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateMember {
    /// Index into the throttle arena.
    pub throttle: usize,
    pub ops: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThrottleGate {
    members: Vec<GateMember>,
}

impl ThrottleGate {
    /// Build a gate over `arena`. An absent member list, or a member that
    /// does not name a throttle in the arena, is a configuration error.
    pub fn new(
        arena: &[BucketThrottle],
        members: Option<Vec<GateMember>>,
    ) -> Result<Self, ThrottleConfigError> {
        let members = members.ok_or(ThrottleConfigError::MissingThrottle)?;
        let mut gate = Self::default();
        for member in members {
            gate.push(arena, Some(member))?;
        }
        Ok(gate)
    }

    /// Gate where every member costs the same `ops`.
    pub fn uniform(
        arena: &[BucketThrottle],
        throttles: &[usize],
        ops: u64,
    ) -> Result<Self, ThrottleConfigError> {
        let members = throttles
            .iter()
            .map(|&throttle| GateMember { throttle, ops })
            .collect();
        Self::new(arena, Some(members))
    }

    pub fn push(
        &mut self,
        arena: &[BucketThrottle],
        member: Option<GateMember>,
    ) -> Result<(), ThrottleConfigError> {
        match member {
            Some(member) if member.throttle < arena.len() => {
                self.members.push(member);
                Ok(())
            }
            _ => Err(ThrottleConfigError::MissingThrottle),
        }
    }

    pub fn members(&self) -> &[GateMember] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The same gate with every member's cost multiplied by `n`, or `None`
    /// if any scaled cost overflows.
    pub fn scaled(&self, n: u64) -> Option<Self> {
        let members = self
            .members
            .iter()
            .map(|m| {
                m.ops.checked_mul(n).map(|ops| GateMember {
                    throttle: m.throttle,
                    ops,
                })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self { members })
    }

    /// Admit the request on every member, or on none of them.
    ///
    /// `arena` must be the arena the gate was built over; the caller holds
    /// it mutably for the whole check-and-commit, including rollback.
    pub fn allow(&self, arena: &mut [BucketThrottle], now: ConsensusTime) -> bool {
        for (granted, member) in self.members.iter().enumerate() {
            let admitted = arena
                .get_mut(member.throttle)
                .map(|throttle| throttle.allow_ops(member.ops, now))
                .unwrap_or(false);
            if !admitted {
                for prior in self.members[..granted].iter().rev() {
                    if let Some(throttle) = arena.get_mut(prior.throttle) {
                        throttle.reclaim(prior.ops);
                    }
                }
                return false;
            }
        }
        true
    }
}
