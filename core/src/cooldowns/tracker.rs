//! Charge/recast bookkeeping
//!
//! Every charge pool (one ability, or a group of abilities sharing a pool)
//! keeps the ordered list of pending recharge-completion timestamps. All
//! derived values (current charges, ready time, full-recharge time) are
//! computed from that list relative to the queried time.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use gcdsim_types::ChargePolicy;

use super::CooldownError;
use crate::ability::{Ability, AbilityId, CooldownSpec};

/// A point in simulated time, absolute and relative to the query time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRef {
    pub absolute: f64,
    /// `absolute - query time`, never negative
    pub relative: f64,
}

impl TimeRef {
    fn new(absolute: f64, at: f64) -> Self {
        Self {
            absolute,
            relative: (absolute - at).max(0.0),
        }
    }
}

/// Cooldown state of an ability at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CooldownStatus {
    /// When the next charge is (or was) available
    pub ready_at: TimeRef,
    /// At least one charge is available
    pub ready_to_use: bool,
    /// All charges are available
    pub capped: bool,
    /// When all charges will be available
    pub capped_at: TimeRef,
    pub current_charges: u32,
    pub max_charges: u32,
}

impl CooldownStatus {
    fn always_ready(at: f64) -> Self {
        let now = TimeRef::new(at, at);
        Self {
            ready_at: now,
            ready_to_use: true,
            capped: true,
            capped_at: now,
            current_charges: 1,
            max_charges: 1,
        }
    }
}

/// Capacity of a charge pool, taken from the pool's canonical cooldown.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PoolSpec {
    time: f64,
    charges: u32,
}

impl From<&CooldownSpec> for PoolSpec {
    fn from(spec: &CooldownSpec) -> Self {
        Self {
            time: spec.time,
            charges: spec.charges,
        }
    }
}

/// Pending recharges of one pool, sorted ascending.
#[derive(Debug, Clone)]
struct ChargePool {
    spec: PoolSpec,
    pending: Vec<f64>,
}

impl ChargePool {
    fn new(spec: PoolSpec) -> Self {
        Self {
            spec,
            pending: Vec::new(),
        }
    }

    /// Pending completions still in flight at `at`.
    fn in_flight(&self, at: f64) -> impl Iterator<Item = f64> + '_ {
        self.pending.iter().copied().filter(move |&t| t > at)
    }

    fn prune(&mut self, at: f64) {
        self.pending.retain(|&t| t > at);
    }

    fn status(&self, at: f64) -> CooldownStatus {
        let max_charges = self.spec.charges;
        let in_flight = self.in_flight(at).count() as u32;
        let current_charges = max_charges.saturating_sub(in_flight);
        let earliest = self.in_flight(at).next();
        let latest = self.in_flight(at).last();

        let ready_at = if current_charges > 0 {
            at
        } else {
            earliest.unwrap_or(at)
        };
        let capped_at = latest.unwrap_or(at);

        CooldownStatus {
            ready_at: TimeRef::new(ready_at, at),
            ready_to_use: current_charges > 0,
            capped: in_flight == 0,
            capped_at: TimeRef::new(capped_at, at),
            current_charges,
            max_charges,
        }
    }
}

/// Per-run cooldown tracker.
#[derive(Debug, Clone, Default)]
pub struct CooldownTracker {
    pools: HashMap<AbilityId, ChargePool>,
    policy: ChargePolicy,
}

impl CooldownTracker {
    pub fn new(policy: ChargePolicy) -> Self {
        Self {
            pools: HashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> ChargePolicy {
        self.policy
    }

    /// Fix the capacity of `origin`'s pool before anything draws from it.
    ///
    /// Without a declaration the first ability to use a pool defines its
    /// capacity. Declaring an already known pool keeps its capacity.
    pub fn declare_pool(&mut self, origin: &Ability) {
        if let Some(spec) = origin.cooldown.as_ref() {
            self.pools
                .entry(origin.cooldown_pool())
                .or_insert_with(|| ChargePool::new(spec.into()));
        }
    }

    /// Query the cooldown status of an ability at `at`. Never mutates state.
    ///
    /// Abilities drawing from a known pool report that pool's status, so every
    /// member of a shared pool sees the same charges.
    pub fn status_of(&self, ability: &Ability, at: f64) -> CooldownStatus {
        if let Some(pool) = self.pools.get(&ability.cooldown_pool()) {
            return pool.status(at);
        }
        match ability.cooldown.as_ref() {
            Some(spec) => ChargePool::new(spec.into()).status(at),
            None => CooldownStatus::always_ready(at),
        }
    }

    /// Consume one charge of `ability` at `at`.
    ///
    /// The recharge completes `explicit` seconds (or the declared recast) after
    /// the later of `at` and the last pending recharge, so charges come back
    /// one after another.
    pub fn use_ability(
        &mut self,
        ability: &Ability,
        at: f64,
        explicit: Option<f64>,
    ) -> Result<(), CooldownError> {
        let pool = match (self.pools.entry(ability.cooldown_pool()), ability.cooldown.as_ref()) {
            (Entry::Occupied(entry), _) => entry.into_mut(),
            (Entry::Vacant(entry), Some(spec)) => entry.insert(ChargePool::new(spec.into())),
            (Entry::Vacant(_), None) => return Ok(()),
        };
        pool.prune(at);

        let status = pool.status(at);
        if !status.ready_to_use {
            match self.policy {
                ChargePolicy::Reject => {
                    return Err(CooldownError::NoChargesRemaining {
                        ability: ability.name.clone(),
                        at,
                        ready_at: status.ready_at.absolute,
                    });
                }
                ChargePolicy::Queue => {
                    tracing::warn!(
                        ability = %ability.name,
                        time = at,
                        ready_at = status.ready_at.absolute,
                        "Used ability with no charges remaining, queueing recharge"
                    );
                }
            }
        }

        let duration = explicit.unwrap_or(pool.spec.time);
        let start = pool.pending.last().copied().map_or(at, |last| last.max(at));
        pool.pending.push(start + duration);

        tracing::trace!(
            ability = %ability.name,
            pool = ability.cooldown_pool(),
            time = at,
            recharge_at = start + duration,
            "Consumed charge"
        );
        Ok(())
    }

    /// Forget all pending recharges. Declared pool capacities are kept.
    pub fn reset(&mut self) {
        for pool in self.pools.values_mut() {
            pool.pending.clear();
        }
    }
}
