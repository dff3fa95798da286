//! Active buff registry and hook pipeline
//!
//! Buffs are kept in activation order, keyed by name. Expired buffs are pruned
//! lazily: queries filter them out, mutations drop them.

use std::sync::Arc;

use super::{ActiveBuff, Buff, BuffHandle, BuffHook};
use crate::ability::Ability;

/// Aggregate of the passive effects of every buff applying to an ability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombinedEffects {
    pub damage_multiplier: f64,
    /// Total haste in percent
    pub haste: f64,
    pub force_crit: bool,
    pub force_dhit: bool,
}

impl Default for CombinedEffects {
    fn default() -> Self {
        Self {
            damage_multiplier: 1.0,
            haste: 0.0,
            force_crit: false,
            force_dhit: false,
        }
    }
}

/// Which hook slot a pipeline pass runs.
#[derive(Debug, Clone, Copy)]
enum HookStage {
    BeforeAbility,
    BeforeSnapshot,
}

impl HookStage {
    fn hook(self, buff: &Buff) -> Option<&BuffHook> {
        match self {
            HookStage::BeforeAbility => buff.before_ability.as_ref(),
            HookStage::BeforeSnapshot => buff.before_snapshot.as_ref(),
        }
    }
}

/// Per-run buff state.
#[derive(Debug, Clone, Default)]
pub struct BuffEngine {
    active: Vec<ActiveBuff>,
}

impl BuffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn prune(&mut self, at: f64) {
        self.active.retain(|active| {
            let keep = active.is_active_at(at);
            if !keep {
                tracing::trace!(buff = %active.name(), time = at, "Buff expired");
            }
            keep
        });
    }

    fn find(&self, name: &str, at: f64) -> Option<&ActiveBuff> {
        self.active
            .iter()
            .find(|active| active.name() == name && active.is_active_at(at))
    }

    /// Run pre-use hooks of active, matching buffs in activation order.
    pub fn before_ability(&mut self, ability: &Ability, now: f64) -> Ability {
        self.run_hooks(HookStage::BeforeAbility, ability, now)
    }

    /// Run pre-snapshot hooks at the snapshot instant `at`.
    pub fn before_snapshot(&mut self, ability: &Ability, at: f64) -> Ability {
        self.run_hooks(HookStage::BeforeSnapshot, ability, at)
    }

    fn run_hooks(&mut self, stage: HookStage, ability: &Ability, at: f64) -> Ability {
        self.prune(at);

        let candidates: Vec<Arc<Buff>> = self
            .active
            .iter()
            .filter(|active| stage.hook(&active.buff).is_some())
            .map(|active| Arc::clone(&active.buff))
            .collect();

        let mut working = ability.clone();
        for buff in candidates {
            // An earlier hook may have removed this buff
            let Some(index) = self.active.iter().position(|a| Arc::ptr_eq(&a.buff, &buff)) else {
                continue;
            };
            if !buff.applies(&working) {
                continue;
            }
            let Some(hook) = stage.hook(&buff) else {
                continue;
            };

            let mut handle = BuffHandle::new(self.active[index].stacks);
            working = hook(&working, &mut handle);

            match handle.resolve() {
                Some(stacks) => self.active[index].stacks = stacks,
                None => {
                    tracing::debug!(buff = %buff.name, time = at, ?stage, "Buff consumed");
                    self.active.remove(index);
                }
            }
        }
        working
    }

    /// Activate `buff` at `now`, or refresh it if already active.
    pub fn activate(&mut self, buff: Arc<Buff>, now: f64) {
        self.prune(now);

        if let Some(existing) = self.active.iter_mut().find(|a| a.name() == buff.name) {
            existing.buff = buff;
            existing.refresh(now);
            tracing::debug!(
                buff = %existing.name(),
                time = now,
                expires_at = ?existing.expires_at,
                "Refreshed buff"
            );
            return;
        }

        let active = ActiveBuff::new(buff, now);
        tracing::debug!(
            buff = %active.name(),
            time = now,
            expires_at = ?active.expires_at,
            "Activated buff"
        );
        self.active.push(active);
    }

    /// Remove a buff by name. Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.active.len();
        self.active.retain(|active| active.name() != name);
        before != self.active.len()
    }

    pub fn is_active(&self, name: &str, at: f64) -> bool {
        self.find(name, at).is_some()
    }

    /// Remaining stacks of an active buff (None if inactive or non-stacking).
    pub fn stacks_of(&self, name: &str, at: f64) -> Option<u32> {
        self.find(name, at).and_then(|active| active.stacks)
    }

    /// Seconds left on an active buff.
    pub fn remaining(&self, name: &str, at: f64) -> Option<f64> {
        self.find(name, at).and_then(|active| active.remaining(at))
    }

    /// Every buff active at `at`, regardless of what it applies to.
    pub fn active_at(&self, at: f64) -> Vec<Arc<Buff>> {
        self.active
            .iter()
            .filter(|active| active.is_active_at(at))
            .map(|active| Arc::clone(&active.buff))
            .collect()
    }

    /// Buffs active at `at` that apply to `ability`.
    pub fn buffs_for(&self, ability: &Ability, at: f64) -> Vec<Arc<Buff>> {
        self.active
            .iter()
            .filter(|active| active.is_active_at(at) && active.buff.applies(ability))
            .map(|active| Arc::clone(&active.buff))
            .collect()
    }

    /// Fold the passive effects of buffs applying to `ability` at `at`.
    pub fn combined_effects(&self, ability: &Ability, at: f64) -> CombinedEffects {
        self.buffs_for(ability, at)
            .iter()
            .fold(CombinedEffects::default(), |mut acc, buff| {
                acc.damage_multiplier *= buff.effects.damage_multiplier;
                acc.haste += buff.effects.haste;
                acc.force_crit |= buff.effects.force_crit;
                acc.force_dhit |= buff.effects.force_dhit;
                acc
            })
    }

    pub fn reset(&mut self) {
        self.active.clear();
    }
}
