//! Static buff definitions
//!
//! A `Buff` is shared behind `Arc` between the abilities that activate it and
//! the engine's active set. Hooks never mutate the ability they are given;
//! they return a new snapshot for the single use they apply to.

use std::fmt;
use std::sync::Arc;

use super::BuffHandle;
use crate::ability::{Ability, AbilityId, AbilityKind};

/// Snapshot → snapshot rewrite run by an active buff.
pub type BuffHook = Arc<dyn Fn(&Ability, &mut BuffHandle) -> Ability + Send + Sync>;

/// Predicate over abilities for custom buff scopes.
pub type AbilityPredicate = Arc<dyn Fn(&Ability) -> bool + Send + Sync>;

/// Which abilities a buff affects.
#[derive(Clone, Default)]
pub enum BuffScope {
    #[default]
    All,
    Kind(AbilityKind),
    Abilities(Vec<AbilityId>),
    Custom(AbilityPredicate),
}

impl BuffScope {
    pub fn matches(&self, ability: &Ability) -> bool {
        match self {
            BuffScope::All => true,
            BuffScope::Kind(kind) => ability.kind == *kind,
            BuffScope::Abilities(ids) => ids.contains(&ability.id),
            BuffScope::Custom(predicate) => predicate(ability),
        }
    }
}

impl fmt::Debug for BuffScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuffScope::All => f.write_str("All"),
            BuffScope::Kind(kind) => f.debug_tuple("Kind").field(kind).finish(),
            BuffScope::Abilities(ids) => f.debug_tuple("Abilities").field(ids).finish(),
            BuffScope::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Passive modifiers a buff contributes while active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuffEffects {
    /// Multiplier on outgoing damage
    pub damage_multiplier: f64,
    /// Haste in percent (reduces GCD length)
    pub haste: f64,
    pub force_crit: bool,
    pub force_dhit: bool,
}

impl Default for BuffEffects {
    fn default() -> Self {
        Self {
            damage_multiplier: 1.0,
            haste: 0.0,
            force_crit: false,
            force_dhit: false,
        }
    }
}

/// Static buff record.
#[derive(Clone)]
pub struct Buff {
    pub name: String,
    /// Game status effect id, if known
    pub status_id: Option<u32>,
    /// Duration in seconds (None = active until removed)
    pub duration: Option<f64>,
    /// Initial stack count (None = non-stacking)
    pub stacks: Option<u32>,
    /// Only affects the caster (informational for single-actor runs)
    pub self_only: bool,
    pub applies_to: BuffScope,
    /// Runs before the ability is used
    pub before_ability: Option<BuffHook>,
    /// Runs at the snapshot instant
    pub before_snapshot: Option<BuffHook>,
    pub effects: BuffEffects,
    /// Cap on the remaining duration when a refresh extends the buff
    pub max_duration: Option<f64>,
}

impl Buff {
    pub fn new(name: impl Into<String>, duration: Option<f64>) -> Self {
        Self {
            name: name.into(),
            status_id: None,
            duration,
            stacks: None,
            self_only: true,
            applies_to: BuffScope::All,
            before_ability: None,
            before_snapshot: None,
            effects: BuffEffects::default(),
            max_duration: None,
        }
    }

    pub fn with_status_id(mut self, id: u32) -> Self {
        self.status_id = Some(id);
        self
    }

    pub fn with_stacks(mut self, stacks: u32) -> Self {
        self.stacks = Some(stacks);
        self
    }

    pub fn applies_to(mut self, scope: BuffScope) -> Self {
        self.applies_to = scope;
        self
    }

    pub fn with_effects(mut self, effects: BuffEffects) -> Self {
        self.effects = effects;
        self
    }

    pub fn damage_multiplier(mut self, multiplier: f64) -> Self {
        self.effects.damage_multiplier = multiplier;
        self
    }

    pub fn haste(mut self, percent: f64) -> Self {
        self.effects.haste = percent;
        self
    }

    pub fn with_max_duration(mut self, max: f64) -> Self {
        self.max_duration = Some(max);
        self
    }

    pub fn party_wide(mut self) -> Self {
        self.self_only = false;
        self
    }

    pub fn before_ability<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Ability, &mut BuffHandle) -> Ability + Send + Sync + 'static,
    {
        self.before_ability = Some(Arc::new(hook));
        self
    }

    pub fn before_snapshot<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Ability, &mut BuffHandle) -> Ability + Send + Sync + 'static,
    {
        self.before_snapshot = Some(Arc::new(hook));
        self
    }

    /// Whether this buff affects `ability`.
    pub fn applies(&self, ability: &Ability) -> bool {
        self.applies_to.matches(ability)
    }
}

impl fmt::Debug for Buff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buff")
            .field("name", &self.name)
            .field("status_id", &self.status_id)
            .field("duration", &self.duration)
            .field("stacks", &self.stacks)
            .field("applies_to", &self.applies_to)
            .field("before_ability", &self.before_ability.is_some())
            .field("before_snapshot", &self.before_snapshot.is_some())
            .field("effects", &self.effects)
            .field("max_duration", &self.max_duration)
            .finish()
    }
}
