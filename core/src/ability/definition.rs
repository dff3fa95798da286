//! Static ability definitions
//!
//! An `Ability` is created once (from Rust code or a compiled catalog) and
//! never mutated afterwards. Buff hooks that need a different cast time or
//! potency produce a modified clone for the single use they apply to.

use std::sync::Arc;

use gcdsim_types::SpeedStat;

use crate::buffs::Buff;
use crate::combo::{ComboBehavior, ComboEntry, ComboKey};

/// Game-side identifier of an ability.
pub type AbilityId = u32;

/// Nominal global cooldown length in seconds.
pub const STANDARD_GCD: f64 = 2.5;

/// Whether an action triggers the global cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbilityKind {
    Gcd,
    Ogcd,
}

/// Attack category. Selects the speed stat that scales a GCD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttackType {
    #[default]
    Weaponskill,
    Spell,
    /// Off-GCD ability (not scaled by speed stats)
    Ability,
}

impl AttackType {
    /// Speed stat that scales this attack type's recast, if any.
    pub fn speed_stat(self) -> Option<SpeedStat> {
        match self {
            AttackType::Weaponskill => Some(SpeedStat::SkillSpeed),
            AttackType::Spell => Some(SpeedStat::SpellSpeed),
            AttackType::Ability => None,
        }
    }
}

/// Cooldown declaration for an ability.
#[derive(Debug, Clone, PartialEq)]
pub struct CooldownSpec {
    /// Recast time in seconds (per charge)
    pub time: f64,
    /// Maximum number of charges
    pub charges: u32,
    /// Canonical origin of a shared cooldown pool
    pub shared_with: Option<AbilityId>,
    /// Speed stat that shortens the recast. The tracker never computes the
    /// reduction; the caller supplies the reduced duration at use time.
    pub reduced_by: Option<SpeedStat>,
}

impl CooldownSpec {
    pub fn new(time: f64) -> Self {
        Self {
            time,
            charges: 1,
            shared_with: None,
            reduced_by: None,
        }
    }

    pub fn with_charges(mut self, charges: u32) -> Self {
        self.charges = charges.max(1);
        self
    }

    pub fn shared_with(mut self, origin: AbilityId) -> Self {
        self.shared_with = Some(origin);
        self
    }

    pub fn reduced_by(mut self, stat: SpeedStat) -> Self {
        self.reduced_by = Some(stat);
        self
    }
}

/// Damage-over-time component applied by an ability.
#[derive(Debug, Clone, PartialEq)]
pub struct DotSpec {
    /// Identifier shared by every ability that applies the same DoT
    pub id: u32,
    pub tick_potency: f64,
    /// Full duration in seconds
    pub duration: f64,
}

/// A change to one named gauge resource caused by using an ability.
///
/// Negative amounts are costs, positive amounts are generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDelta {
    pub resource: String,
    pub amount: f64,
}

impl ResourceDelta {
    pub fn cost(resource: impl Into<String>, amount: f64) -> Self {
        Self {
            resource: resource.into(),
            amount: -amount.abs(),
        }
    }

    pub fn gain(resource: impl Into<String>, amount: f64) -> Self {
        Self {
            resource: resource.into(),
            amount: amount.abs(),
        }
    }
}

/// Static ability record.
#[derive(Debug, Clone)]
pub struct Ability {
    pub id: AbilityId,
    pub name: String,
    pub kind: AbilityKind,
    pub attack_type: AttackType,

    // ─── Damage ─────────────────────────────────────────────────────────────
    /// Direct-damage potency (None = no direct damage)
    pub potency: Option<f64>,
    pub dot: Option<DotSpec>,
    /// Guaranteed critical hit
    pub auto_crit: bool,
    /// Guaranteed direct hit
    pub auto_dh: bool,

    // ─── Timing ─────────────────────────────────────────────────────────────
    /// Nominal recast length before speed scaling
    pub gcd: f64,
    pub cast_time: f64,
    /// GCD length ignores speed stats and haste
    pub fixed_gcd: bool,
    /// Override for the animation lock (None = formula default)
    pub animation_lock: Option<f64>,
    /// Delay between snapshot and damage landing
    pub app_delay: f64,
    pub cooldown: Option<CooldownSpec>,

    // ─── Interactions ───────────────────────────────────────────────────────
    pub combos: Vec<ComboEntry>,
    /// Buffs activated by using this ability
    pub activates: Vec<Arc<Buff>>,
    /// Gauge changes caused by using this ability
    pub resources: Vec<ResourceDelta>,
}

impl Ability {
    fn base(id: AbilityId, name: impl Into<String>, kind: AbilityKind, attack_type: AttackType) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            attack_type,
            potency: None,
            dot: None,
            auto_crit: false,
            auto_dh: false,
            gcd: STANDARD_GCD,
            cast_time: 0.0,
            fixed_gcd: false,
            animation_lock: None,
            app_delay: 0.0,
            cooldown: None,
            combos: Vec::new(),
            activates: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// A weaponskill GCD with the standard recast.
    pub fn gcd(id: AbilityId, name: impl Into<String>, potency: f64) -> Self {
        let mut ability = Self::base(id, name, AbilityKind::Gcd, AttackType::Weaponskill);
        ability.potency = Some(potency);
        ability
    }

    /// A spell GCD with the given cast time.
    pub fn spell(id: AbilityId, name: impl Into<String>, potency: f64, cast_time: f64) -> Self {
        let mut ability = Self::base(id, name, AbilityKind::Gcd, AttackType::Spell);
        ability.potency = Some(potency);
        ability.cast_time = cast_time;
        ability
    }

    /// An off-GCD ability.
    pub fn ogcd(id: AbilityId, name: impl Into<String>, potency: Option<f64>) -> Self {
        let mut ability = Self::base(id, name, AbilityKind::Ogcd, AttackType::Ability);
        ability.potency = potency;
        ability
    }

    pub fn with_cooldown(mut self, cooldown: CooldownSpec) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    pub fn with_combo(mut self, key: ComboKey, behavior: ComboBehavior) -> Self {
        self.combos.push(ComboEntry { key, behavior });
        self
    }

    pub fn activates(mut self, buff: Arc<Buff>) -> Self {
        self.activates.push(buff);
        self
    }

    pub fn with_resource(mut self, delta: ResourceDelta) -> Self {
        self.resources.push(delta);
        self
    }

    pub fn with_dot(mut self, dot: DotSpec) -> Self {
        self.dot = Some(dot);
        self
    }

    pub fn with_gcd(mut self, gcd: f64, fixed: bool) -> Self {
        self.gcd = gcd;
        self.fixed_gcd = fixed;
        self
    }

    pub fn with_app_delay(mut self, delay: f64) -> Self {
        self.app_delay = delay.max(0.0);
        self
    }

    pub fn is_gcd(&self) -> bool {
        self.kind == AbilityKind::Gcd
    }

    /// Key of the cooldown pool this ability draws charges from.
    pub fn cooldown_pool(&self) -> AbilityId {
        self.cooldown
            .as_ref()
            .and_then(|cd| cd.shared_with)
            .unwrap_or(self.id)
    }
}
