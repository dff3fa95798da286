//! Compiling a `SimConfig` into runnable definitions
//!
//! Buffs are built first so abilities can hold `Arc`s to them; rotations are
//! built last and hold clones of the compiled abilities.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use gcdsim_types::{SimSettings, StatSheet};

use super::config::{
    AbilityConfig, AttackTypeConfig, BuffConfig, ComboBehaviorConfig, HookSpec, KindConfig,
    RotationConfig, ScopeConfig, SimConfig,
};
use super::ConfigError;
use crate::ability::{
    Ability, AbilityId, AbilityKind, AttackType, CooldownSpec, DotSpec, ResourceDelta,
    STANDARD_GCD,
};
use crate::buffs::{Buff, BuffEffects, BuffHandle, BuffHook, BuffScope};
use crate::combo::{ComboBehavior, ComboEntry, ComboKey, validate_entries};
use crate::formulas::{DamageModel, TimingFormulas};
use crate::rotation::{PriorityRotation, Rotation, RotationBatchRunner, ScriptedRotation};
use crate::timeline::ResourceGauge;

/// Validated, ready-to-run definitions of one job.
#[derive(Clone)]
pub struct Catalog {
    pub settings: SimSettings,
    pub stats: StatSheet,
    pub gauge: ResourceGauge,
    pub buffs: BTreeMap<String, Arc<Buff>>,
    pub abilities: BTreeMap<AbilityId, Ability>,
    pub rotations: Vec<Arc<dyn Rotation<ResourceGauge>>>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("settings", &self.settings)
            .field("gauge", &self.gauge)
            .field("buffs", &self.buffs.keys().collect::<Vec<_>>())
            .field("abilities", &self.abilities.len())
            .field(
                "rotations",
                &self.rotations.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Catalog {
    /// Validate `config` and build its definitions.
    pub fn compile(config: &SimConfig) -> Result<Self, ConfigError> {
        let gauge = compile_gauge(config)?;

        let mut buffs = BTreeMap::new();
        for buff in &config.buffs {
            if buffs.contains_key(&buff.name) {
                return Err(ConfigError::DuplicateBuff {
                    name: buff.name.clone(),
                });
            }
            buffs.insert(buff.name.clone(), Arc::new(compile_buff(buff)?));
        }

        let mut abilities = BTreeMap::new();
        for ability in &config.abilities {
            if abilities.contains_key(&ability.id) {
                return Err(ConfigError::DuplicateAbility { id: ability.id });
            }
            abilities.insert(ability.id, compile_ability(ability, &buffs, &gauge)?);
        }
        check_references(&abilities)?;

        let rotations = config
            .rotations
            .iter()
            .map(|rotation| compile_rotation(rotation, &abilities))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            abilities = abilities.len(),
            buffs = buffs.len(),
            rotations = rotations.len(),
            "Compiled catalog"
        );

        Ok(Self {
            settings: config.settings.clone(),
            stats: config.stats.clone(),
            gauge,
            buffs,
            abilities,
            rotations,
        })
    }

    pub fn ability(&self, id: AbilityId) -> Option<&Ability> {
        self.abilities.get(&id)
    }

    pub fn buff(&self, name: &str) -> Option<&Arc<Buff>> {
        self.buffs.get(name)
    }

    /// Abilities that own a cooldown pool other abilities draw from.
    pub fn pool_origins(&self) -> Vec<Ability> {
        let origins: BTreeSet<AbilityId> = self
            .abilities
            .values()
            .filter_map(|a| a.cooldown.as_ref().and_then(|cd| cd.shared_with))
            .collect();
        origins
            .iter()
            .filter_map(|id| self.abilities.get(id).cloned())
            .collect()
    }

    /// Build a batch runner over this catalog's rotations.
    pub fn runner(
        &self,
        timing: Arc<dyn TimingFormulas>,
        damage: Arc<dyn DamageModel>,
    ) -> RotationBatchRunner<ResourceGauge> {
        RotationBatchRunner::new(
            self.rotations.clone(),
            self.settings.clone(),
            self.gauge.clone(),
            timing,
            damage,
        )
        .with_cooldown_pools(self.pool_origins())
    }
}

fn compile_gauge(config: &SimConfig) -> Result<ResourceGauge, ConfigError> {
    let mut gauge = ResourceGauge::new();
    for resource in &config.resources {
        if gauge.has_resource(&resource.name) {
            return Err(ConfigError::DuplicateResource {
                name: resource.name.clone(),
            });
        }
        if resource.max <= 0.0 {
            return Err(ConfigError::InvalidValue {
                context: format!("resource '{}'", resource.name),
                reason: "max must be positive".to_string(),
            });
        }
        gauge = gauge.with_resource(resource.name.clone(), resource.max, resource.initial);
    }
    Ok(gauge)
}

// ─────────────────────────────────────────────────────────────────────────────
// Buffs
// ─────────────────────────────────────────────────────────────────────────────

fn apply_hook(spec: &HookSpec, ability: &Ability, handle: &mut BuffHandle) -> Ability {
    let mut ability = ability.clone();
    match spec {
        HookSpec::InstantCast { consume } => {
            if ability.cast_time > 0.0 {
                ability.cast_time = 0.0;
                if *consume {
                    handle.consume_stack();
                }
            }
        }
        HookSpec::SetPotency { value } => ability.potency = Some(*value),
        HookSpec::AddPotency { value } => ability.potency = ability.potency.map(|p| p + value),
        HookSpec::ScalePotency { factor } => ability.potency = ability.potency.map(|p| p * factor),
        HookSpec::SetGcd { value } => ability.gcd = *value,
        HookSpec::ForceCrit => ability.auto_crit = true,
        HookSpec::ForceDhit => ability.auto_dh = true,
        HookSpec::ConsumeStack => handle.consume_stack(),
        HookSpec::Remove => handle.remove(),
    }
    ability
}

fn compile_hook(specs: &[HookSpec]) -> Option<BuffHook> {
    if specs.is_empty() {
        return None;
    }
    let specs = specs.to_vec();
    Some(Arc::new(move |ability: &Ability, handle: &mut BuffHandle| {
        specs
            .iter()
            .fold(ability.clone(), |working, spec| apply_hook(spec, &working, handle))
    }))
}

fn compile_buff(config: &BuffConfig) -> Result<Buff, ConfigError> {
    let context = || format!("buff '{}'", config.name);
    if config.duration.is_some_and(|d| d <= 0.0) {
        return Err(ConfigError::InvalidValue {
            context: context(),
            reason: "duration must be positive".to_string(),
        });
    }
    if config.stacks == Some(0) {
        return Err(ConfigError::InvalidValue {
            context: context(),
            reason: "stacks must be at least 1".to_string(),
        });
    }

    let applies_to = if !config.abilities.is_empty() {
        BuffScope::Abilities(config.abilities.clone())
    } else {
        match config.applies_to {
            ScopeConfig::All => BuffScope::All,
            ScopeConfig::Gcd => BuffScope::Kind(AbilityKind::Gcd),
            ScopeConfig::Ogcd => BuffScope::Kind(AbilityKind::Ogcd),
        }
    };

    Ok(Buff {
        name: config.name.clone(),
        status_id: config.status_id,
        duration: config.duration,
        stacks: config.stacks,
        self_only: config.self_only,
        applies_to,
        before_ability: compile_hook(&config.before_ability),
        before_snapshot: compile_hook(&config.before_snapshot),
        effects: BuffEffects {
            damage_multiplier: config.damage_multiplier,
            haste: config.haste,
            force_crit: config.force_crit,
            force_dhit: config.force_dhit,
        },
        max_duration: config.max_duration,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Abilities
// ─────────────────────────────────────────────────────────────────────────────

fn compile_ability(
    config: &AbilityConfig,
    buffs: &BTreeMap<String, Arc<Buff>>,
    gauge: &ResourceGauge,
) -> Result<Ability, ConfigError> {
    let kind = match config.kind {
        KindConfig::Gcd => AbilityKind::Gcd,
        KindConfig::Ogcd => AbilityKind::Ogcd,
    };
    let attack_type = match (config.attack_type, kind) {
        (Some(AttackTypeConfig::Weaponskill), _) => AttackType::Weaponskill,
        (Some(AttackTypeConfig::Spell), _) => AttackType::Spell,
        (Some(AttackTypeConfig::Ability), _) | (None, AbilityKind::Ogcd) => AttackType::Ability,
        (None, AbilityKind::Gcd) => AttackType::Weaponskill,
    };

    let combos = config
        .combos
        .iter()
        .map(|combo| {
            let key = combo
                .key
                .as_ref()
                .map_or(ComboKey::DEFAULT, |k| ComboKey::named(k.clone()));
            let behavior = match combo.behavior {
                ComboBehaviorConfig::Start => ComboBehavior::Start,
                ComboBehaviorConfig::Break => ComboBehavior::Break,
                ComboBehaviorConfig::NoBreak => ComboBehavior::NoBreak,
                ComboBehaviorConfig::Continue => {
                    let potency = combo
                        .potency
                        .ok_or(ConfigError::MissingComboPotency { ability: config.id })?;
                    ComboBehavior::continues_from(combo.from.iter().copied(), potency)
                }
            };
            Ok(ComboEntry::new(key, behavior))
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;
    validate_entries(config.id, &combos)?;

    let activates = config
        .activates
        .iter()
        .map(|name| {
            buffs.get(name).cloned().ok_or_else(|| ConfigError::UnknownBuff {
                ability: config.id,
                buff: name.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut resources = Vec::with_capacity(config.resources.len());
    for delta in &config.resources {
        if !gauge.has_resource(&delta.resource) {
            return Err(ConfigError::UnknownResource {
                ability: config.id,
                resource: delta.resource.clone(),
            });
        }
        resources.push(ResourceDelta {
            resource: delta.resource.clone(),
            amount: delta.amount,
        });
    }

    let cooldown = config.cooldown.as_ref().map(|cd| CooldownSpec {
        time: cd.time,
        charges: cd.charges.max(1),
        shared_with: cd.shared_with,
        reduced_by: cd.reduced_by,
    });

    Ok(Ability {
        id: config.id,
        name: config.name.clone(),
        kind,
        attack_type,
        potency: config.potency,
        dot: config.dot.as_ref().map(|dot| DotSpec {
            id: dot.id,
            tick_potency: dot.tick_potency,
            duration: dot.duration,
        }),
        auto_crit: config.auto_crit,
        auto_dh: config.auto_dh,
        gcd: config.gcd.unwrap_or(STANDARD_GCD),
        cast_time: config.cast_time,
        fixed_gcd: config.fixed_gcd,
        animation_lock: config.animation_lock,
        app_delay: config.app_delay,
        cooldown,
        combos,
        activates,
        resources,
    })
}

/// Cross-ability references: shared cooldown origins and combo sources.
fn check_references(abilities: &BTreeMap<AbilityId, Ability>) -> Result<(), ConfigError> {
    let ids: HashSet<AbilityId> = abilities.keys().copied().collect();

    for ability in abilities.values() {
        if let Some(cooldown) = ability.cooldown.as_ref()
            && let Some(origin_id) = cooldown.shared_with
        {
            check_shared_cooldown(ability.id, cooldown, origin_id, abilities)?;
        }

        for entry in &ability.combos {
            if let ComboBehavior::Continue { from, .. } = &entry.behavior
                && let Some(missing) = from.iter().find(|id| !ids.contains(id))
            {
                return Err(ConfigError::UnknownAbility {
                    context: format!("combo '{}' of ability {}", entry.key, ability.id),
                    id: *missing,
                });
            }
        }
    }
    Ok(())
}

/// A sharer draws from its origin's pool, so both must declare the same pool.
fn check_shared_cooldown(
    ability: AbilityId,
    cooldown: &CooldownSpec,
    origin_id: AbilityId,
    abilities: &BTreeMap<AbilityId, Ability>,
) -> Result<(), ConfigError> {
    let Some(origin) = abilities.get(&origin_id) else {
        return Err(ConfigError::UnknownAbility {
            context: format!("shared cooldown of ability {ability}"),
            id: origin_id,
        });
    };
    let mismatch = |reason: String| ConfigError::SharedCooldownMismatch {
        ability,
        origin: origin_id,
        reason,
    };

    let Some(origin_cd) = origin.cooldown.as_ref() else {
        return Err(mismatch("origin has no cooldown".to_string()));
    };
    if let Some(next) = origin_cd.shared_with
        && next != origin_id
    {
        return Err(mismatch(format!("origin itself shares the pool of ability {next}")));
    }
    if origin_cd.time != cooldown.time {
        return Err(mismatch(format!(
            "recast {}s differs from origin's {}s",
            cooldown.time, origin_cd.time
        )));
    }
    if origin_cd.charges != cooldown.charges {
        return Err(mismatch(format!(
            "{} charges differ from origin's {}",
            cooldown.charges, origin_cd.charges
        )));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Rotations
// ─────────────────────────────────────────────────────────────────────────────

fn resolve_ids(
    rotation: &str,
    ids: &[AbilityId],
    abilities: &BTreeMap<AbilityId, Ability>,
) -> Result<Vec<Ability>, ConfigError> {
    ids.iter()
        .map(|id| {
            abilities.get(id).cloned().ok_or_else(|| ConfigError::UnknownAbility {
                context: format!("rotation '{rotation}'"),
                id: *id,
            })
        })
        .collect()
}

fn compile_rotation(
    config: &RotationConfig,
    abilities: &BTreeMap<AbilityId, Ability>,
) -> Result<Arc<dyn Rotation<ResourceGauge>>, ConfigError> {
    let rotation: Arc<dyn Rotation<ResourceGauge>> = match config {
        RotationConfig::Scripted {
            name,
            opener,
            cycle,
        } => Arc::new(ScriptedRotation::new(
            name.clone(),
            resolve_ids(name, opener, abilities)?,
            resolve_ids(name, cycle, abilities)?,
        )),
        RotationConfig::Priority { name, gcds, ogcds } => {
            let gcds = resolve_ids(name, gcds, abilities)?;
            let ogcds = resolve_ids(name, ogcds, abilities)?;
            if let Some(misplaced) = gcds.iter().chain(&ogcds).find(|a| {
                let in_gcds = gcds.iter().any(|g| g.id == a.id);
                a.is_gcd() != in_gcds
            }) {
                return Err(ConfigError::InvalidValue {
                    context: format!("rotation '{name}'"),
                    reason: format!("ability {} is listed under the wrong priority list", misplaced.id),
                });
            }
            Arc::new(PriorityRotation::new(name.clone(), gcds, ogcds))
        }
    };
    Ok(rotation)
}
