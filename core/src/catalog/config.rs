//! Serialized simulation configuration
//!
//! A `SimConfig` describes one job: settings, stats, gauge resources, buffs,
//! abilities and the rotations to compare. It is loaded from TOML and is also
//! the `config` part of worker requests.

use std::fs;
use std::path::{Path, PathBuf};

use gcdsim_types::{SimSettings, SpeedStat, StatSheet};
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::ability::AbilityId;

/// Top-level simulation config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub settings: SimSettings,
    pub stats: StatSheet,
    #[serde(rename = "resource")]
    pub resources: Vec<ResourceConfig>,
    #[serde(rename = "buff")]
    pub buffs: Vec<BuffConfig>,
    #[serde(rename = "ability")]
    pub abilities: Vec<AbilityConfig>,
    #[serde(rename = "rotation")]
    pub rotations: Vec<RotationConfig>,
}

impl SimConfig {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// A bounded gauge resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub name: String,
    pub max: f64,
    #[serde(default)]
    pub initial: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Buffs
// ─────────────────────────────────────────────────────────────────────────────

/// Which abilities a configured buff affects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeConfig {
    #[default]
    All,
    Gcd,
    Ogcd,
}

/// Declarative building blocks for buff hooks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HookSpec {
    /// Make cast-time abilities instant; consumes a stack when it applied
    InstantCast {
        #[serde(default = "default_true")]
        consume: bool,
    },
    SetPotency { value: f64 },
    AddPotency { value: f64 },
    ScalePotency { factor: f64 },
    /// Override the nominal GCD length
    SetGcd { value: f64 },
    ForceCrit,
    ForceDhit,
    ConsumeStack,
    Remove,
}

fn default_true() -> bool {
    true
}

fn default_multiplier() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuffConfig {
    pub name: String,
    #[serde(default)]
    pub status_id: Option<u32>,
    /// Seconds (absent = until removed)
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub stacks: Option<u32>,
    #[serde(default = "default_true")]
    pub self_only: bool,
    #[serde(default)]
    pub applies_to: ScopeConfig,
    /// Restrict to these ability ids (overrides `applies_to`)
    #[serde(default)]
    pub abilities: Vec<AbilityId>,
    #[serde(default = "default_multiplier")]
    pub damage_multiplier: f64,
    #[serde(default)]
    pub haste: f64,
    #[serde(default)]
    pub force_crit: bool,
    #[serde(default)]
    pub force_dhit: bool,
    #[serde(default)]
    pub max_duration: Option<f64>,
    #[serde(default)]
    pub before_ability: Vec<HookSpec>,
    #[serde(default)]
    pub before_snapshot: Vec<HookSpec>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Abilities
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindConfig {
    #[default]
    Gcd,
    Ogcd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackTypeConfig {
    Weaponskill,
    Spell,
    Ability,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooldownConfig {
    pub time: f64,
    #[serde(default = "default_charges")]
    pub charges: u32,
    #[serde(default)]
    pub shared_with: Option<AbilityId>,
    #[serde(default)]
    pub reduced_by: Option<SpeedStat>,
}

fn default_charges() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DotConfig {
    pub id: u32,
    pub tick_potency: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComboBehaviorConfig {
    Start,
    Continue,
    Break,
    NoBreak,
}

/// One combo declaration (`from`/`potency` are only read for `continue`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboConfig {
    /// Chain key (absent = the default chain)
    #[serde(default)]
    pub key: Option<String>,
    pub behavior: ComboBehaviorConfig,
    #[serde(default)]
    pub from: Vec<AbilityId>,
    #[serde(default)]
    pub potency: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDeltaConfig {
    pub resource: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityConfig {
    pub id: AbilityId,
    pub name: String,
    #[serde(default)]
    pub kind: KindConfig,
    /// Defaults to weaponskill for GCDs and ability for oGCDs
    #[serde(default)]
    pub attack_type: Option<AttackTypeConfig>,
    #[serde(default)]
    pub potency: Option<f64>,
    #[serde(default)]
    pub dot: Option<DotConfig>,
    #[serde(default)]
    pub auto_crit: bool,
    #[serde(default)]
    pub auto_dh: bool,
    #[serde(default)]
    pub gcd: Option<f64>,
    #[serde(default)]
    pub cast_time: f64,
    #[serde(default)]
    pub fixed_gcd: bool,
    #[serde(default)]
    pub animation_lock: Option<f64>,
    #[serde(default)]
    pub app_delay: f64,
    #[serde(default)]
    pub cooldown: Option<CooldownConfig>,
    #[serde(default)]
    pub combos: Vec<ComboConfig>,
    /// Buff names
    #[serde(default)]
    pub activates: Vec<String>,
    #[serde(default)]
    pub resources: Vec<ResourceDeltaConfig>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Rotations
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RotationConfig {
    Scripted {
        name: String,
        #[serde(default)]
        opener: Vec<AbilityId>,
        #[serde(default)]
        cycle: Vec<AbilityId>,
    },
    Priority {
        name: String,
        #[serde(default)]
        gcds: Vec<AbilityId>,
        #[serde(default)]
        ogcds: Vec<AbilityId>,
    },
}

impl RotationConfig {
    pub fn name(&self) -> &str {
        match self {
            RotationConfig::Scripted { name, .. } | RotationConfig::Priority { name, .. } => name,
        }
    }
}

/// Stat permutations file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermutationFile {
    #[serde(rename = "permutation")]
    pub permutations: Vec<StatSheet>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────────────────────────

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a simulation config from a TOML file
pub fn load_config(path: &Path) -> Result<SimConfig, ConfigError> {
    let content = read(path)?;
    let config = SimConfig::parse(&content).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        path = %path.display(),
        abilities = config.abilities.len(),
        buffs = config.buffs.len(),
        rotations = config.rotations.len(),
        "Loaded sim config"
    );
    Ok(config)
}

/// Load stat permutations from a TOML file
pub fn load_permutations(path: &Path) -> Result<Vec<StatSheet>, ConfigError> {
    let content = read(path)?;
    let file: PermutationFile = toml::from_str(&content).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file.permutations)
}

/// Default location of the user's sim config
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("gcdsim").join("sim.toml"))
}
