//! Shared configuration types for gcdsim.
//!
//! These types are serialized into simulation config files and across the
//! worker-process boundary, so both the core and the binaries agree on them.

pub mod formatting;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Stats
// ─────────────────────────────────────────────────────────────────────────────

/// Which speed stat scales a recast or cast time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedStat {
    SkillSpeed,
    SpellSpeed,
}

/// Computed character stats for one gear set.
///
/// Only `skill_speed`, `spell_speed` and `weapon_delay` influence timing; the
/// rest only matter to the damage model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatSheet {
    /// Character level (selects the level modifiers)
    pub level: u32,
    /// Primary attribute (strength, dexterity, ...)
    pub main_stat: u32,
    /// Weapon damage value
    pub weapon_damage: u32,
    /// Auto-attack delay in seconds
    pub weapon_delay: f64,
    pub crit: u32,
    pub direct_hit: u32,
    pub determination: u32,
    pub skill_speed: u32,
    pub spell_speed: u32,
}

impl Default for StatSheet {
    fn default() -> Self {
        Self {
            level: 100,
            main_stat: 440,
            weapon_damage: 0,
            weapon_delay: 3.0,
            crit: 420,
            direct_hit: 420,
            determination: 440,
            skill_speed: 420,
            spell_speed: 420,
        }
    }
}

impl StatSheet {
    /// Raw value of the given speed stat.
    pub fn speed(&self, stat: SpeedStat) -> u32 {
        match stat {
            SpeedStat::SkillSpeed => self.skill_speed,
            SpeedStat::SpellSpeed => self.spell_speed,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Simulation settings
// ─────────────────────────────────────────────────────────────────────────────

/// What to do with a GCD that starts before the end of the simulated window
/// but finishes after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutoffMode {
    /// Scale the trailing GCD by the fraction of its length inside the window
    #[default]
    Prorate,
    /// Count the trailing GCD in full and extend the DPS window to its end
    LaxGcd,
    /// Drop the trailing GCD entirely
    StrictGcd,
}

/// Behavior when an ability is used with zero charges remaining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargePolicy {
    /// Fail the run
    #[default]
    Reject,
    /// Warn and queue the recharge after the last pending one
    Queue,
}

/// Per-run simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Length of the simulated window in seconds
    pub total_time: f64,
    /// Trailing-GCD policy at the end of the window
    pub cutoff: CutoffMode,
    /// Zero-charge policy for the cooldown tracker
    pub charge_policy: ChargePolicy,
    /// Treat gauge overcap/underflow as a fatal run error instead of clamping
    pub strict_gauge: bool,
    /// Length of one rotation cycle; uses and damage are grouped per cycle
    pub cycle_time: f64,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            total_time: 120.0,
            cutoff: CutoffMode::default(),
            charge_policy: ChargePolicy::default(),
            strict_gauge: false,
            cycle_time: 120.0,
        }
    }
}
