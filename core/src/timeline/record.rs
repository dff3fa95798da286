//! Run output: the use log, warnings and the finalized run

use std::sync::Arc;

use gcdsim_types::{CutoffMode, StatSheet};
use serde::Serialize;

use super::GaugeSnapshot;
use crate::ability::Ability;
use crate::buffs::{Buff, CombinedEffects};
use crate::formulas::DamageModel;

/// Seconds between two DoT ticks.
pub const DOT_TICK_INTERVAL: f64 = 3.0;

/// Result of asking the processor to use an ability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UseOutcome {
    Used,
    /// Cooldown not ready; nothing changed
    NotReady { ready_at: f64 },
    /// The use would start at or after the end of the window
    TimeExpired,
}

impl UseOutcome {
    pub fn was_used(self) -> bool {
        matches!(self, UseOutcome::Used)
    }
}

/// One ability use, with everything needed to compute its damage later.
#[derive(Debug, Clone)]
pub struct AbilityUseRecord {
    /// Snapshot after buff hooks and combo overrides
    pub ability: Ability,
    pub used_at: f64,
    pub snapshot_at: f64,
    /// When the damage lands (`snapshot_at + app_delay`)
    pub lands_at: f64,
    /// Rotation cycle the use was pressed in
    pub cycle: u32,
    /// Actual GCD length (0 for oGCDs)
    pub gcd_length: f64,
    /// Time the player was locked out of other actions
    pub lock_time: f64,
    pub potency: Option<f64>,
    pub combo_continued: bool,
    /// Buffs applying to the ability at its snapshot
    pub buffs: Vec<Arc<Buff>>,
    pub effects: CombinedEffects,
    pub gauge: GaugeSnapshot,
    /// Share of the use counted towards the run (cutoff proration)
    pub cutoff_fraction: f64,
    /// Seconds of DoT uptime credited to this application
    pub dot_seconds: f64,
}

impl AbilityUseRecord {
    pub fn is_gcd(&self) -> bool {
        self.ability.is_gcd()
    }

    /// Expected damage of this use under `model`.
    pub fn damage(&self, stats: &StatSheet, model: &dyn DamageModel) -> f64 {
        let result = model.damage(stats, &self.ability, self.potency.unwrap_or(0.0), &self.effects);
        result.direct * self.cutoff_fraction
            + result.dot_per_tick * (self.dot_seconds / DOT_TICK_INTERVAL)
    }
}

/// Recoverable issue noticed during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimWarning {
    GaugeClamped {
        time: f64,
        ability: String,
        resource: String,
        attempted: f64,
        clamped: f64,
    },
    ChargesQueued {
        time: f64,
        ability: String,
    },
    /// A rotation pass made no time progress and was stopped
    NoProgress { time: f64 },
}

/// Damage totals of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamageSummary {
    pub total: f64,
    pub dps: f64,
    /// Ability name → damage, highest first
    pub by_ability: Vec<(String, f64)>,
    /// Damage per rotation cycle, indexed by cycle
    pub by_cycle: Vec<f64>,
}

/// A finished run, with the cutoff policy already applied.
#[derive(Debug, Clone)]
pub struct CompletedRun {
    pub records: Vec<AbilityUseRecord>,
    pub warnings: Vec<SimWarning>,
    /// Configured window length
    pub total_time: f64,
    /// DPS denominator (longer than the window under `LaxGcd`)
    pub dps_window: f64,
    pub cutoff: CutoffMode,
}

impl CompletedRun {
    pub fn gcd_count(&self) -> f64 {
        self.records
            .iter()
            .filter(|r| r.is_gcd())
            .map(|r| r.cutoff_fraction)
            .sum()
    }

    pub fn total_damage(&self, stats: &StatSheet, model: &dyn DamageModel) -> f64 {
        self.records.iter().map(|r| r.damage(stats, model)).sum()
    }

    pub fn dps(&self, stats: &StatSheet, model: &dyn DamageModel) -> f64 {
        if self.dps_window <= 0.0 {
            return 0.0;
        }
        self.total_damage(stats, model) / self.dps_window
    }

    pub fn summarize(&self, stats: &StatSheet, model: &dyn DamageModel) -> DamageSummary {
        let mut by_ability: Vec<(String, f64)> = Vec::new();
        let mut by_cycle: Vec<f64> = Vec::new();
        for record in &self.records {
            let damage = record.damage(stats, model);
            let cycle = record.cycle as usize;
            if by_cycle.len() <= cycle {
                by_cycle.resize(cycle + 1, 0.0);
            }
            by_cycle[cycle] += damage;
            match by_ability.iter_mut().find(|(name, _)| *name == record.ability.name) {
                Some((_, total)) => *total += damage,
                None => by_ability.push((record.ability.name.clone(), damage)),
            }
        }
        by_ability.sort_by(|a, b| b.1.total_cmp(&a.1));

        let total: f64 = by_ability.iter().map(|(_, d)| d).sum();
        let dps = if self.dps_window > 0.0 {
            total / self.dps_window
        } else {
            0.0
        };
        DamageSummary {
            total,
            dps,
            by_ability,
            by_cycle,
        }
    }
}
