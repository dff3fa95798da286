//! The cycle processor
//!
//! Owns every piece of per-run state and sequences ability uses on a simulated
//! clock. Two clocks are tracked:
//! - `current_time`: when the player can next act (end of the last lock)
//! - `next_gcd_time`: when the GCD rolls off
//!
//! GCDs start at the later of the two; oGCDs start at `current_time` and may
//! push it past `next_gcd_time` (clipping).

use std::sync::Arc;

use gcdsim_types::{ChargePolicy, CutoffMode, SimSettings, StatSheet};

use super::{AbilityUseRecord, CompletedRun, Gauge, SimWarning, UseOutcome};
use crate::ability::{Ability, AbilityKind, Timed};
use crate::buffs::BuffEngine;
use crate::combo::ComboResolver;
use crate::cooldowns::{CooldownStatus, CooldownTracker};
use crate::error::SimError;
use crate::formulas::TimingFormulas;

const EPSILON: f64 = 1e-9;

/// Per-run simulation state.
#[derive(Debug, Clone)]
pub struct CycleProcessor<G: Gauge> {
    settings: SimSettings,
    stats: StatSheet,
    timing: Arc<dyn TimingFormulas>,

    current_time: f64,
    next_gcd_time: f64,

    cooldowns: CooldownTracker,
    combos: ComboResolver,
    buffs: BuffEngine,
    gauge: G,

    records: Vec<AbilityUseRecord>,
    warnings: Vec<SimWarning>,
}

impl<G: Gauge> CycleProcessor<G> {
    pub fn new(settings: SimSettings, stats: StatSheet, gauge: G, timing: Arc<dyn TimingFormulas>) -> Self {
        let cooldowns = CooldownTracker::new(settings.charge_policy);
        Self {
            settings,
            stats,
            timing,
            current_time: 0.0,
            next_gcd_time: 0.0,
            cooldowns,
            combos: ComboResolver::new(),
            buffs: BuffEngine::new(),
            gauge,
            records: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Fix the capacity of a cooldown pool before the run starts.
    pub fn declare_cooldown_pool(&mut self, origin: &Ability) {
        self.cooldowns.declare_pool(origin);
    }

    // ─── Queries ────────────────────────────────────────────────────────────

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn next_gcd_time(&self) -> f64 {
        self.next_gcd_time
    }

    pub fn settings(&self) -> &SimSettings {
        &self.settings
    }

    pub fn stats(&self) -> &StatSheet {
        &self.stats
    }

    pub fn gauge(&self) -> &G {
        &self.gauge
    }

    pub fn buffs(&self) -> &BuffEngine {
        &self.buffs
    }

    pub fn combos(&self) -> &ComboResolver {
        &self.combos
    }

    pub fn records(&self) -> &[AbilityUseRecord] {
        &self.records
    }

    pub fn warnings(&self) -> &[SimWarning] {
        &self.warnings
    }

    /// Cooldown status of `ability` at the current time.
    pub fn cooldown_status(&self, ability: &Ability) -> CooldownStatus {
        self.cooldowns.status_of(ability, self.current_time)
    }

    pub fn cooldown_status_at(&self, ability: &Ability, at: f64) -> CooldownStatus {
        self.cooldowns.status_of(ability, at)
    }

    /// When the next GCD would be pressed if used now.
    pub fn next_gcd_press(&self) -> f64 {
        self.current_time.max(self.next_gcd_time)
    }

    /// Off cooldown at `current_time`.
    pub fn is_ready(&self, ability: &Ability) -> bool {
        self.cooldown_status(ability).ready_to_use
    }

    pub fn remaining_time(&self) -> f64 {
        (self.settings.total_time - self.current_time).max(0.0)
    }

    pub fn is_finished(&self) -> bool {
        self.current_time >= self.settings.total_time
    }

    /// Zero-based index of the rotation cycle `current_time` falls in.
    ///
    /// A non-positive `cycle_time` puts the whole run in cycle 0.
    pub fn cycle_index(&self) -> u32 {
        if self.settings.cycle_time <= 0.0 {
            return 0;
        }
        (self.current_time / self.settings.cycle_time).floor() as u32
    }

    /// Whether `ability` can be woven now without delaying the next GCD.
    pub fn can_use_without_clipping(&self, ability: &Ability) -> bool {
        if !self.is_ready(ability) {
            return false;
        }
        let cast_time = self.effective_cast_time(ability, self.current_time);
        let lock = self.lock_time(ability, cast_time);
        self.current_time + lock <= self.next_gcd_time + EPSILON
    }

    // ─── Time control ───────────────────────────────────────────────────────

    /// Move the clock forward. Never moves it backwards.
    pub fn advance_to(&mut self, time: f64) {
        if time > self.current_time {
            self.current_time = time;
        }
    }

    /// Wait until `ability` has a charge.
    pub fn advance_for_cooldown(&mut self, ability: &Ability) {
        let ready_at = self.cooldown_status(ability).ready_at.absolute;
        self.advance_to(ready_at);
    }

    /// Run `body` repeatedly until the window is exhausted.
    ///
    /// A pass that neither advances time nor records a use stops the loop
    /// with a warning. Returns the number of passes run.
    pub fn remaining_cycles<F>(&mut self, mut body: F) -> Result<u32, SimError>
    where
        F: FnMut(&mut Self) -> Result<(), SimError>,
    {
        let mut passes = 0;
        while !self.is_finished() {
            let time_before = self.current_time;
            let uses_before = self.records.len();

            body(self)?;
            passes += 1;

            if self.current_time <= time_before && self.records.len() == uses_before {
                tracing::warn!(time = self.current_time, passes, "Rotation pass made no progress, stopping");
                self.warnings.push(SimWarning::NoProgress {
                    time: self.current_time,
                });
                break;
            }
        }
        Ok(passes)
    }

    // ─── Ability use ────────────────────────────────────────────────────────

    /// Use a GCD, waiting for the GCD to roll off first.
    pub fn use_gcd(&mut self, ability: &Ability) -> Result<UseOutcome, SimError> {
        let press = self.next_gcd_press();
        if press >= self.settings.total_time {
            self.advance_to(press);
            return Ok(UseOutcome::TimeExpired);
        }
        self.current_time = press;
        self.execute(ability, press, true)
    }

    /// Use an oGCD at `current_time` if it is off cooldown.
    pub fn use_ogcd(&mut self, ability: &Ability) -> Result<UseOutcome, SimError> {
        let press = self.current_time;
        if press >= self.settings.total_time {
            return Ok(UseOutcome::TimeExpired);
        }
        let status = self.cooldowns.status_of(ability, press);
        if !status.ready_to_use {
            return Ok(UseOutcome::NotReady {
                ready_at: status.ready_at.absolute,
            });
        }
        self.execute(ability, press, false)
    }

    /// Dispatch on the ability's kind.
    pub fn use_ability(&mut self, ability: &Ability) -> Result<UseOutcome, SimError> {
        match ability.kind {
            AbilityKind::Gcd => self.use_gcd(ability),
            AbilityKind::Ogcd => self.use_ogcd(ability),
        }
    }

    fn execute(&mut self, ability: &Ability, press: f64, is_gcd: bool) -> Result<UseOutcome, SimError> {
        let combo = self.combos.resolve(ability)?;
        let mut working = ability.clone();
        working.potency = combo.potency;

        let mut working = self.buffs.before_ability(&working, press);

        // Cooldown
        let status = self.cooldowns.status_of(&working, press);
        if !status.ready_to_use && self.cooldowns.policy() == ChargePolicy::Queue {
            self.warnings.push(SimWarning::ChargesQueued {
                time: press,
                ability: working.name.clone(),
            });
        }
        let explicit = working.cooldown.as_ref().and_then(|cd| {
            cd.reduced_by
                .map(|stat| self.timing.cooldown_time(cd.time, self.stats.speed(stat)))
        });
        self.cooldowns.use_ability(&working, press, explicit)?;

        // Timing
        let cast_time = self.effective_cast_time(&working, press);
        working.cast_time = cast_time;
        let gcd_length = if is_gcd {
            self.gcd_length(&working, press)
        } else {
            0.0
        };
        let lock = self.lock_time(&working, cast_time);

        // Gauge
        let clamps = self
            .gauge
            .update(&working, self.settings.strict_gauge)
            .map_err(|source| SimError::Gauge {
                ability: working.name.clone(),
                time: press,
                source,
            })?;
        for clamp in clamps {
            tracing::warn!(
                ability = %working.name,
                time = press,
                resource = %clamp.resource,
                attempted = clamp.attempted,
                clamped = clamp.clamped,
                "Gauge out of bounds, clamping"
            );
            self.warnings.push(SimWarning::GaugeClamped {
                time: press,
                ability: working.name.clone(),
                resource: clamp.resource,
                attempted: clamp.attempted,
                clamped: clamp.clamped,
            });
        }

        // Snapshot
        let snapshot_at = press + cast_time;
        let working = self.buffs.before_snapshot(&working, snapshot_at);
        let buffs = self.buffs.buffs_for(&working, snapshot_at);
        let effects = self.buffs.combined_effects(&working, snapshot_at);

        for buff in &working.activates {
            self.buffs.activate(Arc::clone(buff), snapshot_at);
        }

        tracing::debug!(
            ability = %working.name,
            time = press,
            potency = ?working.potency,
            gcd = gcd_length,
            lock,
            combo = ?combo.continued,
            "Used ability"
        );

        self.records.push(AbilityUseRecord {
            potency: working.potency,
            ability: working,
            used_at: press,
            snapshot_at,
            lands_at: snapshot_at + ability.app_delay,
            cycle: self.cycle_index(),
            gcd_length,
            lock_time: lock,
            combo_continued: combo.continued.is_some(),
            buffs,
            effects,
            gauge: self.gauge.snapshot(),
            cutoff_fraction: 1.0,
            dot_seconds: 0.0,
        });

        if is_gcd {
            self.next_gcd_time = press + gcd_length;
        } else if press + lock > self.next_gcd_time + EPSILON {
            tracing::debug!(
                time = press,
                delay = press + lock - self.next_gcd_time,
                "oGCD clipped the GCD"
            );
        }
        self.current_time = press + lock;

        Ok(UseOutcome::Used)
    }

    fn haste_at(&self, ability: &Ability, at: f64) -> f64 {
        self.buffs.combined_effects(ability, at).haste
    }

    fn gcd_length(&self, ability: &Ability, at: f64) -> f64 {
        self.scaled(ability, ability.recast(), at)
    }

    fn effective_cast_time(&self, ability: &Ability, at: f64) -> f64 {
        let cast_time = Timed::cast_time(ability);
        if cast_time <= 0.0 {
            return 0.0;
        }
        self.scaled(ability, cast_time, at)
    }

    /// Apply speed and haste to `base` unless the ability's timing is fixed.
    fn scaled(&self, ability: &Ability, base: f64, at: f64) -> f64 {
        if ability.is_fixed_recast() {
            return base;
        }
        match ability.attack_type.speed_stat() {
            Some(stat) => self.timing.gcd_time(
                base,
                self.stats.speed(stat),
                self.haste_at(ability, at),
            ),
            None => base,
        }
    }

    fn lock_time(&self, ability: &Ability, cast_time: f64) -> f64 {
        let animation_lock = self.timing.animation_lock(ability);
        if cast_time > 0.0 {
            (cast_time + self.timing.caster_tax()).max(animation_lock)
        } else {
            animation_lock
        }
    }

    // ─── Finalization ───────────────────────────────────────────────────────

    /// Apply the cutoff policy and DoT accounting, consuming the processor.
    pub fn finalize(self) -> CompletedRun {
        let total_time = self.settings.total_time;
        let cutoff = self.settings.cutoff;
        let mut records = self.records;
        let mut dps_window = total_time;

        let trailing = records
            .iter()
            .rposition(|r| r.is_gcd() && r.used_at + r.gcd_length > total_time + EPSILON);

        if let Some(index) = trailing {
            match cutoff {
                CutoffMode::Prorate => {
                    let record = &mut records[index];
                    record.cutoff_fraction =
                        ((total_time - record.used_at) / record.gcd_length).clamp(0.0, 1.0);
                }
                CutoffMode::LaxGcd => {
                    let record = &records[index];
                    dps_window = record.used_at + record.gcd_length;
                }
                CutoffMode::StrictGcd => {
                    records.remove(index);
                }
            }
        }

        credit_dots(&mut records, dps_window);

        tracing::debug!(
            uses = records.len(),
            warnings = self.warnings.len(),
            window = dps_window,
            ?cutoff,
            "Finalized run"
        );

        CompletedRun {
            records,
            warnings: self.warnings,
            total_time,
            dps_window,
            cutoff,
        }
    }
}

/// Credit each DoT application with its uptime, truncated by the next
/// application of the same DoT and by the end of the window.
fn credit_dots(records: &mut [AbilityUseRecord], window_end: f64) {
    for i in 0..records.len() {
        let Some(dot) = records[i].ability.dot.clone() else {
            continue;
        };
        let start = records[i].snapshot_at;
        let reapplied_at = records[i + 1..]
            .iter()
            .find(|r| r.ability.dot.as_ref().is_some_and(|d| d.id == dot.id))
            .map(|r| r.snapshot_at);

        let end = (start + dot.duration)
            .min(reapplied_at.unwrap_or(f64::INFINITY))
            .min(window_end);
        records[i].dot_seconds = (end - start).max(0.0);
    }
}
