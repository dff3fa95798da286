//! Batch evaluation of rotations against a stat sheet
//!
//! The action sequence of a rotation only depends on the speed-related stats,
//! so completed runs are cached by `TimingCacheKey` and damage is recomputed
//! for every evaluation. Each runner owns its cache.

use std::sync::Arc;
use std::time::Instant;

use gcdsim_types::{SimSettings, StatSheet};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Rotation;
use crate::ability::Ability;
use crate::error::SimError;
use crate::formulas::{DamageModel, TimingFormulas};
use crate::timeline::{CompletedRun, CycleProcessor, Gauge};

/// Stats that determine the action sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimingCacheKey {
    pub skill_speed: u32,
    pub spell_speed: u32,
    pub weapon_delay_ms: u32,
}

impl From<&StatSheet> for TimingCacheKey {
    fn from(stats: &StatSheet) -> Self {
        Self {
            skill_speed: stats.skill_speed,
            spell_speed: stats.spell_speed,
            weapon_delay_ms: (stats.weapon_delay * 1000.0).round() as u32,
        }
    }
}

/// Outcome of one rotation in an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationResult {
    pub name: String,
    pub dps: f64,
    pub total_damage: f64,
    pub gcd_count: f64,
    pub warnings: usize,
    /// Set when the run failed; the numbers are zero then
    pub error: Option<String>,
}

impl RotationResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Results of every rotation for one stat sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub results: Vec<RotationResult>,
    /// Index of the highest-DPS successful rotation
    pub best: usize,
    /// Whether the cached runs were reused
    pub cache_hit: bool,
}

impl BatchOutcome {
    pub fn best(&self) -> &RotationResult {
        &self.results[self.best]
    }
}

/// Errors raised by the batch runner
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("no rotations to evaluate")]
    NoRotations,

    #[error("all {count} rotations failed")]
    AllRotationsFailed {
        count: usize,
        #[source]
        first: SimError,
    },
}

type CachedRuns = Vec<Result<CompletedRun, SimError>>;

/// Evaluates a set of rotations, reusing runs while the timing stats are unchanged.
pub struct RotationBatchRunner<G: Gauge> {
    rotations: Vec<Arc<dyn Rotation<G>>>,
    /// Origins of cooldown pools, declared on every fresh processor
    pool_origins: Vec<Ability>,
    settings: SimSettings,
    gauge: G,
    timing: Arc<dyn TimingFormulas>,
    damage: Arc<dyn DamageModel>,
    cache: Option<(TimingCacheKey, CachedRuns)>,
    simulations: usize,
}

impl<G: Gauge> RotationBatchRunner<G> {
    pub fn new(
        rotations: Vec<Arc<dyn Rotation<G>>>,
        settings: SimSettings,
        gauge: G,
        timing: Arc<dyn TimingFormulas>,
        damage: Arc<dyn DamageModel>,
    ) -> Self {
        Self {
            rotations,
            pool_origins: Vec::new(),
            settings,
            gauge,
            timing,
            damage,
            cache: None,
            simulations: 0,
        }
    }

    /// Declare the canonical cooldown of each pool in `origins` before every run.
    pub fn with_cooldown_pools(mut self, origins: Vec<Ability>) -> Self {
        self.pool_origins = origins;
        self.cache = None;
        self
    }

    pub fn rotation_names(&self) -> Vec<&str> {
        self.rotations.iter().map(|r| r.name()).collect()
    }

    /// Number of times the rotations were simulated (cache misses).
    pub fn simulations(&self) -> usize {
        self.simulations
    }

    /// Runs from the last evaluation, in rotation order.
    pub fn cached_runs(&self) -> Option<&[Result<CompletedRun, SimError>]> {
        self.cache.as_ref().map(|(_, runs)| runs.as_slice())
    }

    pub fn clear_cache(&mut self) {
        self.cache = None;
    }

    /// Simulate every rotation on a fresh processor, in parallel.
    pub fn simulate(&self, stats: &StatSheet) -> CachedRuns {
        self.rotations
            .par_iter()
            .map(|rotation| {
                let mut cp = CycleProcessor::new(
                    self.settings.clone(),
                    stats.clone(),
                    self.gauge.clone(),
                    Arc::clone(&self.timing),
                );
                for origin in &self.pool_origins {
                    cp.declare_cooldown_pool(origin);
                }
                match rotation.apply(&mut cp) {
                    Ok(()) => Ok(cp.finalize()),
                    Err(err) => {
                        tracing::warn!(rotation = %rotation.name(), error = %err, "Rotation failed");
                        Err(err)
                    }
                }
            })
            .collect()
    }

    /// Evaluate every rotation against `stats` and pick the best.
    pub fn evaluate(&mut self, stats: &StatSheet) -> Result<BatchOutcome, RunnerError> {
        if self.rotations.is_empty() {
            return Err(RunnerError::NoRotations);
        }

        let key = TimingCacheKey::from(stats);
        let cache_hit = matches!(&self.cache, Some((cached, _)) if *cached == key);

        if !cache_hit {
            let timer = Instant::now();
            let runs = self.simulate(stats);
            self.simulations += 1;
            tracing::debug!(
                rotations = runs.len(),
                elapsed_ms = timer.elapsed().as_millis() as u64,
                ?key,
                "Simulated rotations"
            );
            self.cache = Some((key, runs));
        } else {
            tracing::trace!(?key, "Timing cache hit");
        }

        let Some((_, runs)) = &self.cache else {
            return Err(RunnerError::NoRotations);
        };

        let results: Vec<RotationResult> = self
            .rotations
            .iter()
            .zip(runs)
            .map(|(rotation, run)| match run {
                Ok(run) => {
                    let summary = run.summarize(stats, self.damage.as_ref());
                    RotationResult {
                        name: rotation.name().to_string(),
                        dps: summary.dps,
                        total_damage: summary.total,
                        gcd_count: run.gcd_count(),
                        warnings: run.warnings.len(),
                        error: None,
                    }
                }
                Err(err) => RotationResult {
                    name: rotation.name().to_string(),
                    dps: 0.0,
                    total_damage: 0.0,
                    gcd_count: 0.0,
                    warnings: 0,
                    error: Some(err.to_string()),
                },
            })
            .collect();

        let best = results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_ok())
            .max_by(|a, b| a.1.dps.total_cmp(&b.1.dps))
            .map(|(index, _)| index);

        let Some(best) = best else {
            let first = runs
                .iter()
                .find_map(|run| run.as_ref().err().cloned())
                .ok_or(RunnerError::NoRotations)?;
            return Err(RunnerError::AllRotationsFailed {
                count: results.len(),
                first,
            });
        };

        tracing::debug!(
            best = %results[best].name,
            dps = results[best].dps,
            cache_hit,
            "Evaluated rotations"
        );

        Ok(BatchOutcome {
            results,
            best,
            cache_hit,
        })
    }
}
