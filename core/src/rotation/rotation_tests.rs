//! Tests for rotations and the batch runner

use std::sync::Arc;

use gcdsim_types::{SimSettings, StatSheet};

use super::{PriorityRotation, Rotation, RotationBatchRunner, RunnerError, ScriptedRotation};
use crate::ability::{Ability, CooldownSpec, ResourceDelta};
use crate::error::SimError;
use crate::formulas::{PotencyDamage, StandardTiming};
use crate::timeline::{CycleProcessor, NoGauge, ResourceGauge};

fn make_settings(total_time: f64) -> SimSettings {
    SimSettings {
        total_time,
        ..SimSettings::default()
    }
}

fn make_processor(total_time: f64) -> CycleProcessor<NoGauge> {
    CycleProcessor::new(
        make_settings(total_time),
        StatSheet::default(),
        NoGauge,
        Arc::new(StandardTiming::default()),
    )
}

fn filler(potency: f64) -> Ability {
    Ability::gcd(1, "Filler", potency)
}

fn burst() -> Ability {
    Ability::ogcd(2, "Burst", Some(400.0)).with_cooldown(CooldownSpec::new(60.0))
}

fn used_at(cp: &CycleProcessor<impl crate::timeline::Gauge>, name: &str) -> Vec<f64> {
    cp.records()
        .iter()
        .filter(|r| r.ability.name == name)
        .map(|r| r.used_at)
        .collect()
}

/// Rotation that always hits an exhausted cooldown.
struct Exhausting;

impl Rotation<NoGauge> for Exhausting {
    fn name(&self) -> &str {
        "exhausting"
    }

    fn apply(&self, cp: &mut CycleProcessor<NoGauge>) -> Result<(), SimError> {
        let limited = filler(100.0).with_cooldown(CooldownSpec::new(60.0));
        cp.use_gcd(&limited)?;
        cp.use_gcd(&limited)?;
        Ok(())
    }
}

fn make_runner(rotations: Vec<Arc<dyn Rotation<NoGauge>>>) -> RotationBatchRunner<NoGauge> {
    RotationBatchRunner::new(
        rotations,
        make_settings(30.0),
        NoGauge,
        Arc::new(StandardTiming::default()),
        Arc::new(PotencyDamage::default()),
    )
}

fn exhausting() -> Arc<dyn Rotation<NoGauge>> {
    Arc::new(Exhausting)
}

fn scripted(name: &str, potency: f64) -> Arc<dyn Rotation<NoGauge>> {
    Arc::new(ScriptedRotation::new(name, vec![burst()], vec![filler(potency)]))
}

// ─────────────────────────────────────────────────────────────────────────────
// Scripted
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_scripted_plays_opener_then_loops_cycle() {
    let mut cp = make_processor(10.0);
    let rotation = ScriptedRotation::new("basic", vec![burst(), filler(200.0)], vec![filler(200.0)]);
    rotation.apply(&mut cp).unwrap();

    assert_eq!(cp.records()[0].ability.name, "Burst");
    assert_eq!(used_at(&cp, "Burst"), vec![0.0]);
    assert_eq!(used_at(&cp, "Filler").len(), 4);
    assert!(cp.is_finished());
}

#[test]
fn test_scripted_waits_for_gcd_cooldown() {
    let mut cp = make_processor(25.0);
    let limited = Ability::gcd(3, "Limited", 500.0).with_cooldown(CooldownSpec::new(10.0));
    ScriptedRotation::new("wait", Vec::new(), vec![limited])
        .apply(&mut cp)
        .unwrap();

    assert_eq!(used_at(&cp, "Limited"), vec![0.0, 10.0, 20.0]);
}

#[test]
fn test_scripted_skips_ogcd_on_cooldown() {
    let mut cp = make_processor(10.0);
    ScriptedRotation::new("skip", Vec::new(), vec![filler(200.0), burst()])
        .apply(&mut cp)
        .unwrap();

    assert_eq!(used_at(&cp, "Burst").len(), 1);
    assert!(used_at(&cp, "Filler").len() >= 4);
}

// ─────────────────────────────────────────────────────────────────────────────
// Priority
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_priority_prefers_ready_high_priority_gcd() {
    let mut cp = make_processor(20.0);
    let big = Ability::gcd(4, "Big", 500.0).with_cooldown(CooldownSpec::new(15.0));
    PriorityRotation::new("prio", vec![big, filler(200.0)], vec![burst()])
        .apply(&mut cp)
        .unwrap();

    assert_eq!(used_at(&cp, "Big"), vec![0.0, 15.0]);
    assert_eq!(used_at(&cp, "Burst"), vec![0.6], "Woven after the first GCD");
}

#[test]
fn test_priority_respects_gauge_costs() {
    let mut cp = CycleProcessor::new(
        make_settings(10.0),
        StatSheet::default(),
        ResourceGauge::new().with_resource("heat", 100.0, 0.0),
        Arc::new(StandardTiming::default()),
    );
    let spender = Ability::gcd(5, "Spender", 600.0).with_resource(ResourceDelta::cost("heat", 50.0));
    let builder = Ability::gcd(6, "Builder", 200.0).with_resource(ResourceDelta::gain("heat", 25.0));

    PriorityRotation::new("gauge", vec![spender, builder], Vec::new())
        .apply(&mut cp)
        .unwrap();

    let names: Vec<&str> = cp.records().iter().map(|r| r.ability.name.as_str()).collect();
    assert_eq!(names, vec!["Builder", "Builder", "Spender", "Builder"]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Batch runner
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_runner_picks_best_rotation() {
    let mut runner = make_runner(vec![scripted("weak", 150.0), scripted("strong", 300.0)]);
    let outcome = runner.evaluate(&StatSheet::default()).unwrap();

    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.best().name, "strong");
    assert!(outcome.results[1].dps > outcome.results[0].dps);
    assert!(!outcome.cache_hit);
}

#[test]
fn test_runner_reuses_runs_for_same_timing_key() {
    let mut runner = make_runner(vec![scripted("basic", 200.0)]);
    let base = StatSheet::default();
    let first = runner.evaluate(&base).unwrap();

    let critter = StatSheet {
        crit: 2000,
        ..base.clone()
    };
    let second = runner.evaluate(&critter).unwrap();
    assert!(second.cache_hit);
    assert_eq!(runner.simulations(), 1);
    assert!(second.best().dps > first.best().dps, "Damage is recomputed for new stats");

    let faster = StatSheet {
        skill_speed: 1000,
        ..base
    };
    let third = runner.evaluate(&faster).unwrap();
    assert!(!third.cache_hit);
    assert_eq!(runner.simulations(), 2);
}

#[test]
fn test_runner_isolates_failing_rotation() {
    let mut runner = make_runner(vec![exhausting(), scripted("basic", 200.0)]);
    let outcome = runner.evaluate(&StatSheet::default()).unwrap();

    assert!(outcome.results[0].error.is_some());
    assert_eq!(outcome.best().name, "basic");
}

#[test]
fn test_runner_all_failed() {
    let mut runner = make_runner(vec![exhausting()]);
    let err = runner.evaluate(&StatSheet::default()).unwrap_err();
    assert!(matches!(
        err,
        RunnerError::AllRotationsFailed {
            count: 1,
            first: SimError::Cooldown(_)
        }
    ));
}

#[test]
fn test_runner_without_rotations() {
    let mut runner = make_runner(Vec::new());
    assert!(matches!(
        runner.evaluate(&StatSheet::default()),
        Err(RunnerError::NoRotations)
    ));
}

#[test]
fn test_runner_declares_cooldown_pools_on_every_run() {
    let origin = Ability::ogcd(20, "Origin", Some(300.0)).with_cooldown(CooldownSpec::new(60.0));
    let sharer = Ability::ogcd(21, "Sharer", Some(300.0))
        .with_cooldown(CooldownSpec::new(60.0).with_charges(3).shared_with(20));
    let rotation: Arc<dyn Rotation<NoGauge>> = Arc::new(ScriptedRotation::new(
        "shared",
        Vec::new(),
        vec![filler(200.0), sharer],
    ));

    let mut runner = make_runner(vec![rotation]).with_cooldown_pools(vec![origin]);
    runner.evaluate(&StatSheet::default()).unwrap();

    let runs = runner.cached_runs().expect("runs are cached");
    let run = runs[0].as_ref().expect("rotation succeeds");
    let sharer_uses = run.records.iter().filter(|r| r.ability.name == "Sharer").count();
    assert_eq!(sharer_uses, 1, "Pool capacity comes from the origin");
}
