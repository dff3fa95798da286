//! Tests for the cycle processor
//!
//! Covers GCD/oGCD sequencing, weaving and clipping, buff hooks in the use
//! pipeline, gauge handling, cutoff modes and DoT accounting.

use std::sync::Arc;

use gcdsim_types::{CutoffMode, SimSettings, SpeedStat, StatSheet};

use super::{CycleProcessor, Gauge, NoGauge, ResourceGauge, SimWarning, UseOutcome};
use crate::ability::{Ability, AbilityKind, CooldownSpec, DotSpec, ResourceDelta};
use crate::buffs::{Buff, BuffScope};
use crate::combo::{ComboBehavior, ComboKey};
use crate::error::SimError;
use crate::formulas::{PotencyDamage, StandardTiming};

fn make_settings(total_time: f64) -> SimSettings {
    SimSettings {
        total_time,
        ..SimSettings::default()
    }
}

fn make_processor_with<G: Gauge>(settings: SimSettings, stats: StatSheet, gauge: G) -> CycleProcessor<G> {
    CycleProcessor::new(settings, stats, gauge, Arc::new(StandardTiming::default()))
}

fn make_processor(total_time: f64) -> CycleProcessor<NoGauge> {
    make_processor_with(make_settings(total_time), StatSheet::default(), NoGauge)
}

fn filler() -> Ability {
    Ability::gcd(1, "Filler", 200.0)
}

fn weave(id: u32) -> Ability {
    Ability::ogcd(id, format!("Weave {id}"), Some(100.0))
}

// ─────────────────────────────────────────────────────────────────────────────
// Sequencing
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_gcds_advance_by_gcd_length() {
    let mut cp = make_processor(60.0);
    for _ in 0..3 {
        assert_eq!(cp.use_gcd(&filler()).unwrap(), UseOutcome::Used);
    }

    let used_at: Vec<f64> = cp.records().iter().map(|r| r.used_at).collect();
    assert_eq!(used_at, vec![0.0, 2.5, 5.0]);
    assert_eq!(cp.next_gcd_time(), 7.5);
    assert!((cp.current_time() - 5.6).abs() < 1e-9, "Animation lock after the last GCD");
}

#[test]
fn test_weaving_until_the_window_closes() {
    let mut cp = make_processor(60.0);
    cp.use_gcd(&filler()).unwrap();

    let mut woven = 0;
    for id in 10..20 {
        let ogcd = weave(id);
        if !cp.can_use_without_clipping(&ogcd) {
            break;
        }
        cp.use_ogcd(&ogcd).unwrap();
        woven += 1;
    }
    assert_eq!(woven, 3, "0.6s locks fit three times in a 2.5s GCD");
    assert_eq!(cp.next_gcd_time(), 2.5, "Weaving never moves the GCD");
}

#[test]
fn test_ogcd_clip_delays_next_gcd() {
    let mut cp = make_processor(60.0);
    cp.use_gcd(&filler()).unwrap();
    for id in 10..14 {
        cp.use_ogcd(&weave(id)).unwrap();
    }
    assert!(cp.current_time() > cp.next_gcd_time());

    let clipped_at = cp.current_time();
    cp.use_gcd(&filler()).unwrap();
    assert_eq!(cp.records().last().unwrap().used_at, clipped_at);
}

#[test]
fn test_ogcd_not_ready_leaves_state_untouched() {
    let mut cp = make_processor(60.0);
    let burst = weave(20).with_cooldown(CooldownSpec::new(60.0));

    assert_eq!(cp.use_ogcd(&burst).unwrap(), UseOutcome::Used);
    let time = cp.current_time();
    assert_eq!(
        cp.use_ogcd(&burst).unwrap(),
        UseOutcome::NotReady { ready_at: 60.0 }
    );
    assert_eq!(cp.records().len(), 1);
    assert_eq!(cp.current_time(), time);
    assert!(!cp.can_use_without_clipping(&burst));
}

#[test]
fn test_cast_locks_for_cast_plus_tax() {
    let mut cp = make_processor(60.0);
    cp.use_gcd(&Ability::spell(2, "Fire", 300.0, 2.0)).unwrap();

    let record = &cp.records()[0];
    assert_eq!(record.snapshot_at, 2.0);
    assert!((record.lock_time - 2.1).abs() < 1e-9);
    assert_eq!(cp.next_gcd_time(), 2.5);
}

#[test]
fn test_use_ability_dispatches_on_kind() {
    let mut cp = make_processor(60.0);
    cp.use_ability(&filler()).unwrap();
    cp.use_ability(&weave(10)).unwrap();

    assert_eq!(cp.records()[0].ability.kind, AbilityKind::Gcd);
    assert_eq!(cp.records()[1].gcd_length, 0.0);
    assert_eq!(cp.records()[1].used_at, 0.6);
}

#[test]
fn test_advance_to_never_moves_backwards() {
    let mut cp = make_processor(60.0);
    cp.advance_to(10.0);
    cp.advance_to(5.0);
    assert_eq!(cp.current_time(), 10.0);
    assert_eq!(cp.remaining_time(), 50.0);
}

#[test]
fn test_advance_for_cooldown() {
    let mut cp = make_processor(60.0);
    let burst = weave(20).with_cooldown(CooldownSpec::new(30.0));
    cp.use_ogcd(&burst).unwrap();
    cp.advance_for_cooldown(&burst);
    assert_eq!(cp.current_time(), 30.0);
    assert!(cp.is_ready(&burst));
}

// ─────────────────────────────────────────────────────────────────────────────
// Cooldowns & combos
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_speed_reduced_cooldown() {
    let stats = StatSheet {
        skill_speed: 1000,
        ..StatSheet::default()
    };
    let mut cp = make_processor_with(make_settings(120.0), stats, NoGauge);
    let gcd_with_cd = filler().with_cooldown(CooldownSpec::new(60.0).reduced_by(SpeedStat::SkillSpeed));

    cp.use_gcd(&gcd_with_cd).unwrap();
    assert_eq!(cp.cooldown_status(&gcd_with_cd).ready_at.absolute, 58.38);
    assert_eq!(cp.records()[0].gcd_length, 2.43);
}

#[test]
fn test_charge_exhaustion_is_fatal() {
    let mut cp = make_processor(60.0);
    let limited = filler().with_cooldown(CooldownSpec::new(30.0));

    cp.use_gcd(&limited).unwrap();
    let err = cp.use_gcd(&limited).unwrap_err();
    assert!(matches!(err, SimError::Cooldown(_)));
}

#[test]
fn test_named_combo_through_processor() {
    let mut cp = make_processor(60.0);
    let g = Ability::gcd(70, "G", 300.0).with_combo(ComboKey::named("g"), ComboBehavior::Start);
    let s = Ability::gcd(71, "S", 0.0)
        .with_combo(ComboKey::named("g"), ComboBehavior::continues_from([70], 460.0));

    cp.use_gcd(&g).unwrap();
    cp.use_gcd(&s).unwrap();

    let potencies: Vec<Option<f64>> = cp.records().iter().map(|r| r.potency).collect();
    assert_eq!(potencies, vec![Some(300.0), Some(460.0)]);
    assert!(cp.records()[1].combo_continued);
}

// ─────────────────────────────────────────────────────────────────────────────
// Buffs
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_instant_cast_buff_removes_cast_lock() {
    let mut cp = make_processor(60.0);
    let swift = Arc::new(
        Buff::new("Swiftcast", Some(10.0))
            .applies_to(BuffScope::Kind(AbilityKind::Gcd))
            .before_ability(|ability, handle| {
                let mut ability = ability.clone();
                if ability.cast_time > 0.0 {
                    ability.cast_time = 0.0;
                    handle.remove();
                }
                ability
            }),
    );
    let trigger = weave(30).activates(swift);
    let spell = Ability::spell(2, "Fire", 300.0, 2.0);

    cp.use_ogcd(&trigger).unwrap();
    cp.use_gcd(&spell).unwrap();

    let record = cp.records().last().unwrap();
    assert_eq!(record.ability.cast_time, 0.0);
    assert_eq!(record.snapshot_at, record.used_at);
    assert!((cp.current_time() - 1.2).abs() < 1e-9);
    assert!(!cp.buffs().is_active("Swiftcast", cp.current_time()));
}

#[test]
fn test_fixed_recast_ignores_speed() {
    let stats = StatSheet {
        spell_speed: 2500,
        ..StatSheet::default()
    };
    let mut cp = make_processor_with(make_settings(60.0), stats, NoGauge);
    let fixed = Ability::spell(3, "Fixed", 300.0, 2.0).with_gcd(2.5, true);
    let scaled = Ability::spell(4, "Scaled", 300.0, 2.0);

    cp.use_gcd(&fixed).unwrap();
    cp.use_gcd(&scaled).unwrap();

    let records = cp.records();
    assert_eq!(records[0].gcd_length, 2.5);
    assert_eq!(records[0].ability.cast_time, 2.0);
    assert!(records[1].gcd_length < 2.5, "Spell speed shortens the recast");
    assert!(records[1].ability.cast_time < 2.0, "Spell speed shortens the cast");
}

#[test]
fn test_uses_grouped_by_cycle() {
    let settings = SimSettings {
        total_time: 30.0,
        cycle_time: 10.0,
        ..SimSettings::default()
    };
    let mut cp = make_processor_with(settings, StatSheet::default(), NoGauge);
    while cp.use_gcd(&filler()).unwrap().was_used() {}

    for record in cp.records() {
        assert_eq!(record.cycle, (record.used_at / 10.0).floor() as u32);
    }
    assert_eq!(cp.cycle_index(), 3, "Clock ends at the window boundary");

    let stats = StatSheet::default();
    let summary = cp.finalize().summarize(&stats, &PotencyDamage::default());
    assert_eq!(summary.by_cycle.len(), 3);
    assert!(summary.by_cycle.iter().all(|&d| d > 0.0));
    let cycle_total: f64 = summary.by_cycle.iter().sum();
    assert!((cycle_total - summary.total).abs() < 1e-6);
}

#[test]
fn test_application_delay_offsets_damage_landing() {
    let mut cp = make_processor(60.0);
    cp.use_gcd(&Ability::spell(2, "Fire", 300.0, 2.0).with_app_delay(0.8))
        .unwrap();
    cp.use_gcd(&filler()).unwrap();

    let delayed = &cp.records()[0];
    assert_eq!(delayed.snapshot_at, 2.0);
    assert!((delayed.lands_at - 2.8).abs() < 1e-9, "Damage lands after the snapshot");

    let instant = &cp.records()[1];
    assert_eq!(instant.lands_at, instant.snapshot_at);
}

#[test]
fn test_buff_effects_recorded_at_snapshot() {
    let mut cp = make_processor(60.0);
    let fight = Arc::new(Buff::new("Fight", Some(20.0)).damage_multiplier(1.1));
    cp.use_ogcd(&weave(31).activates(fight)).unwrap();
    cp.use_gcd(&filler()).unwrap();

    let first = &cp.records()[0];
    assert_eq!(first.effects.damage_multiplier, 1.0, "A buff does not apply to its own trigger");
    let second = &cp.records()[1];
    assert_eq!(second.effects.damage_multiplier, 1.1);
    assert_eq!(second.buffs.len(), 1);
}

#[test]
fn test_haste_shortens_gcd() {
    let mut cp = make_processor(60.0);
    let haste = Arc::new(Buff::new("Haste", None).haste(13.0));
    cp.use_ogcd(&weave(32).activates(haste)).unwrap();
    cp.use_gcd(&filler()).unwrap();
    assert_eq!(cp.records()[1].gcd_length, 2.17);
}

// ─────────────────────────────────────────────────────────────────────────────
// Gauge
// ─────────────────────────────────────────────────────────────────────────────

fn make_heat_gauge() -> ResourceGauge {
    ResourceGauge::new().with_resource("heat", 100.0, 90.0)
}

#[test]
fn test_gauge_overflow_clamps_and_warns() {
    let mut cp = make_processor_with(make_settings(60.0), StatSheet::default(), make_heat_gauge());
    let heater = filler().with_resource(ResourceDelta::gain("heat", 20.0));

    assert_eq!(cp.use_gcd(&heater).unwrap(), UseOutcome::Used);
    assert_eq!(cp.gauge().value("heat"), Some(100.0));
    assert_eq!(cp.records()[0].gauge.get("heat"), Some(&100.0));
    assert!(matches!(
        cp.warnings(),
        [SimWarning::GaugeClamped { attempted, .. }] if *attempted == 110.0
    ));
}

#[test]
fn test_strict_gauge_is_fatal() {
    let settings = SimSettings {
        strict_gauge: true,
        ..make_settings(60.0)
    };
    let mut cp = make_processor_with(settings, StatSheet::default(), make_heat_gauge());
    let heater = filler().with_resource(ResourceDelta::gain("heat", 20.0));

    let err = cp.use_gcd(&heater).unwrap_err();
    assert!(matches!(err, SimError::Gauge { .. }));
}

// ─────────────────────────────────────────────────────────────────────────────
// Cutoff
// ─────────────────────────────────────────────────────────────────────────────

fn run_fillers(cutoff: CutoffMode) -> super::CompletedRun {
    let settings = SimSettings {
        cutoff,
        ..make_settings(6.0)
    };
    let mut cp = make_processor_with(settings, StatSheet::default(), NoGauge);
    cp.remaining_cycles(|cp| cp.use_gcd(&filler()).map(|_| ()))
        .unwrap();
    cp.finalize()
}

#[test]
fn test_prorate_scales_trailing_gcd() {
    let run = run_fillers(CutoffMode::Prorate);
    assert_eq!(run.records.len(), 3);
    assert!((run.records[2].cutoff_fraction - 0.4).abs() < 1e-9);
    assert!((run.gcd_count() - 2.4).abs() < 1e-9);
    assert_eq!(run.dps_window, 6.0);
}

#[test]
fn test_lax_gcd_extends_window() {
    let run = run_fillers(CutoffMode::LaxGcd);
    assert_eq!(run.records.len(), 3);
    assert_eq!(run.gcd_count(), 3.0);
    assert_eq!(run.dps_window, 7.5);
}

#[test]
fn test_strict_gcd_drops_trailing_gcd() {
    let run = run_fillers(CutoffMode::StrictGcd);
    assert_eq!(run.records.len(), 2);
    assert_eq!(run.dps_window, 6.0);
}

#[test]
fn test_remaining_cycles_stops_without_progress() {
    let mut cp = make_processor(60.0);
    let passes = cp.remaining_cycles(|_| Ok(())).unwrap();
    assert_eq!(passes, 1);
    assert!(matches!(cp.warnings(), [SimWarning::NoProgress { .. }]));
}

// ─────────────────────────────────────────────────────────────────────────────
// DoTs
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_dot_reapplication_truncates_previous() {
    let mut cp = make_processor(20.0);
    let bio = Ability::gcd(40, "Bio", 0.0).with_dot(DotSpec {
        id: 1,
        tick_potency: 50.0,
        duration: 30.0,
    });

    cp.use_gcd(&bio).unwrap();
    cp.use_gcd(&filler()).unwrap();
    cp.use_gcd(&bio).unwrap();
    let run = cp.finalize();

    assert_eq!(run.records[0].dot_seconds, 5.0, "Cut short by the reapplication");
    assert_eq!(run.records[2].dot_seconds, 15.0, "Cut short by the window end");
    assert_eq!(run.records[1].dot_seconds, 0.0);
}
