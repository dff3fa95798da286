//! Tests for the buff engine
//!
//! Covers activation and refresh, stack consumption through hooks, scope
//! matching and effect folding.

use std::sync::Arc;

use super::{Buff, BuffEngine, BuffScope};
use crate::ability::{Ability, AbilityKind};

fn make_gcd() -> Ability {
    Ability::spell(1, "Fire", 200.0, 2.0)
}

fn make_instant_cast(stacks: u32) -> Arc<Buff> {
    Arc::new(
        Buff::new("Swiftcast", Some(10.0))
            .with_stacks(stacks)
            .applies_to(BuffScope::Kind(AbilityKind::Gcd))
            .before_ability(|ability, handle| {
                let mut ability = ability.clone();
                if ability.cast_time > 0.0 {
                    ability.cast_time = 0.0;
                    handle.consume_stack();
                }
                ability
            }),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Activation & expiry
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_activate_and_expire() {
    let mut engine = BuffEngine::new();
    engine.activate(Arc::new(Buff::new("Fight", Some(20.0))), 5.0);

    assert!(engine.is_active("Fight", 5.0));
    assert!(engine.is_active("Fight", 24.9));
    assert!(!engine.is_active("Fight", 25.0), "Expires exactly at applied + duration");
    assert_eq!(engine.remaining("Fight", 15.0), Some(10.0));
}

#[test]
fn test_permanent_buff_never_expires() {
    let mut engine = BuffEngine::new();
    engine.activate(Arc::new(Buff::new("Stance", None)), 0.0);
    assert!(engine.is_active("Stance", 10_000.0));
    assert_eq!(engine.remaining("Stance", 50.0), None);
}

#[test]
fn test_refresh_restarts_duration() {
    let mut engine = BuffEngine::new();
    let buff = Arc::new(Buff::new("Surge", Some(30.0)));

    engine.activate(Arc::clone(&buff), 0.0);
    engine.activate(buff, 20.0);
    assert_eq!(engine.remaining("Surge", 20.0), Some(30.0));
    assert_eq!(engine.active_at(20.0).len(), 1, "Refresh does not duplicate");
}

#[test]
fn test_refresh_with_max_duration_extends_and_caps() {
    let mut engine = BuffEngine::new();
    let buff = Arc::new(Buff::new("Dot Boost", Some(30.0)).with_max_duration(40.0));

    engine.activate(Arc::clone(&buff), 0.0);
    engine.activate(Arc::clone(&buff), 5.0);
    // 30 + 30 = 60, capped at 5 + 40
    assert_eq!(engine.remaining("Dot Boost", 5.0), Some(40.0));

    engine.activate(buff, 40.0);
    // 45 + 30 = 75, cap is 80
    assert_eq!(engine.remaining("Dot Boost", 40.0), Some(35.0));
}

#[test]
fn test_refresh_resets_stacks() {
    let mut engine = BuffEngine::new();
    let buff = make_instant_cast(2);
    engine.activate(Arc::clone(&buff), 0.0);
    engine.before_ability(&make_gcd(), 1.0);
    assert_eq!(engine.stacks_of("Swiftcast", 1.0), Some(1));

    engine.activate(buff, 2.0);
    assert_eq!(engine.stacks_of("Swiftcast", 2.0), Some(2));
}

#[test]
fn test_remove() {
    let mut engine = BuffEngine::new();
    engine.activate(Arc::new(Buff::new("Fight", Some(20.0))), 0.0);
    assert!(engine.remove("Fight"));
    assert!(!engine.remove("Fight"));
    assert!(!engine.is_active("Fight", 1.0));
}

// ─────────────────────────────────────────────────────────────────────────────
// Hooks
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_before_ability_rewrites_snapshot_without_touching_definition() {
    let mut engine = BuffEngine::new();
    engine.activate(make_instant_cast(1), 0.0);

    let original = make_gcd();
    let working = engine.before_ability(&original, 1.0);

    assert_eq!(working.cast_time, 0.0);
    assert_eq!(original.cast_time, 2.0, "Static definition is untouched");
    assert!(
        !engine.is_active("Swiftcast", 1.0),
        "Last stack consumed removes the buff"
    );
}

#[test]
fn test_hook_skips_abilities_outside_scope() {
    let mut engine = BuffEngine::new();
    engine.activate(make_instant_cast(1), 0.0);

    let ogcd = Ability::ogcd(9, "Weave", Some(100.0));
    engine.before_ability(&ogcd, 1.0);
    assert_eq!(engine.stacks_of("Swiftcast", 1.0), Some(1));
}

#[test]
fn test_hooks_run_in_activation_order() {
    let mut engine = BuffEngine::new();
    let double = Arc::new(Buff::new("Double", Some(30.0)).before_snapshot(|ability, _| {
        let mut ability = ability.clone();
        ability.potency = ability.potency.map(|p| p * 2.0);
        ability
    }));
    let add = Arc::new(Buff::new("Add", Some(30.0)).before_snapshot(|ability, _| {
        let mut ability = ability.clone();
        ability.potency = ability.potency.map(|p| p + 50.0);
        ability
    }));

    engine.activate(double, 0.0);
    engine.activate(add, 0.0);
    let result = engine.before_snapshot(&make_gcd(), 1.0);
    assert_eq!(result.potency, Some(450.0), "(200 * 2) + 50");
}

#[test]
fn test_hook_removing_non_stacking_buff() {
    let mut engine = BuffEngine::new();
    let once = Arc::new(Buff::new("Once", Some(30.0)).before_snapshot(|ability, handle| {
        handle.consume_stack();
        ability.clone()
    }));

    engine.activate(once, 0.0);
    engine.before_snapshot(&make_gcd(), 1.0);
    assert!(!engine.is_active("Once", 1.0));
}

#[test]
fn test_expired_buff_hook_does_not_run() {
    let mut engine = BuffEngine::new();
    engine.activate(make_instant_cast(1), 0.0);

    let working = engine.before_ability(&make_gcd(), 10.0);
    assert_eq!(working.cast_time, 2.0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Effects
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_combined_effects_fold() {
    let mut engine = BuffEngine::new();
    engine.activate(Arc::new(Buff::new("A", Some(20.0)).damage_multiplier(1.1)), 0.0);
    engine.activate(Arc::new(Buff::new("B", Some(20.0)).damage_multiplier(1.05).haste(10.0)), 0.0);
    engine.activate(
        Arc::new(
            Buff::new("OnlyOgcd", Some(20.0))
                .damage_multiplier(2.0)
                .applies_to(BuffScope::Kind(AbilityKind::Ogcd)),
        ),
        0.0,
    );

    let effects = engine.combined_effects(&make_gcd(), 1.0);
    assert!((effects.damage_multiplier - 1.155).abs() < 1e-9);
    assert_eq!(effects.haste, 10.0);
    assert!(!effects.force_crit);

    assert_eq!(engine.active_at(1.0).len(), 3);
    assert_eq!(engine.buffs_for(&make_gcd(), 1.0).len(), 2);
}

#[test]
fn test_custom_and_id_scopes() {
    let by_id = BuffScope::Abilities(vec![1, 2]);
    let custom = BuffScope::Custom(Arc::new(|a: &Ability| a.cast_time > 0.0));

    assert!(by_id.matches(&make_gcd()));
    assert!(!by_id.matches(&Ability::gcd(3, "Other", 100.0)));
    assert!(custom.matches(&make_gcd()));
    assert!(!custom.matches(&Ability::gcd(3, "Other", 100.0)));
}
