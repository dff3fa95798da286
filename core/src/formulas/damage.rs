//! Potency → damage conversion

use std::fmt;

use gcdsim_types::StatSheet;
use serde::{Deserialize, Serialize};

use crate::ability::Ability;
use crate::buffs::CombinedEffects;

/// Expected damage of one ability use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageResult {
    pub direct: f64,
    /// Damage per DoT tick (0 when the ability applies no DoT)
    pub dot_per_tick: f64,
}

/// Converts potency into damage for a given stat sheet.
pub trait DamageModel: Send + Sync + fmt::Debug {
    fn damage(
        &self,
        stats: &StatSheet,
        ability: &Ability,
        potency: f64,
        effects: &CombinedEffects,
    ) -> DamageResult;
}

/// Expected-value model from potency and the crit/direct hit rates.
#[derive(Debug, Clone, PartialEq)]
pub struct PotencyDamage {
    pub level_main: f64,
    pub level_sub: f64,
    pub level_div: f64,
    /// Main stat scaling factor for the job's role
    pub main_stat_factor: f64,
}

impl Default for PotencyDamage {
    fn default() -> Self {
        Self {
            level_main: 440.0,
            level_sub: 420.0,
            level_div: 2780.0,
            main_stat_factor: 237.0,
        }
    }
}

impl PotencyDamage {
    fn attack_power(&self, stats: &StatSheet) -> f64 {
        let main = f64::from(stats.main_stat);
        ((self.main_stat_factor * (main - self.level_main) / self.level_main).floor() + 100.0)
            / 100.0
    }

    fn weapon(&self, stats: &StatSheet) -> f64 {
        ((self.level_main * 100.0 / 1000.0).floor() + f64::from(stats.weapon_damage)) / 100.0
    }

    fn determination(&self, stats: &StatSheet) -> f64 {
        let det = f64::from(stats.determination);
        (1000.0 + (140.0 * (det - self.level_main) / self.level_div).floor()) / 1000.0
    }

    pub fn crit_rate(&self, stats: &StatSheet) -> f64 {
        let crit = f64::from(stats.crit);
        ((200.0 * (crit - self.level_sub) / self.level_div).floor() + 50.0) / 1000.0
    }

    pub fn crit_multiplier(&self, stats: &StatSheet) -> f64 {
        let crit = f64::from(stats.crit);
        ((200.0 * (crit - self.level_sub) / self.level_div).floor() + 1400.0) / 1000.0
    }

    pub fn direct_hit_rate(&self, stats: &StatSheet) -> f64 {
        let dh = f64::from(stats.direct_hit);
        (550.0 * (dh - self.level_sub) / self.level_div).floor() / 1000.0
    }

    /// Expected multiplier from crit and direct hit chances.
    fn hit_multiplier(&self, stats: &StatSheet, crit: bool, dhit: bool) -> f64 {
        let crit_mult = self.crit_multiplier(stats);
        let crit_factor = if crit {
            crit_mult
        } else {
            1.0 + self.crit_rate(stats).clamp(0.0, 1.0) * (crit_mult - 1.0)
        };
        let dh_factor = if dhit {
            1.25
        } else {
            1.0 + self.direct_hit_rate(stats).clamp(0.0, 1.0) * 0.25
        };
        crit_factor * dh_factor
    }

    fn base(&self, stats: &StatSheet, potency: f64) -> f64 {
        potency / 100.0 * self.attack_power(stats) * self.determination(stats) * self.weapon(stats)
    }
}

impl DamageModel for PotencyDamage {
    fn damage(
        &self,
        stats: &StatSheet,
        ability: &Ability,
        potency: f64,
        effects: &CombinedEffects,
    ) -> DamageResult {
        let crit = ability.auto_crit || effects.force_crit;
        let dhit = ability.auto_dh || effects.force_dhit;

        let direct = self.base(stats, potency)
            * effects.damage_multiplier
            * self.hit_multiplier(stats, crit, dhit);

        // DoT ticks roll crit/dh independently of the application
        let dot_per_tick = ability.dot.as_ref().map_or(0.0, |dot| {
            self.base(stats, dot.tick_potency)
                * effects.damage_multiplier
                * self.hit_multiplier(stats, false, false)
        });

        DamageResult {
            direct,
            dot_per_tick,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_scales_linearly_with_potency() {
        let model = PotencyDamage::default();
        let stats = StatSheet::default();
        let ability = Ability::gcd(1, "Strike", 100.0);
        let effects = CombinedEffects::default();

        let one = model.damage(&stats, &ability, 100.0, &effects).direct;
        let two = model.damage(&stats, &ability, 200.0, &effects).direct;
        assert!(one > 0.0);
        assert!((two - 2.0 * one).abs() < 1e-9);
    }

    #[test]
    fn test_multiplier_and_forced_crit() {
        let model = PotencyDamage::default();
        let stats = StatSheet {
            crit: 2000,
            ..StatSheet::default()
        };
        let ability = Ability::gcd(1, "Strike", 100.0);
        let plain = model.damage(&stats, &ability, 100.0, &CombinedEffects::default());
        let buffed = model.damage(
            &stats,
            &ability,
            100.0,
            &CombinedEffects {
                damage_multiplier: 1.1,
                force_crit: true,
                ..CombinedEffects::default()
            },
        );

        assert!(buffed.direct > plain.direct * 1.1, "Forced crit adds on top of the multiplier");
        assert_eq!(plain.dot_per_tick, 0.0);
    }

    #[test]
    fn test_base_stats_rates() {
        let model = PotencyDamage::default();
        let stats = StatSheet::default();
        assert_eq!(model.crit_rate(&stats), 0.05);
        assert_eq!(model.crit_multiplier(&stats), 1.4);
        assert_eq!(model.direct_hit_rate(&stats), 0.0);
    }
}
