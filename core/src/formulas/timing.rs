//! Recast and lock timing

use std::fmt;

use crate::ability::Timed;

/// Stat-to-time conversions used by the timeline.
pub trait TimingFormulas: Send + Sync + fmt::Debug {
    /// Actual GCD length for a nominal `base` recast at the given speed stat
    /// value and haste percentage.
    fn gcd_time(&self, base: f64, speed: u32, haste: f64) -> f64;

    /// Speed-reduced cooldown for a nominal `base` recast.
    fn cooldown_time(&self, base: f64, speed: u32) -> f64;

    /// Animation lock of an action.
    fn animation_lock(&self, ability: &dyn Timed) -> f64;

    /// Extra lock after a cast bar completes.
    fn caster_tax(&self) -> f64;
}

/// Level-scaled reference formulas.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardTiming {
    /// Level base value for substats
    pub level_sub: i64,
    /// Level divisor
    pub level_div: i64,
    pub default_lock: f64,
    pub caster_tax: f64,
}

impl Default for StandardTiming {
    fn default() -> Self {
        Self::for_level(100)
    }
}

impl StandardTiming {
    pub fn for_level(level: u32) -> Self {
        let (level_sub, level_div) = match level {
            ..=80 => (380, 3300),
            81..=90 => (400, 1900),
            _ => (420, 2780),
        };
        Self {
            level_sub,
            level_div,
            default_lock: 0.6,
            caster_tax: 0.1,
        }
    }

    /// Per-mille reduction granted by a speed stat value.
    fn speed_modifier(&self, speed: u32) -> i64 {
        (130 * (i64::from(speed) - self.level_sub)).div_euclid(self.level_div)
    }

    /// Speed-scaled recast in milliseconds, before haste.
    fn scaled_ms(&self, base: f64, speed: u32) -> i64 {
        let base_ms = (base * 1000.0).round() as i64;
        ((1000 - self.speed_modifier(speed)) * base_ms).div_euclid(1000)
    }
}

impl TimingFormulas for StandardTiming {
    fn gcd_time(&self, base: f64, speed: u32, haste: f64) -> f64 {
        let gcd_ms = self.scaled_ms(base, speed) as f64;
        let hasted = (gcd_ms * (100.0 - haste) / 100.0).floor();
        (hasted / 10.0).floor() / 100.0
    }

    fn cooldown_time(&self, base: f64, speed: u32) -> f64 {
        self.gcd_time(base, speed, 0.0)
    }

    fn animation_lock(&self, ability: &dyn Timed) -> f64 {
        ability.animation_lock_override().unwrap_or(self.default_lock)
    }

    fn caster_tax(&self) -> f64 {
        self.caster_tax
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::Ability;

    #[test]
    fn test_base_speed_keeps_nominal_gcd() {
        let timing = StandardTiming::default();
        assert_eq!(timing.gcd_time(2.5, 420, 0.0), 2.5);
        assert_eq!(timing.gcd_time(2.8, 420, 0.0), 2.8);
    }

    #[test]
    fn test_speed_shortens_gcd() {
        let timing = StandardTiming::default();
        // floor(130 * 580 / 2780) = 27 → floor(973 * 2500 / 1000) = 2432 ms
        assert_eq!(timing.gcd_time(2.5, 1000, 0.0), 2.43);
    }

    #[test]
    fn test_haste_applies_after_speed() {
        let timing = StandardTiming::default();
        // 2500 * 0.87 = 2175 → 2.17
        assert_eq!(timing.gcd_time(2.5, 420, 13.0), 2.17);
    }

    #[test]
    fn test_animation_lock_override() {
        let timing = StandardTiming::default();
        let mut ability = Ability::ogcd(1, "Jump", Some(100.0));
        assert_eq!(timing.animation_lock(&ability), 0.6);
        ability.animation_lock = Some(0.8);
        assert_eq!(timing.animation_lock(&ability), 0.8);
    }
}
