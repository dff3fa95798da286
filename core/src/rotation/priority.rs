//! Priority-list rotations

use super::Rotation;
use crate::ability::Ability;
use crate::error::SimError;
use crate::timeline::{CycleProcessor, Gauge};

/// Upper bound on oGCDs woven into one GCD slot.
const MAX_WEAVES: usize = 4;

/// Each GCD slot takes the first ready, affordable GCD in priority order, then
/// weaves ready oGCDs while they fit without clipping.
#[derive(Debug, Clone)]
pub struct PriorityRotation {
    pub name: String,
    pub gcds: Vec<Ability>,
    pub ogcds: Vec<Ability>,
}

impl PriorityRotation {
    pub fn new(name: impl Into<String>, gcds: Vec<Ability>, ogcds: Vec<Ability>) -> Self {
        Self {
            name: name.into(),
            gcds,
            ogcds,
        }
    }

    fn pick_gcd<G: Gauge>(&self, cp: &CycleProcessor<G>, press: f64) -> Option<&Ability> {
        self.gcds.iter().find(|ability| {
            cp.cooldown_status_at(ability, press).ready_to_use && cp.gauge().can_pay(*ability)
        })
    }

    /// Earliest time after `press` at which any GCD comes off cooldown.
    fn next_gcd_ready<G: Gauge>(&self, cp: &CycleProcessor<G>, press: f64) -> Option<f64> {
        self.gcds
            .iter()
            .map(|ability| cp.cooldown_status_at(ability, press).ready_at.absolute)
            .filter(|&ready_at| ready_at > press)
            .min_by(f64::total_cmp)
    }

    fn weave<G: Gauge>(&self, cp: &mut CycleProcessor<G>) -> Result<(), SimError> {
        for _ in 0..MAX_WEAVES {
            let next = self
                .ogcds
                .iter()
                .find(|ability| cp.can_use_without_clipping(ability) && cp.gauge().can_pay(*ability));
            let Some(ability) = next else {
                break;
            };
            if !cp.use_ogcd(ability)?.was_used() {
                break;
            }
        }
        Ok(())
    }
}

impl<G: Gauge> Rotation<G> for PriorityRotation {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, cp: &mut CycleProcessor<G>) -> Result<(), SimError> {
        cp.remaining_cycles(|cp| {
            let press = cp.next_gcd_press();
            match self.pick_gcd(cp, press) {
                Some(ability) => {
                    cp.use_gcd(ability)?;
                }
                None => match self.next_gcd_ready(cp, press) {
                    Some(ready_at) => cp.advance_to(ready_at),
                    None => {
                        tracing::debug!(rotation = %self.name, time = press, "No usable GCD");
                    }
                },
            }

            if !cp.is_finished() {
                self.weave(cp)?;
            }
            Ok(())
        })?;
        Ok(())
    }
}
