//! Fixed-sequence rotations

use super::Rotation;
use crate::ability::Ability;
use crate::error::SimError;
use crate::timeline::{CycleProcessor, Gauge, UseOutcome};

/// Plays `opener` once, then loops `cycle` until the window is exhausted.
///
/// GCDs on cooldown are waited for; oGCDs that are not ready are skipped.
#[derive(Debug, Clone)]
pub struct ScriptedRotation {
    pub name: String,
    pub opener: Vec<Ability>,
    pub cycle: Vec<Ability>,
}

impl ScriptedRotation {
    pub fn new(name: impl Into<String>, opener: Vec<Ability>, cycle: Vec<Ability>) -> Self {
        Self {
            name: name.into(),
            opener,
            cycle,
        }
    }

    fn play<G: Gauge>(cp: &mut CycleProcessor<G>, ability: &Ability) -> Result<UseOutcome, SimError> {
        if ability.is_gcd() {
            let press = cp.next_gcd_press();
            let status = cp.cooldown_status_at(ability, press);
            if !status.ready_to_use {
                cp.advance_to(status.ready_at.absolute);
            }
            return cp.use_gcd(ability);
        }

        let outcome = cp.use_ogcd(ability)?;
        if let UseOutcome::NotReady { ready_at } = outcome {
            tracing::trace!(ability = %ability.name, ready_at, "Skipping oGCD on cooldown");
        }
        Ok(outcome)
    }
}

impl<G: Gauge> Rotation<G> for ScriptedRotation {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, cp: &mut CycleProcessor<G>) -> Result<(), SimError> {
        for ability in &self.opener {
            if Self::play(cp, ability)? == UseOutcome::TimeExpired {
                return Ok(());
            }
        }

        if self.cycle.is_empty() {
            return Ok(());
        }

        cp.remaining_cycles(|cp| {
            for ability in &self.cycle {
                if Self::play(cp, ability)? == UseOutcome::TimeExpired {
                    break;
                }
            }
            Ok(())
        })?;
        Ok(())
    }
}
