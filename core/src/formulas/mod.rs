//! Stat formulas
//!
//! The simulation only decides *when* abilities fire and under which
//! modifiers. Converting stats into times and damage goes through the traits
//! here so callers can plug in their own formulas.

mod damage;
mod timing;

pub use damage::{DamageModel, DamageResult, PotencyDamage};
pub use timing::{StandardTiming, TimingFormulas};
