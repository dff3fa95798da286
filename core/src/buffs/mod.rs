//! Buffs
//!
//! - **Definitions**: static `Buff` records with optional hooks
//! - **Engine**: the per-run active set, hook pipeline and effect folding

mod active;
mod definition;
mod engine;
mod handle;

#[cfg(test)]
mod engine_tests;

pub use active::ActiveBuff;
pub use definition::{AbilityPredicate, Buff, BuffEffects, BuffHook, BuffScope};
pub use engine::{BuffEngine, CombinedEffects};
pub use handle::BuffHandle;
