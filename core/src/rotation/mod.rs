//! Rotations and batch evaluation
//!
//! - **Rotation**: a strategy that drives a `CycleProcessor`
//! - **ScriptedRotation** / **PriorityRotation**: data-driven strategies
//! - **RotationBatchRunner**: evaluates rotations per stat sheet with a
//!   timing cache

mod priority;
mod runner;
mod scripted;
mod traits;

#[cfg(test)]
mod rotation_tests;

pub use priority::PriorityRotation;
pub use runner::{BatchOutcome, RotationBatchRunner, RotationResult, RunnerError, TimingCacheKey};
pub use scripted::ScriptedRotation;
pub use traits::Rotation;
