//! The rotation seam

use crate::error::SimError;
use crate::timeline::{CycleProcessor, Gauge};

/// A strategy that drives one processor until the window is exhausted.
pub trait Rotation<G: Gauge>: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, cp: &mut CycleProcessor<G>) -> Result<(), SimError>;
}
