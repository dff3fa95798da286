//! Error types for cooldown operations

use thiserror::Error;

/// Errors raised by the cooldown tracker
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CooldownError {
    #[error("{ability} used at {at:.2}s with no charges remaining (next charge at {ready_at:.2}s)")]
    NoChargesRemaining {
        ability: String,
        at: f64,
        ready_at: f64,
    },
}
