//! Cooldown and charge tracking
//!
//! Abilities either own their charge pool or declare that they share the pool
//! of a canonical origin ability. Both read and write the same pool, so their
//! reported status is always identical.

mod error;
mod tracker;


pub use error::CooldownError;
pub use tracker::{CooldownStatus, CooldownTracker, TimeRef};
