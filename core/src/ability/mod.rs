//! Ability data model
//!
//! - **Definitions**: immutable `Ability` records supplied by the caller
//! - **Capabilities**: narrow traits (`Timed`, `ComboParticipant`,
//!   `GaugeUpdatable`) that simulation components are written against

mod capabilities;
mod definition;

pub use capabilities::{ComboParticipant, GaugeUpdatable, Timed};
pub use definition::{
    Ability, AbilityId, AbilityKind, AttackType, CooldownSpec, DotSpec, ResourceDelta,
    STANDARD_GCD,
};
