//! Capability traits
//!
//! Components only ask for the slice of an ability they actually consume, so a
//! job can back its abilities with its own type as long as it implements the
//! capabilities a given component needs.

use super::{Ability, AbilityId, AbilityKind, ResourceDelta};
use crate::combo::ComboEntry;

/// Timing parameters of an action.
pub trait Timed {
    /// Nominal recast length before speed scaling
    fn recast(&self) -> f64;
    fn cast_time(&self) -> f64;
    /// Whether the recast ignores speed stats and haste
    fn is_fixed_recast(&self) -> bool;
    /// Explicit animation lock, if the action overrides the default
    fn animation_lock_override(&self) -> Option<f64>;
}

/// Participation in combo chains.
pub trait ComboParticipant {
    fn ability_id(&self) -> AbilityId;
    fn ability_kind(&self) -> AbilityKind;
    fn base_potency(&self) -> Option<f64>;
    fn combo_entries(&self) -> &[ComboEntry];
}

/// Effect of an action on a job gauge.
pub trait GaugeUpdatable {
    fn resource_deltas(&self) -> &[ResourceDelta];
}

impl Timed for Ability {
    fn recast(&self) -> f64 {
        self.gcd
    }

    fn cast_time(&self) -> f64 {
        self.cast_time
    }

    fn is_fixed_recast(&self) -> bool {
        self.fixed_gcd
    }

    fn animation_lock_override(&self) -> Option<f64> {
        self.animation_lock
    }
}

impl ComboParticipant for Ability {
    fn ability_id(&self) -> AbilityId {
        self.id
    }

    fn ability_kind(&self) -> AbilityKind {
        self.kind
    }

    fn base_potency(&self) -> Option<f64> {
        self.potency
    }

    fn combo_entries(&self) -> &[ComboEntry] {
        &self.combos
    }
}

impl GaugeUpdatable for Ability {
    fn resource_deltas(&self) -> &[ResourceDelta] {
        &self.resources
    }
}
