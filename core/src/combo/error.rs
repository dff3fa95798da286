//! Error types for combo resolution

use thiserror::Error;

use crate::ability::AbilityId;

/// Errors raised while resolving combo declarations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ComboError {
    #[error("ambiguous combo specification on ability {ability}: {reason}")]
    Ambiguous { ability: AbilityId, reason: String },
}
