//! Error types for config loading and catalog compilation

use std::path::PathBuf;

use thiserror::Error;

use crate::ability::AbilityId;
use crate::combo::ComboError;

/// Errors during config loading and catalog compilation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML in {path}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("duplicate ability id {id}")]
    DuplicateAbility { id: AbilityId },

    #[error("duplicate buff '{name}'")]
    DuplicateBuff { name: String },

    #[error("duplicate gauge resource '{name}'")]
    DuplicateResource { name: String },

    #[error("{context} references unknown ability {id}")]
    UnknownAbility { context: String, id: AbilityId },

    #[error("ability {ability} activates unknown buff '{buff}'")]
    UnknownBuff { ability: AbilityId, buff: String },

    #[error("ability {ability} uses unknown gauge resource '{resource}'")]
    UnknownResource { ability: AbilityId, resource: String },

    #[error("ability {ability} cannot share the cooldown of ability {origin}: {reason}")]
    SharedCooldownMismatch {
        ability: AbilityId,
        origin: AbilityId,
        reason: String,
    },

    #[error("ability {ability}: continue entry needs a potency")]
    MissingComboPotency { ability: AbilityId },

    #[error("invalid combo declaration")]
    Combo(#[from] ComboError),

    #[error("invalid value in {context}: {reason}")]
    InvalidValue { context: String, reason: String },
}
