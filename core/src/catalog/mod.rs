//! TOML simulation catalogs
//!
//! - **config**: serde types for the on-disk format (also carried by worker
//!   requests)
//! - **compile**: validation and conversion into abilities, buffs and
//!   rotations

mod compile;
mod config;
mod error;


pub use compile::Catalog;
pub use config::{
    AbilityConfig, AttackTypeConfig, BuffConfig, ComboBehaviorConfig, ComboConfig,
    CooldownConfig, DotConfig, HookSpec, KindConfig, PermutationFile, ResourceConfig,
    ResourceDeltaConfig, RotationConfig, ScopeConfig, SimConfig, default_config_path,
    load_config, load_permutations,
};
pub use error::ConfigError;
