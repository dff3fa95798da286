pub mod ability;
pub mod buffs;
pub mod catalog;
pub mod combo;
pub mod cooldowns;
pub mod error;
pub mod formulas;
pub mod rotation;
pub mod timeline;
pub mod worker;

// Re-exports for convenience
pub use ability::{Ability, AbilityId, AbilityKind, AttackType};
pub use buffs::{Buff, BuffEngine};
pub use catalog::{Catalog, ConfigError, SimConfig};
pub use combo::{ComboKey, ComboResolver};
pub use cooldowns::CooldownTracker;
pub use error::SimError;
pub use rotation::{Rotation, RotationBatchRunner};
pub use timeline::{CompletedRun, CycleProcessor};
