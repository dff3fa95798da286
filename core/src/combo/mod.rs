//! Combo chains
//!
//! Several named chains can be open at once. Each ability declares, per chain
//! key, whether it starts, continues, breaks or explicitly preserves that
//! chain; undeclared chains follow the implicit rule (GCDs break, oGCDs
//! don't).

mod definition;
mod error;
mod resolver;


pub use definition::{ComboBehavior, ComboEntry, ComboKey};
pub use error::ComboError;
pub use resolver::{ComboResolution, ComboResolver, validate_entries};
