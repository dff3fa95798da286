//! Combo declarations attached to abilities

use std::borrow::Cow;
use std::fmt;

use crate::ability::AbilityId;

/// Identifier of one combo chain.
///
/// Most abilities use the implicit default chain. The reserved `all` key can
/// only be used with `Break`/`NoBreak` and targets every open chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComboKey(Cow<'static, str>);

impl ComboKey {
    pub const DEFAULT: ComboKey = ComboKey(Cow::Borrowed("default"));
    pub const ALL: ComboKey = ComboKey(Cow::Borrowed("all"));

    pub fn named(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }

    pub fn is_all(&self) -> bool {
        *self == Self::ALL
    }
}

impl Default for ComboKey {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for ComboKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What using an ability does to a chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ComboBehavior {
    /// Open the chain with this ability as head
    Start,
    /// Advance the chain if its head is one of `from`, applying `potency`
    Continue { from: Vec<AbilityId>, potency: f64 },
    /// Close the chain
    Break,
    /// Leave the chain untouched
    NoBreak,
}

impl ComboBehavior {
    pub fn continues_from(from: impl IntoIterator<Item = AbilityId>, potency: f64) -> Self {
        Self::Continue {
            from: from.into_iter().collect(),
            potency,
        }
    }
}

/// One combo declaration of an ability.
#[derive(Debug, Clone, PartialEq)]
pub struct ComboEntry {
    pub key: ComboKey,
    pub behavior: ComboBehavior,
}

impl ComboEntry {
    pub fn new(key: ComboKey, behavior: ComboBehavior) -> Self {
        Self { key, behavior }
    }

    /// Entry on the default chain
    pub fn main(behavior: ComboBehavior) -> Self {
        Self::new(ComboKey::DEFAULT, behavior)
    }
}
