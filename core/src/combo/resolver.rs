//! Combo chain resolution
//!
//! All chains, the default one included, live in a single key → head map so
//! every use goes through one code path. Resolution first evaluates every
//! open chain against the ability's declarations, then opens the chains the
//! ability starts.

use std::collections::HashMap;

use super::{ComboBehavior, ComboEntry, ComboError, ComboKey};
use crate::ability::{AbilityId, AbilityKind, ComboParticipant};

/// Outcome of resolving one ability use.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComboResolution {
    /// Potency to apply: the primary continue override if it fired, else base
    pub potency: Option<f64>,
    /// Primary chain key, if its continue fired
    pub continued: Option<ComboKey>,
    /// Chains opened (or reopened) by this use
    pub opened: Vec<ComboKey>,
    /// Chains closed by this use
    pub closed: Vec<ComboKey>,
}

/// Behavior that applies to one open chain after precedence rules.
#[derive(Debug, Clone, Copy)]
enum Effective<'a> {
    Continue { from: &'a [AbilityId], potency: f64 },
    Break,
    NoBreak,
    /// Nothing declared: GCDs end the chain, oGCDs leave it alone
    Implicit,
}

/// Pick the behavior that applies to `key`.
///
/// Key-specific declarations win over `all`, and `NoBreak` wins over
/// `Break` within the same key.
fn effective_for<'a>(key: &ComboKey, entries: &'a [ComboEntry]) -> Effective<'a> {
    let explicit = || entries.iter().filter(move |e| &e.key == key).map(|e| &e.behavior);

    if explicit().any(|b| matches!(b, ComboBehavior::NoBreak)) {
        return Effective::NoBreak;
    }
    if let Some(ComboBehavior::Continue { from, potency }) =
        explicit().find(|b| matches!(b, ComboBehavior::Continue { .. }))
    {
        return Effective::Continue {
            from,
            potency: *potency,
        };
    }
    if explicit().any(|b| matches!(b, ComboBehavior::Break)) {
        return Effective::Break;
    }

    let all = || entries.iter().filter(|e| e.key.is_all()).map(|e| &e.behavior);
    if all().any(|b| matches!(b, ComboBehavior::NoBreak)) {
        return Effective::NoBreak;
    }
    if all().any(|b| matches!(b, ComboBehavior::Break)) {
        return Effective::Break;
    }

    Effective::Implicit
}

/// Reject declarations whose meaning is ambiguous.
pub fn validate_entries(ability: AbilityId, entries: &[ComboEntry]) -> Result<(), ComboError> {
    let mut continue_keys: Vec<&ComboKey> = Vec::new();

    for entry in entries {
        match &entry.behavior {
            ComboBehavior::Start | ComboBehavior::Continue { .. } if entry.key.is_all() => {
                return Err(ComboError::Ambiguous {
                    ability,
                    reason: "start/continue cannot target the reserved 'all' chain".to_string(),
                });
            }
            ComboBehavior::Continue { from, .. } => {
                if from.is_empty() {
                    return Err(ComboError::Ambiguous {
                        ability,
                        reason: format!("continue on chain '{}' has no prior abilities", entry.key),
                    });
                }
                if continue_keys.contains(&&entry.key) {
                    return Err(ComboError::Ambiguous {
                        ability,
                        reason: format!("multiple continue entries on chain '{}'", entry.key),
                    });
                }
                continue_keys.push(&entry.key);
            }
            _ => {}
        }
    }
    Ok(())
}

/// Per-run combo state.
#[derive(Debug, Clone)]
pub struct ComboResolver {
    /// Chain key → current head (None = no open chain)
    chains: HashMap<ComboKey, Option<AbilityId>>,
}

impl Default for ComboResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ComboResolver {
    pub fn new() -> Self {
        let mut chains = HashMap::new();
        chains.insert(ComboKey::DEFAULT, None);
        Self { chains }
    }

    /// Current head of a chain, if it is open.
    pub fn head(&self, key: &ComboKey) -> Option<AbilityId> {
        self.chains.get(key).copied().flatten()
    }

    /// Keys of currently open chains, sorted for deterministic iteration.
    pub fn open_chains(&self) -> Vec<ComboKey> {
        let mut keys: Vec<ComboKey> = self
            .chains
            .iter()
            .filter(|(_, head)| head.is_some())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Resolve the combo effects of using `ability` and update chain state.
    pub fn resolve<A>(&mut self, ability: &A) -> Result<ComboResolution, ComboError>
    where
        A: ComboParticipant + ?Sized,
    {
        let id = ability.ability_id();
        let entries = ability.combo_entries();
        validate_entries(id, entries)?;

        let mut resolution = ComboResolution::default();
        let mut fired: Vec<(ComboKey, f64)> = Vec::new();

        for key in self.open_chains() {
            let Some(head) = self.head(&key) else {
                continue;
            };

            let closes = match effective_for(&key, entries) {
                Effective::Continue { from, potency } => {
                    if from.contains(&head) {
                        self.chains.insert(key.clone(), Some(id));
                        fired.push((key.clone(), potency));
                        false
                    } else {
                        true
                    }
                }
                Effective::Break => true,
                Effective::NoBreak => false,
                Effective::Implicit => ability.ability_kind() == AbilityKind::Gcd,
            };

            if closes {
                self.chains.insert(key.clone(), None);
                resolution.closed.push(key);
            }
        }

        for entry in entries {
            if matches!(entry.behavior, ComboBehavior::Start) {
                self.chains.insert(entry.key.clone(), Some(id));
                resolution.opened.push(entry.key.clone());
            }
        }

        let primary = entries.iter().find_map(|e| match e.behavior {
            ComboBehavior::Continue { .. } => Some(&e.key),
            _ => None,
        });

        resolution.potency = ability.base_potency();
        if let Some(primary) = primary
            && let Some((key, potency)) = fired.iter().find(|(key, _)| key == primary)
        {
            resolution.potency = Some(*potency);
            resolution.continued = Some(key.clone());
        }

        tracing::trace!(
            ability = id,
            opened = ?resolution.opened,
            closed = ?resolution.closed,
            continued = ?resolution.continued,
            "Resolved combo"
        );
        Ok(resolution)
    }

    /// Close every chain.
    pub fn reset(&mut self) {
        for head in self.chains.values_mut() {
            *head = None;
        }
    }
}
