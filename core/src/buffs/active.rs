//! Per-run buff instances

use std::sync::Arc;

use super::Buff;

/// A buff currently applied during a run.
#[derive(Debug, Clone)]
pub struct ActiveBuff {
    pub buff: Arc<Buff>,
    pub applied_at: f64,
    /// None = active until removed
    pub expires_at: Option<f64>,
    /// Remaining stacks (None = non-stacking)
    pub stacks: Option<u32>,
}

impl ActiveBuff {
    pub fn new(buff: Arc<Buff>, now: f64) -> Self {
        let expires_at = buff.duration.map(|d| now + d);
        let stacks = buff.stacks;
        Self {
            buff,
            applied_at: now,
            expires_at,
            stacks,
        }
    }

    pub fn name(&self) -> &str {
        &self.buff.name
    }

    /// Still running at `at`. A buff expiring exactly at `at` is gone.
    pub fn is_active_at(&self, at: f64) -> bool {
        self.expires_at.is_none_or(|expires| at < expires)
    }

    /// Seconds left at `at` (None = permanent)
    pub fn remaining(&self, at: f64) -> Option<f64> {
        self.expires_at.map(|expires| (expires - at).max(0.0))
    }

    /// Refresh after re-activation at `now`.
    ///
    /// Buffs with a `max_duration` extend their current expiry, capped at
    /// `now + max_duration`; all others restart their duration.
    pub(crate) fn refresh(&mut self, now: f64) {
        self.expires_at = match (self.buff.duration, self.buff.max_duration) {
            (None, _) => None,
            (Some(duration), Some(max)) => {
                let current = self.expires_at.unwrap_or(now).max(now);
                Some((current + duration).min(now + max))
            }
            (Some(duration), None) => Some(now + duration),
        };
        self.applied_at = now;
        self.stacks = self.buff.stacks;
    }
}
