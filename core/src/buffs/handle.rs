//! Handle passed to buff hooks

/// Lets a hook request changes to the buff it belongs to.
///
/// Requests are applied by the engine as soon as the hook returns.
#[derive(Debug, Clone, PartialEq)]
pub struct BuffHandle {
    stacks: Option<u32>,
    consumed: u32,
    removed: bool,
}

impl BuffHandle {
    pub(crate) fn new(stacks: Option<u32>) -> Self {
        Self {
            stacks,
            consumed: 0,
            removed: false,
        }
    }

    /// Stacks the buff had when the hook was invoked.
    pub fn stacks(&self) -> Option<u32> {
        self.stacks
    }

    /// Stacks left after the requests made so far.
    pub fn remaining_stacks(&self) -> Option<u32> {
        self.stacks.map(|s| s.saturating_sub(self.consumed))
    }

    pub fn consume_stack(&mut self) {
        self.subtract_stacks(1);
    }

    /// Take `count` stacks off. On a non-stacking buff this removes it.
    pub fn subtract_stacks(&mut self, count: u32) {
        if self.stacks.is_none() {
            self.removed = true;
            return;
        }
        self.consumed = self.consumed.saturating_add(count);
    }

    pub fn remove(&mut self) {
        self.removed = true;
    }

    /// Outcome of the hook: `None` if the buff is gone, else its new stacks.
    pub(crate) fn resolve(&self) -> Option<Option<u32>> {
        if self.removed {
            return None;
        }
        match self.remaining_stacks() {
            Some(0) => None,
            stacks => Some(stacks),
        }
    }
}
