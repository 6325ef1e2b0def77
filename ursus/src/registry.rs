//! Pending handlers keyed by action id.
//!
//! The channel keeps two of these: one for one-shot poke handlers and one
//! for multi-shot subscribe handlers. Which entries are evicted on which
//! events is decided by the channel; the registry only stores them.

use std::collections::BTreeMap;

use crate::id::ActionId;

/// Map from action id to a pending handler.
pub struct HandlerRegistry<H> {
    handlers: BTreeMap<ActionId, H>,
}

impl<H> HandlerRegistry<H> {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Store a handler. An existing handler under the same id is replaced.
    pub fn register(&mut self, id: ActionId, handler: H) {
        if self.handlers.insert(id, handler).is_some() {
            tracing::warn!(action_id = %id, "replaced a pending handler with a reused action id");
        }
    }

    /// Remove and return the handler for `id`.
    pub fn take(&mut self, id: ActionId) -> Option<H> {
        self.handlers.remove(&id)
    }

    /// Borrow the handler for `id` without removing it.
    pub fn peek(&mut self, id: ActionId) -> Option<&mut H> {
        self.handlers.get_mut(&id)
    }

    /// Remove every handler, returning them in action id order.
    pub fn drain_all(&mut self) -> Vec<H> {
        core::mem::take(&mut self.handlers).into_values().collect()
    }

    /// Whether a handler is registered for `id`.
    #[must_use]
    pub fn contains(&self, id: ActionId) -> bool {
        self.handlers.contains_key(&id)
    }

    /// Number of pending handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handlers are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<H> Default for HandlerRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> core::fmt::Debug for HandlerRegistry<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("pending", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
