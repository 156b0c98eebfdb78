//! Load-once cache keyed by circuit kind.
//!
//! Each kind has its own lock, so loading one kind never blocks another. A
//! failed load leaves the slot empty and the next caller retries.

use std::sync::{Arc, Mutex};

use crate::inputs::CircuitKind;

pub struct KindCache<T> {
    slots: [Mutex<Option<Arc<T>>>; 2],
}

impl<T> KindCache<T> {
    pub fn new() -> Self {
        Self {
            slots: [Mutex::new(None), Mutex::new(None)],
        }
    }

    /// Return the cached value for `kind`, running `load` under the slot's
    /// lock if there is none yet.
    pub fn get_or_try_load<E>(
        &self,
        kind: CircuitKind,
        load: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, E> {
        let mut slot = self.slots[kind.index()]
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(value) = slot.as_ref() {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(load()?);
        *slot = Some(Arc::clone(&value));
        Ok(value)
    }

    pub fn get(&self, kind: CircuitKind) -> Option<Arc<T>> {
        self.slots[kind.index()]
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl<T> Default for KindCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
