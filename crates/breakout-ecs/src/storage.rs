//! Typed component tables.
//!
//! Each registered kind gets one [`ComponentStorage<T>`]: a slot vector
//! indexed by [`EntityId::index`](crate::entity::EntityId::index). The world
//! keeps the tables behind the [`Storage`] trait object so it can drop,
//! copy and hash slots without knowing the concrete type. No unsafe code is
//! involved; typed access goes through `Any` downcasts.

use std::any::Any;

use crate::component::Component;

// ---------------------------------------------------------------------------
// Storage trait
// ---------------------------------------------------------------------------

/// Type-erased operations the world needs on every table.
pub trait Storage: Send + Sync {
    /// Whether slot `index` holds a value.
    fn contains(&self, index: u32) -> bool;

    /// Drop the value in slot `index`, if any.
    fn remove(&mut self, index: u32);

    /// Clone slot `from` into slot `to`. Returns `false` if `from` is empty.
    fn copy_slot(&mut self, from: u32, to: u32) -> bool;

    /// Feed the serialized value of slot `index` into `hasher`.
    ///
    /// Returns `false` (and hashes nothing) when the slot is empty.
    fn hash_slot(&self, index: u32, hasher: &mut blake3::Hasher) -> bool;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// ---------------------------------------------------------------------------
// ComponentStorage
// ---------------------------------------------------------------------------

/// Slot vector holding every value of one component kind.
#[derive(Debug)]
pub struct ComponentStorage<T> {
    slots: Vec<Option<T>>,
}

impl<T> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T: Component> ComponentStorage<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `value` into slot `index`, returning the value it replaced.
    pub fn insert(&mut self, index: u32, value: T) -> Option<T> {
        let idx = index as usize;
        if idx >= self.slots.len() {
            self.slots.resize_with(idx + 1, || None);
        }
        self.slots[idx].replace(value)
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        self.slots.get(index as usize).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.slots.get_mut(index as usize).and_then(Option::as_mut)
    }

    pub fn take(&mut self, index: u32) -> Option<T> {
        self.slots.get_mut(index as usize).and_then(Option::take)
    }
}

impl<T: Component> Storage for ComponentStorage<T> {
    fn contains(&self, index: u32) -> bool {
        self.get(index).is_some()
    }

    fn remove(&mut self, index: u32) {
        self.take(index);
    }

    fn copy_slot(&mut self, from: u32, to: u32) -> bool {
        match self.get(from).cloned() {
            Some(value) => {
                self.insert(to, value);
                true
            }
            None => false,
        }
    }

    fn hash_slot(&self, index: u32, hasher: &mut blake3::Hasher) -> bool {
        let Some(value) = self.get(index) else {
            return false;
        };
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                hasher.update(&bytes);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "state hash: component failed to serialize");
                false
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
