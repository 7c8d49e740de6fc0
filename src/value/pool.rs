//! Per-render value pool.
//!
//! The pool is an arena owned by one render context. Every value anchored
//! in it stays alive until the render completes, which is what makes
//! parent references sound: a subscript result records the pool handle of
//! its parent, and the pool keeps the parent (and transitively the whole
//! chain) alive without reference counting individual links.
//!
//! A render is single-threaded, so the pool uses plain interior
//! mutability. The pool is dropped together with its context.

use std::cell::RefCell;

use super::Value;

/// Handle to a value anchored in a [`Pool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueId(usize);

/// Arena anchoring values for the duration of one render.
#[derive(Debug, Default)]
pub struct Pool {
    slots: RefCell<Vec<Value>>,
}

impl Pool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Pool::default()
    }

    /// Anchor a value in the pool, returning its handle.
    pub fn hold(&self, value: Value) -> ValueId {
        let mut slots = self.slots.borrow_mut();
        let id = ValueId(slots.len());
        slots.push(value);
        id
    }

    /// Read back an anchored value.
    pub fn get(&self, id: ValueId) -> Option<Value> {
        self.slots.borrow().get(id.0).cloned()
    }

    /// Number of anchored values.
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Check whether the pool holds no values.
    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }
}
