//! Shared heap allocation wrapper.
//!
//! `Heap<T>` wraps `Arc<T>` with a crate-private constructor so that all
//! heap-backed payloads are created through `Value` factory methods (or the
//! expression constructors). External code cannot assemble a heap value by
//! hand, which keeps the allocation discipline in one place.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Reference-counted, immutable heap storage for value payloads.
///
/// # Thread Safety
/// Uses `Arc` internally, so payloads can be shared across renders running
/// on different threads. The payload itself is never mutated after
/// construction; `try_into_inner` is the only way to recover the buffer,
/// and it succeeds only while the reference is unique.
#[repr(transparent)]
pub struct Heap<T: ?Sized>(Arc<T>);

impl<T> Heap<T> {
    /// Create a new heap allocation wrapping the given payload.
    #[inline]
    pub(crate) fn new(value: T) -> Self {
        Heap(Arc::new(value))
    }

    /// Recover the payload if this is the only reference to it.
    ///
    /// Returns the original `Heap` unchanged on failure, so callers can
    /// fall back to cloning. Used by binary operators to reuse a temporary
    /// operand's buffer instead of allocating a fresh one.
    #[inline]
    pub fn try_into_inner(self) -> Result<T, Heap<T>> {
        Arc::try_unwrap(self.0).map_err(Heap)
    }
}

impl<T: ?Sized> Heap<T> {
    /// Check whether two handles point at the same allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> Clone for Heap<T> {
    #[inline]
    fn clone(&self) -> Self {
        Heap(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for Heap<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: fmt::Debug + ?Sized> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl<T: PartialEq + ?Sized> PartialEq for Heap<T> {
    fn eq(&self, other: &Self) -> bool {
        *self.0 == *other.0
    }
}
