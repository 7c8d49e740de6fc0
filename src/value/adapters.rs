//! List and map adapters.
//!
//! Adapters are lightweight value wrappers over in-memory containers. A
//! list adapter is either materialized (backed by a vector) or generated
//! (an index-to-value function with a known length, used by `range` to
//! avoid materializing large sequences). Both shapes answer `len`, `get`,
//! and iteration uniformly. Adapters are read-only once constructed.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::heap::Heap;
use super::Value;

/// Element generator for lazily produced lists.
#[derive(Clone)]
pub struct GeneratedList {
    len: usize,
    item: Arc<dyn Fn(usize) -> Value + Send + Sync>,
}

impl GeneratedList {
    pub(crate) fn new(len: usize, item: impl Fn(usize) -> Value + Send + Sync + 'static) -> Self {
        GeneratedList {
            len,
            item: Arc::new(item),
        }
    }
}

impl fmt::Debug for GeneratedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedList").field("len", &self.len).finish()
    }
}

/// An ordered, indexable sequence of values.
#[derive(Clone, Debug)]
pub enum ListAdapter {
    /// Vector-backed sequence.
    Materialized(Heap<Vec<Value>>),
    /// Sequence produced on demand from an index.
    Generated(GeneratedList),
}

impl ListAdapter {
    /// Create a materialized list from a vector of values.
    #[inline]
    pub(crate) fn materialized(items: Vec<Value>) -> Self {
        ListAdapter::Materialized(Heap::new(items))
    }

    /// Create a generated list from a length and an element function.
    #[inline]
    pub(crate) fn generated(
        len: usize,
        item: impl Fn(usize) -> Value + Send + Sync + 'static,
    ) -> Self {
        ListAdapter::Generated(GeneratedList::new(len, item))
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            ListAdapter::Materialized(items) => items.len(),
            ListAdapter::Generated(g) => g.len,
        }
    }

    /// Check whether the sequence has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the element at `idx`, or `None` when out of range.
    pub fn get(&self, idx: usize) -> Option<Value> {
        match self {
            ListAdapter::Materialized(items) => items.get(idx).cloned(),
            ListAdapter::Generated(g) => (idx < g.len).then(|| (g.item)(idx)),
        }
    }

    /// Iterate over the elements by value.
    pub fn iter(&self) -> Box<dyn Iterator<Item = Value> + '_> {
        match self {
            ListAdapter::Materialized(items) => Box::new(items.iter().cloned()),
            ListAdapter::Generated(g) => Box::new((0..g.len).map(move |i| (g.item)(i))),
        }
    }

    /// Structural element-wise equality.
    pub fn equals(&self, other: &ListAdapter) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a.equals(&b))
    }
}

/// A mapping from string keys to values.
#[derive(Clone, Debug)]
pub struct MapAdapter(Heap<FxHashMap<String, Value>>);

impl MapAdapter {
    #[inline]
    pub(crate) fn new(entries: FxHashMap<String, Value>) -> Self {
        MapAdapter(Heap::new(entries))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Get the value bound to `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.get(key).cloned()
    }

    /// Enumerate the keys. Order is unspecified; callers that need a
    /// stable order sort the result.
    pub fn keys(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    /// Iterate over the entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Structural equality over keys and values.
    pub fn equals(&self, other: &MapAdapter) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| v.equals(&o)))
    }
}
