//! Runtime values for the expression core.
//!
//! # Heap Enforcement
//!
//! All heap allocations go through factory methods on `Value`. The
//! `Heap<T>` wrapper has a crate-private constructor, so external code
//! cannot create heap payloads directly:
//!
//! ```text
//! let s = Value::string("hello");          // OK
//! let list = Value::list(vec![]);          // OK
//! let s = ValueData::Str(Heap::new(...));  // ERROR: Heap::new is private
//! ```
//!
//! # Lifetime Metadata
//!
//! Besides its payload, every value carries a `temporary` flag (the value
//! was just computed and owns no shared storage, so an operator may
//! reclaim its buffer) and an optional parent handle (the value is a view
//! or element of another value anchored in the render pool, which must
//! stay alive at least as long as this one).

mod adapters;
mod callable;
mod convert;
mod heap;
mod pool;
mod target;


use std::fmt::Write as _;

use rustc_hash::FxHashMap;

pub use adapters::{GeneratedList, ListAdapter, MapAdapter};
pub use callable::{
    Callable, CallableBody, CallableKind, ExpressionCallable, SpecialFn, StatementCallable,
};
pub use convert::{convert_to_bool, convert_to_int};
pub(crate) use convert::as_number;
pub use heap::Heap;
pub use pool::{Pool, ValueId};
pub use target::TargetString;

/// A view into a shared narrow string.
#[derive(Clone, Debug)]
pub struct StrView {
    source: Heap<String>,
    start: usize,
    len: usize,
}

impl StrView {
    /// The viewed slice.
    pub fn as_str(&self) -> &str {
        &self.source[self.start..self.start + self.len]
    }
}

/// A view into a shared wide string.
#[derive(Clone, Debug)]
pub struct WideView {
    source: Heap<Vec<char>>,
    start: usize,
    len: usize,
}

impl WideView {
    /// The viewed slice.
    pub fn as_slice(&self) -> &[char] {
        &self.source[self.start..self.start + self.len]
    }
}

/// The payload of a [`Value`].
#[derive(Clone, Debug)]
pub enum ValueData {
    /// No value. Unknown names, failed operations, and absent defaults
    /// all evaluate to this.
    Empty,
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Int(i64),
    /// Double-precision float.
    Double(f64),
    /// Narrow (UTF-8) string.
    Str(Heap<String>),
    /// Wide string, one `char` per code point.
    Wide(Heap<Vec<char>>),
    /// View into a shared narrow string.
    StrView(StrView),
    /// View into a shared wide string.
    WideView(WideView),
    /// Ordered sequence.
    List(ListAdapter),
    /// String-keyed mapping.
    Map(MapAdapter),
    /// Invocable callable.
    Callable(Callable),
    /// Output string of renderer-determined width.
    Target(Heap<TargetString>),
}

/// A runtime value: payload plus lifetime metadata.
#[derive(Clone, Debug)]
pub struct Value {
    data: ValueData,
    temporary: bool,
    parent: Option<ValueId>,
}

/// A borrowed string payload, width preserved.
#[derive(Clone, Copy, Debug)]
pub(crate) enum StringSlice<'a> {
    Narrow(&'a str),
    Wide(&'a [char]),
}

// Factory methods

impl Value {
    fn from_data(data: ValueData) -> Self {
        Value {
            data,
            temporary: false,
            parent: None,
        }
    }

    /// Create the empty value.
    #[inline]
    pub fn empty() -> Self {
        Value::from_data(ValueData::Empty)
    }

    /// Create a boolean value.
    #[inline]
    pub fn boolean(b: bool) -> Self {
        Value::from_data(ValueData::Bool(b))
    }

    /// Create an integer value.
    #[inline]
    pub fn int(n: i64) -> Self {
        Value::from_data(ValueData::Int(n))
    }

    /// Create a double value.
    #[inline]
    pub fn double(d: f64) -> Self {
        Value::from_data(ValueData::Double(d))
    }

    /// Create a narrow string value.
    #[inline]
    pub fn string(s: impl Into<String>) -> Self {
        Value::from_data(ValueData::Str(Heap::new(s.into())))
    }

    /// Create a wide string value.
    #[inline]
    pub fn wide(chars: Vec<char>) -> Self {
        Value::from_data(ValueData::Wide(Heap::new(chars)))
    }

    /// Create a view into this value's narrow string payload.
    ///
    /// Returns `None` when the value is not a narrow string or the range
    /// does not fall on character boundaries within it.
    pub fn str_view_of(&self, start: usize, len: usize) -> Option<Value> {
        let source = match &self.data {
            ValueData::Str(h) => h.clone(),
            ValueData::StrView(v) => v.source.clone(),
            _ => return None,
        };
        let end = start.checked_add(len)?;
        if end > source.len() || !source.is_char_boundary(start) || !source.is_char_boundary(end) {
            return None;
        }
        Some(Value::from_data(ValueData::StrView(StrView {
            source,
            start,
            len,
        })))
    }

    /// Create a view into this value's wide string payload.
    pub fn wide_view_of(&self, start: usize, len: usize) -> Option<Value> {
        let source = match &self.data {
            ValueData::Wide(h) => h.clone(),
            ValueData::WideView(v) => v.source.clone(),
            _ => return None,
        };
        let end = start.checked_add(len)?;
        if end > source.len() {
            return None;
        }
        Some(Value::from_data(ValueData::WideView(WideView {
            source,
            start,
            len,
        })))
    }

    /// Create a materialized list value.
    #[inline]
    pub fn list(items: Vec<Value>) -> Self {
        Value::from_data(ValueData::List(ListAdapter::materialized(items)))
    }

    /// Create a generated list value from a length and an element function.
    #[inline]
    pub fn generated_list(
        len: usize,
        item: impl Fn(usize) -> Value + Send + Sync + 'static,
    ) -> Self {
        Value::from_data(ValueData::List(ListAdapter::generated(len, item)))
    }

    /// Create a list value from an existing adapter.
    #[inline]
    pub fn list_adapter(adapter: ListAdapter) -> Self {
        Value::from_data(ValueData::List(adapter))
    }

    /// Create a map value.
    #[inline]
    pub fn map(entries: FxHashMap<String, Value>) -> Self {
        Value::from_data(ValueData::Map(MapAdapter::new(entries)))
    }

    /// Create a callable value.
    #[inline]
    pub fn callable(callable: Callable) -> Self {
        Value::from_data(ValueData::Callable(callable))
    }

    /// Create a target-string value.
    #[inline]
    pub fn target(target: TargetString) -> Self {
        Value::from_data(ValueData::Target(Heap::new(target)))
    }
}

// Lifetime metadata

impl Value {
    /// The payload.
    #[inline]
    pub fn data(&self) -> &ValueData {
        &self.data
    }

    /// Consume the value, keeping only the payload.
    #[inline]
    pub(crate) fn into_data(self) -> ValueData {
        self.data
    }

    /// Whether this value was computed and owns no shared storage.
    #[inline]
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// Mark or unmark the value as temporary.
    #[inline]
    pub fn set_temporary(&mut self, temporary: bool) {
        self.temporary = temporary;
    }

    /// Builder form of [`set_temporary`](Value::set_temporary).
    #[inline]
    #[must_use]
    pub fn with_temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    /// The pool handle of this value's parent, if any.
    #[inline]
    pub fn parent(&self) -> Option<ValueId> {
        self.parent
    }

    /// Record the parent this value was extracted from.
    #[inline]
    pub fn set_parent(&mut self, parent: ValueId) {
        self.parent = Some(parent);
    }

    /// Whether the value references shared or view data, so that a child
    /// extracted from it must keep it alive.
    pub fn should_extend_lifetime(&self) -> bool {
        matches!(
            self.data,
            ValueData::Str(_)
                | ValueData::Wide(_)
                | ValueData::StrView(_)
                | ValueData::WideView(_)
                | ValueData::List(_)
                | ValueData::Map(_)
                | ValueData::Target(_)
        )
    }
}

// Queries

impl Value {
    /// Check for the empty value.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self.data, ValueData::Empty)
    }

    /// The narrow string payload, if the value has one.
    pub fn as_narrow(&self) -> Option<&str> {
        match &self.data {
            ValueData::Str(s) => Some(s),
            ValueData::StrView(v) => Some(v.as_str()),
            ValueData::Target(t) => match &**t {
                TargetString::Narrow(s) => Some(s),
                TargetString::Wide(_) => None,
            },
            _ => None,
        }
    }

    /// The wide string payload, if the value has one.
    pub fn as_wide(&self) -> Option<&[char]> {
        match &self.data {
            ValueData::Wide(w) => Some(w),
            ValueData::WideView(v) => Some(v.as_slice()),
            ValueData::Target(t) => match &**t {
                TargetString::Narrow(_) => None,
                TargetString::Wide(w) => Some(w),
            },
            _ => None,
        }
    }

    /// The string payload with its width, if the value has one.
    pub(crate) fn string_slice(&self) -> Option<StringSlice<'_>> {
        if let Some(s) = self.as_narrow() {
            return Some(StringSlice::Narrow(s));
        }
        self.as_wide().map(StringSlice::Wide)
    }

    /// Type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match &self.data {
            ValueData::Empty => "empty",
            ValueData::Bool(_) => "bool",
            ValueData::Int(_) => "int",
            ValueData::Double(_) => "double",
            ValueData::Str(_) | ValueData::StrView(_) => "string",
            ValueData::Wide(_) | ValueData::WideView(_) => "wstring",
            ValueData::List(_) => "list",
            ValueData::Map(_) => "map",
            ValueData::Callable(_) => "callable",
            ValueData::Target(_) => "target",
        }
    }

    /// Structural equality on payloads. Lifetime metadata does not
    /// participate; integers and doubles compare numerically.
    pub fn equals(&self, other: &Value) -> bool {
        if let (Some(a), Some(b)) = (self.as_narrow(), other.as_narrow()) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (self.as_wide(), other.as_wide()) {
            return a == b;
        }
        match (&self.data, &other.data) {
            (ValueData::Empty, ValueData::Empty) => true,
            (ValueData::Bool(a), ValueData::Bool(b)) => a == b,
            (ValueData::Int(a), ValueData::Int(b)) => a == b,
            (ValueData::Double(a), ValueData::Double(b)) => a == b,
            (ValueData::Int(a), ValueData::Double(b)) | (ValueData::Double(b), ValueData::Int(a)) => {
                *a as f64 == *b
            }
            (ValueData::List(a), ValueData::List(b)) => a.equals(b),
            (ValueData::Map(a), ValueData::Map(b)) => a.equals(b),
            (ValueData::Callable(a), ValueData::Callable(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

// Rendering

/// Format a double so that whole numbers keep their decimal point.
fn format_double(d: f64) -> String {
    if d.is_finite() && d.fract() == 0.0 {
        format!("{d:.1}")
    } else {
        d.to_string()
    }
}

impl Value {
    /// Render the value for output. Strings appear bare; containers use
    /// their repr form.
    pub fn display_value(&self) -> String {
        match &self.data {
            ValueData::Str(_) | ValueData::StrView(_) | ValueData::Wide(_)
            | ValueData::WideView(_) | ValueData::Target(_) => match self.string_slice() {
                Some(StringSlice::Narrow(s)) => s.to_string(),
                Some(StringSlice::Wide(w)) => w.iter().collect(),
                None => String::new(),
            },
            _ => self.repr_value(),
        }
    }

    /// Render the value in repr form: strings quoted, containers
    /// bracketed, map entries in key order.
    pub fn repr_value(&self) -> String {
        match &self.data {
            ValueData::Empty => String::new(),
            ValueData::Bool(b) => b.to_string(),
            ValueData::Int(n) => n.to_string(),
            ValueData::Double(d) => format_double(*d),
            ValueData::Str(_) | ValueData::StrView(_) | ValueData::Wide(_)
            | ValueData::WideView(_) | ValueData::Target(_) => {
                format!("'{}'", self.display_value())
            }
            ValueData::List(items) => {
                let inner: Vec<_> = items.iter().map(|v| v.repr_value()).collect();
                format!("[{}]", inner.join(", "))
            }
            ValueData::Map(map) => {
                let mut keys = map.keys();
                keys.sort();
                let mut out = String::from("{");
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let value = map.get(key).unwrap_or_else(Value::empty);
                    let _ = write!(out, "'{}': {}", key, value.repr_value());
                }
                out.push('}');
                out
            }
            ValueData::Callable(_) => "<callable>".to_string(),
        }
    }
}
