//! Named filters.
//!
//! Filters are resolved by name against a process-wide registry populated
//! on first use; the registry is immutable afterwards and safe for
//! concurrent reads. Resolution happens when an expression tree is built,
//! so a misspelled filter name is a loader-visible error, not a render
//! failure. A filter chain applies its members in order, parent first.

mod collections;
mod string_converter;

use std::sync::OnceLock;

use rustc_hash::FxHashMap;

use crate::context::RenderContext;
use crate::errors::{unknown_filter, Error};
use crate::expr::CallParams;
use crate::value::Value;

use collections::{Default_, Join, Length, ListFilter, MapFilter, PPrint, Select, Sort};
use string_converter::{Mode, StringConverter};

/// A named filter: consumes the piped value, produces the filtered value.
pub trait Filter: Send + Sync {
    /// Apply the filter to `base` in the given render context.
    fn filter(&self, base: Value, ctx: &mut RenderContext) -> Value;
}

/// A linear chain of filters applied left to right.
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    /// Start a chain from one named filter.
    pub fn new(name: &str, params: CallParams) -> Result<Self, Error> {
        Ok(FilterChain {
            filters: vec![create_filter(name, params)?],
        })
    }

    /// Append another named filter to the chain.
    pub fn then(mut self, name: &str, params: CallParams) -> Result<Self, Error> {
        self.filters.push(create_filter(name, params)?);
        Ok(self)
    }

    /// Run the chain over a value.
    pub(crate) fn apply(&self, base: Value, ctx: &mut RenderContext) -> Value {
        self.filters
            .iter()
            .fold(base, |value, filter| filter.filter(value, ctx))
    }
}

type FilterFactory = fn(CallParams) -> Result<Box<dyn Filter>, Error>;

static REGISTRY: OnceLock<FxHashMap<&'static str, FilterFactory>> = OnceLock::new();

fn registry() -> &'static FxHashMap<&'static str, FilterFactory> {
    REGISTRY.get_or_init(|| {
        let mut filters: FxHashMap<&'static str, FilterFactory> = FxHashMap::default();
        filters.insert("trim", |p| StringConverter::boxed(Mode::Trim, p));
        filters.insert("title", |p| StringConverter::boxed(Mode::Title, p));
        filters.insert("wordcount", |p| StringConverter::boxed(Mode::WordCount, p));
        filters.insert("upper", |p| StringConverter::boxed(Mode::Upper, p));
        filters.insert("lower", |p| StringConverter::boxed(Mode::Lower, p));
        filters.insert("replace", |p| StringConverter::boxed(Mode::Replace, p));
        filters.insert("truncate", |p| StringConverter::boxed(Mode::Truncate, p));
        filters.insert("urlencode", |p| StringConverter::boxed(Mode::UrlEncode, p));
        filters.insert("pprint", PPrint::boxed);
        filters.insert("default", Default_::boxed);
        filters.insert("join", Join::boxed);
        filters.insert("list", ListFilter::boxed);
        filters.insert("map", MapFilter::boxed);
        filters.insert("select", |p| Select::boxed(p, false));
        filters.insert("reject", |p| Select::boxed(p, true));
        filters.insert("sort", Sort::boxed);
        filters.insert("length", Length::boxed);
        tracing::debug!(count = filters.len(), "initialized filter registry");
        filters
    })
}

/// Create a filter by name. Unknown names and unsatisfiable parameter
/// lists are construction-time errors surfaced to the template loader.
pub fn create_filter(name: &str, params: CallParams) -> Result<Box<dyn Filter>, Error> {
    let factory = registry().get(name).ok_or_else(|| unknown_filter(name))?;
    factory(params)
}
