//! stanza - expression evaluation and filter core for a Jinja2-compatible
//! template engine.
//!
//! Given a parsed expression tree and a render context, this crate
//! produces values or rendered text. The outer template machinery
//! (source loading, parsing, the statement renderer) lives elsewhere and
//! drives this core through [`FullExpression::evaluate`] and
//! [`FullExpression::render`].
//!
//! # Architecture
//!
//! - [`Value`]: polymorphic runtime value with temporary/parent lifetime
//!   metadata, allocated payloads behind [`Heap`], anchored per render in
//!   a [`Pool`]
//! - [`RenderContext`]: scope stack, pool, and renderer callback for one
//!   render invocation
//! - [`Expression`]: closed-enum expression tree with direct match
//!   dispatch; [`evaluate_binary`] and [`evaluate_unary`] for operators
//! - [`parse_call_params`]: reconciles positional and keyword arguments
//!   against a declared schema
//! - [`create_filter`] / [`create_tester`]: name-based registries behind
//!   construct-on-first-use globals
//!
//! # Error Policy
//!
//! Evaluation never aborts a render: unknown names, type mismatches,
//! zero divisors, and out-of-range subscripts produce the empty value.
//! Unknown filter or tester names and unsatisfiable argument schemas are
//! construction-time [`Error`]s for the template loader.
//!
//! # Concurrency
//!
//! Expression trees are immutable and shareable across threads; each
//! render owns its context and pool and runs single-threaded.

mod context;
mod errors;
mod operators;
mod output;
mod testers;
mod unary_operators;
mod value;

pub mod expr;
pub mod filters;

#[cfg(test)]
mod tests;

pub use context::{RenderContext, Scope};
pub use errors::Error;
pub use operators::{evaluate_binary, BinaryOp};
pub use output::{NarrowRenderer, OutStream, RendererCallback, TargetStringStream, WideRenderer};
pub use testers::{create_tester, value_contains, Tester};
pub use unary_operators::{evaluate_unary, UnaryOp};
pub use value::{
    convert_to_bool, convert_to_int, Callable, CallableBody, CallableKind, ExpressionCallable,
    GeneratedList, Heap, ListAdapter, MapAdapter, Pool, SpecialFn, StatementCallable, StrView,
    TargetString, Value, ValueData, ValueId, WideView,
};

pub use expr::{
    parse_call_params, subscript, ArgumentInfo, CallParams, ExprPtr, Expression, FullExpression,
    IfExpression, ParsedArguments,
};
pub use filters::{create_filter, Filter, FilterChain};
