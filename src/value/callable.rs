//! Callable values.
//!
//! A callable is a value representing either an expression callable
//! (consumes call parameters and a context, returns a value) or a
//! statement callable (consumes call parameters, an output sink, and a
//! context, writes text). Special built-in functions are addressed by a
//! small integer id placed in an ordinary integer value, so that scope
//! lookup of a name like `range` returns a normal value.

use std::fmt;
use std::sync::Arc;

use crate::context::RenderContext;
use crate::expr::CallParams;
use crate::output::OutStream;

use super::Value;

/// Identifiers of built-in functions dispatched by integer id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialFn {
    /// `range(start?, stop, step?)`.
    Range,
    /// `loop.cycle(args…)`.
    LoopCycle,
}

impl SpecialFn {
    /// The integer id stored in a value for this function.
    #[inline]
    pub fn id(self) -> i64 {
        match self {
            SpecialFn::Range => 1,
            SpecialFn::LoopCycle => 2,
        }
    }

    /// Resolve an integer id back to a special function.
    #[inline]
    pub fn from_id(id: i64) -> Option<SpecialFn> {
        match id {
            1 => Some(SpecialFn::Range),
            2 => Some(SpecialFn::LoopCycle),
            _ => None,
        }
    }
}

/// What kind of callable a value carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallableKind {
    /// Engine-provided global function.
    GlobalFunc,
    /// Host-provided callable.
    UserCallable,
    /// Template macro.
    Macro,
    /// Built-in dispatched by integer id.
    Special(SpecialFn),
}

/// Body of an expression callable.
pub type ExpressionCallable = dyn Fn(&CallParams, &mut RenderContext) -> Value + Send + Sync;

/// Body of a statement callable.
pub type StatementCallable =
    dyn Fn(&CallParams, &mut dyn OutStream, &mut RenderContext) + Send + Sync;

/// The two body shapes a callable can have.
#[derive(Clone)]
pub enum CallableBody {
    /// Produces a value.
    Expression(Arc<ExpressionCallable>),
    /// Writes text to a sink.
    Statement(Arc<StatementCallable>),
}

/// A callable value.
#[derive(Clone)]
pub struct Callable {
    kind: CallableKind,
    body: CallableBody,
}

impl Callable {
    /// Create an expression callable.
    pub fn expression(
        kind: CallableKind,
        body: impl Fn(&CallParams, &mut RenderContext) -> Value + Send + Sync + 'static,
    ) -> Self {
        Callable {
            kind,
            body: CallableBody::Expression(Arc::new(body)),
        }
    }

    /// Create a statement callable.
    pub fn statement(
        kind: CallableKind,
        body: impl Fn(&CallParams, &mut dyn OutStream, &mut RenderContext) + Send + Sync + 'static,
    ) -> Self {
        Callable {
            kind,
            body: CallableBody::Statement(Arc::new(body)),
        }
    }

    /// The callable's kind.
    #[inline]
    pub fn kind(&self) -> CallableKind {
        self.kind
    }

    /// The callable's body.
    #[inline]
    pub fn body(&self) -> &CallableBody {
        &self.body
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self.body {
            CallableBody::Expression(_) => "expression",
            CallableBody::Statement(_) => "statement",
        };
        f.debug_struct("Callable")
            .field("kind", &self.kind)
            .field("body", &shape)
            .finish()
    }
}

impl PartialEq for Callable {
    /// Callables compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (&self.body, &other.body) {
            (CallableBody::Expression(a), CallableBody::Expression(b)) => Arc::ptr_eq(a, b),
            (CallableBody::Statement(a), CallableBody::Statement(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
