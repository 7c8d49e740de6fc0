//! Render context: the per-render environment.
//!
//! One render owns one context. It bundles everything evaluation needs
//! besides the expression tree itself: the scope stack the statement
//! renderer pushes and pops around blocks, the pool that keeps parent
//! values alive until the render finishes, the renderer callback for
//! width coercion, and the budget that bounds user-callable recursion.
//!
//! Scopes are plain owned maps on a stack. Nothing here is shared or
//! reference-counted: a block's bindings die when its scope is popped,
//! and name lookup walks the stack from the innermost scope outward.
//! The bottom scope never leaves; it holds the engine globals and
//! whatever top-level variables the host hands to the render.

use std::cell::Cell;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::output::{NarrowRenderer, RendererCallback};
use crate::value::{Pool, SpecialFn, Value};

/// The variable bindings introduced by one block: a loop body, a macro
/// invocation, an include.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    bindings: FxHashMap<String, Value>,
}

impl Scope {
    /// An empty scope.
    pub fn new() -> Self {
        Scope::default()
    }

    /// A scope seeded with bindings, the way the iteration renderer
    /// enters a loop body with its `loop` map already in place.
    pub fn from_bindings(bindings: FxHashMap<String, Value>) -> Self {
        Scope { bindings }
    }

    /// Bind `name` here, shadowing any same-named binding further out.
    #[inline]
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// The value bound to `name` in this scope alone. Outer scopes are
    /// the context's business, not the scope's.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }
}

/// Cap on nested user-callable invocations. Evaluation past this depth
/// yields the empty value instead of overflowing the stack.
const MAX_CALL_DEPTH: usize = 256;

/// The per-render environment: scope stack, value pool, renderer
/// callback, and call-depth budget.
pub struct RenderContext {
    /// Scope stack. Index 0 is the global scope; lookup walks backward.
    scopes: Vec<Scope>,
    /// Arena anchoring values for this render.
    pool: Pool,
    /// Width coercion for the surrounding template.
    callback: Arc<dyn RendererCallback>,
    /// Current user-callable nesting depth.
    call_depth: Cell<usize>,
}

impl RenderContext {
    /// Create a context whose global scope already binds the engine
    /// globals (`range`).
    pub fn new(callback: Arc<dyn RendererCallback>) -> Self {
        let mut globals = Scope::new();
        globals.define("range", Value::int(SpecialFn::Range.id()));
        RenderContext {
            scopes: vec![globals],
            pool: Pool::new(),
            callback,
            call_depth: Cell::new(0),
        }
    }

    /// Number of live scopes, the global scope included.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Enter an empty scope.
    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    /// Enter a scope seeded with bindings.
    pub fn push_scope_with(&mut self, bindings: FxHashMap<String, Value>) {
        self.scopes.push(Scope::from_bindings(bindings));
    }

    /// Leave the innermost scope. Entry and exit must stay balanced; a
    /// surplus pop is dropped rather than unseating the globals.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Bind `name` in the innermost scope.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.define(name, value);
        }
    }

    /// Bind `name` in the global scope, visible for the whole render.
    pub fn define_global(&mut self, name: impl Into<String>, value: Value) {
        if let Some(scope) = self.scopes.first_mut() {
            scope.define(name, value);
        }
    }

    /// Find `name`, innermost scope first. `None` when no scope binds
    /// it; a reference to a name the render never defined is not an
    /// error at this level.
    pub fn find_value(&self, name: &str) -> Option<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .cloned()
    }

    /// The render's value pool.
    #[inline]
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// The renderer callback.
    #[inline]
    pub fn renderer_callback(&self) -> Arc<dyn RendererCallback> {
        Arc::clone(&self.callback)
    }

    /// Enter a user-callable invocation. Returns `false` when the depth
    /// cap is reached; the caller must not invoke the callable then.
    pub(crate) fn enter_call(&self) -> bool {
        let depth = self.call_depth.get();
        if depth >= MAX_CALL_DEPTH {
            return false;
        }
        self.call_depth.set(depth + 1);
        true
    }

    /// Leave a user-callable invocation. Pairs with a successful
    /// [`enter_call`](RenderContext::enter_call).
    pub(crate) fn leave_call(&self) {
        let depth = self.call_depth.get();
        self.call_depth.set(depth.saturating_sub(1));
    }
}

impl Default for RenderContext {
    /// A context rendering narrow strings.
    fn default() -> Self {
        RenderContext::new(Arc::new(NarrowRenderer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_innermost_out() {
        let mut ctx = RenderContext::default();
        ctx.define("greeting", Value::string("hi"));
        ctx.push_scope();
        // Inner scope sees the outer binding until it shadows it.
        assert_eq!(ctx.find_value("greeting"), Some(Value::string("hi")));
        ctx.define("greeting", Value::string("hello"));
        assert_eq!(ctx.find_value("greeting"), Some(Value::string("hello")));
        // Popping the block restores the outer binding.
        ctx.pop_scope();
        assert_eq!(ctx.find_value("greeting"), Some(Value::string("hi")));
    }

    #[test]
    fn test_loop_body_scope_enters_seeded() {
        let mut ctx = RenderContext::default();
        let mut bindings = FxHashMap::default();
        bindings.insert("item".to_string(), Value::string("first"));
        ctx.push_scope_with(bindings);
        assert_eq!(ctx.find_value("item"), Some(Value::string("first")));
        ctx.pop_scope();
        assert_eq!(ctx.find_value("item"), None);
    }

    #[test]
    fn test_globals_reach_every_block() {
        let mut ctx = RenderContext::default();
        ctx.push_scope();
        ctx.push_scope();
        // Defined mid-render, visible from the innermost block anyway.
        ctx.define_global("answer", Value::int(99));
        assert_eq!(ctx.find_value("answer"), Some(Value::int(99)));
    }

    #[test]
    fn test_range_global_is_preinstalled() {
        let ctx = RenderContext::default();
        assert_eq!(
            ctx.find_value("range"),
            Some(Value::int(SpecialFn::Range.id()))
        );
    }

    #[test]
    fn test_surplus_pop_keeps_the_global_scope() {
        let mut ctx = RenderContext::default();
        ctx.pop_scope();
        ctx.pop_scope();
        assert_eq!(ctx.depth(), 1);
        assert!(ctx.find_value("range").is_some());
    }

    #[test]
    fn test_undefined_name_is_none() {
        let ctx = RenderContext::default();
        assert!(ctx.find_value("missing").is_none());
    }

    #[test]
    fn test_call_depth_budget() {
        let ctx = RenderContext::default();
        for _ in 0..MAX_CALL_DEPTH {
            assert!(ctx.enter_call());
        }
        // The budget is spent; one leave buys exactly one more enter.
        assert!(!ctx.enter_call());
        ctx.leave_call();
        assert!(ctx.enter_call());
    }

    #[test]
    fn test_scope_local_get_ignores_outer_scopes() {
        let mut outer = Scope::new();
        outer.define("x", Value::int(1));
        let inner = Scope::new();
        assert!(inner.get("x").is_none());
        assert_eq!(outer.get("x"), Some(&Value::int(1)));
    }
}
