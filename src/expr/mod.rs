//! The expression tree.
//!
//! Expression nodes form an immutable tree shared behind [`ExprPtr`]
//! handles; a parsed template holds one tree and any number of renders
//! walk it concurrently, each with its own context. Dispatch is a match
//! on a closed enum. Nodes that resolve names at construction time
//! (filter chains, testers) hold the resolved object, so an unknown name
//! surfaces to the template loader instead of failing mid-render.
//!
//! Every node answers `evaluate`; `render` defaults to writing the
//! evaluated value and is specialized where streaming matters.

mod binder;

pub use binder::{parse_call_params, ArgumentInfo, ParsedArguments};

use crate::context::RenderContext;
use crate::errors::Error;
use crate::filters::FilterChain;
use crate::operators::{evaluate_binary, BinaryOp};
use crate::output::{OutStream, TargetStringStream};
use crate::testers::{create_tester, value_contains, Tester};
use crate::unary_operators::{evaluate_unary, UnaryOp};
use crate::value::{
    convert_to_bool, convert_to_int, Callable, CallableBody, CallableKind, Heap, SpecialFn, Value,
    ValueData,
};

/// Shared handle to an expression node.
pub type ExprPtr = Heap<Expression>;

/// A caller's argument bundle: ordered positionals plus keyword arguments
/// in insertion order.
#[derive(Clone, Default)]
pub struct CallParams {
    /// Positional argument expressions.
    pub pos: Vec<ExprPtr>,
    /// Keyword argument expressions, insertion order preserved.
    pub kw: Vec<(String, ExprPtr)>,
}

impl CallParams {
    /// An empty argument bundle.
    pub fn new() -> Self {
        CallParams::default()
    }

    /// Append a positional argument.
    #[must_use]
    pub fn with_pos(mut self, expr: ExprPtr) -> Self {
        self.pos.push(expr);
        self
    }

    /// Append a keyword argument.
    #[must_use]
    pub fn with_kw(mut self, name: impl Into<String>, expr: ExprPtr) -> Self {
        self.kw.push((name.into(), expr));
        self
    }

    /// The expression bound to keyword `name`, if present.
    pub fn kw_get(&self, name: &str) -> Option<&ExprPtr> {
        self.kw
            .iter()
            .find_map(|(kw_name, expr)| (kw_name == name).then_some(expr))
    }
}

/// An expression node.
pub enum Expression {
    /// A literal value.
    Constant(Value),
    /// A name looked up in the scope stack. Unknown names evaluate to the
    /// empty value; they do not fail the render.
    ValueRef(String),
    /// A base expression subscripted by one index per step.
    Subscript {
        base: ExprPtr,
        indices: Vec<ExprPtr>,
    },
    /// A base expression piped through a filter chain.
    Filtered { base: ExprPtr, filter: FilterChain },
    /// A unary operation.
    Unary { op: UnaryOp, operand: ExprPtr },
    /// A binary operation.
    Binary {
        op: BinaryOp,
        left: ExprPtr,
        right: ExprPtr,
    },
    /// A sequence literal.
    Tuple { items: Vec<ExprPtr> },
    /// A mapping literal.
    Dict { entries: Vec<(String, ExprPtr)> },
    /// An `is` test against a named tester.
    Is {
        value: ExprPtr,
        tester: Box<dyn Tester>,
    },
    /// A call of an evaluated callee.
    Call { callee: ExprPtr, params: CallParams },
}

// Constructors

impl Expression {
    /// A literal value node.
    pub fn constant(value: Value) -> ExprPtr {
        Heap::new(Expression::Constant(value))
    }

    /// A scope lookup node.
    pub fn value_ref(name: impl Into<String>) -> ExprPtr {
        Heap::new(Expression::ValueRef(name.into()))
    }

    /// A subscript chain node.
    pub fn subscript(base: ExprPtr, indices: Vec<ExprPtr>) -> ExprPtr {
        Heap::new(Expression::Subscript { base, indices })
    }

    /// A filtered node over a pre-built chain.
    pub fn filtered(base: ExprPtr, filter: FilterChain) -> ExprPtr {
        Heap::new(Expression::Filtered { base, filter })
    }

    /// A filtered node resolving one filter by name. Unknown names fail
    /// here, at construction.
    pub fn filtered_by_name(
        base: ExprPtr,
        name: &str,
        params: CallParams,
    ) -> Result<ExprPtr, Error> {
        Ok(Expression::filtered(base, FilterChain::new(name, params)?))
    }

    /// A unary operation node.
    pub fn unary(op: UnaryOp, operand: ExprPtr) -> ExprPtr {
        Heap::new(Expression::Unary { op, operand })
    }

    /// A binary operation node.
    pub fn binary(op: BinaryOp, left: ExprPtr, right: ExprPtr) -> ExprPtr {
        Heap::new(Expression::Binary { op, left, right })
    }

    /// A sequence literal node.
    pub fn tuple(items: Vec<ExprPtr>) -> ExprPtr {
        Heap::new(Expression::Tuple { items })
    }

    /// A mapping literal node.
    pub fn dict(entries: Vec<(String, ExprPtr)>) -> ExprPtr {
        Heap::new(Expression::Dict { entries })
    }

    /// An `is` node resolving the tester by name. Unknown names fail here,
    /// at construction.
    pub fn is_tester(value: ExprPtr, name: &str, params: CallParams) -> Result<ExprPtr, Error> {
        let tester = create_tester(name, params)?;
        Ok(Heap::new(Expression::Is { value, tester }))
    }

    /// A call node.
    pub fn call(callee: ExprPtr, params: CallParams) -> ExprPtr {
        Heap::new(Expression::Call { callee, params })
    }
}

// Evaluation

impl Expression {
    /// Evaluate this node to a value.
    pub fn evaluate(&self, ctx: &mut RenderContext) -> Value {
        match self {
            Expression::Constant(value) => value.clone(),
            Expression::ValueRef(name) => ctx.find_value(name).unwrap_or_else(Value::empty),
            Expression::Subscript { base, indices } => {
                let mut cur = base.evaluate(ctx);
                for index_expr in indices {
                    let index = index_expr.evaluate(ctx);
                    let mut next = subscript(&cur, &index);
                    // A child extracted from shared data keeps its parent
                    // alive through the pool for the rest of the render.
                    if cur.should_extend_lifetime() {
                        let id = ctx.pool().hold(cur.clone());
                        next.set_parent(id);
                    }
                    cur = next;
                }
                cur
            }
            Expression::Filtered { base, filter } => {
                let base_val = base.evaluate(ctx);
                filter.apply(base_val, ctx).with_temporary(true)
            }
            Expression::Unary { op, operand } => {
                evaluate_unary(operand.evaluate(ctx), *op).with_temporary(true)
            }
            Expression::Binary { op, left, right } => eval_binary_expr(*op, left, right, ctx),
            Expression::Tuple { items } => {
                let values = items.iter().map(|item| item.evaluate(ctx)).collect();
                Value::list(values)
            }
            Expression::Dict { entries } => {
                let mut map = rustc_hash::FxHashMap::default();
                for (key, expr) in entries {
                    map.insert(key.clone(), expr.evaluate(ctx));
                }
                Value::map(map)
            }
            Expression::Is { value, tester } => {
                let tested = value.evaluate(ctx);
                Value::boolean(tester.test(&tested, ctx)).with_temporary(true)
            }
            Expression::Call { callee, params } => eval_call(callee, params, ctx),
        }
    }

    /// Render this node into a stream. The default path writes the
    /// evaluated value; calls stream statement callables directly.
    pub fn render(&self, stream: &mut dyn OutStream, ctx: &mut RenderContext) {
        match self {
            Expression::Call { callee, params } => render_call(callee, params, stream, ctx),
            _ => {
                let value = self.evaluate(ctx);
                stream.write_value(&value);
            }
        }
    }
}

/// Conditional guard of a full expression.
pub struct IfExpression {
    test: ExprPtr,
    alt: Option<ExprPtr>,
}

impl IfExpression {
    /// Create a guard with an optional else branch.
    pub fn new(test: ExprPtr, alt: Option<ExprPtr>) -> Self {
        IfExpression { test, alt }
    }

    /// Evaluate the guard condition.
    pub fn evaluate(&self, ctx: &mut RenderContext) -> bool {
        convert_to_bool(&self.test.evaluate(ctx))
    }

    /// Evaluate the else branch, or the empty value without one.
    pub fn evaluate_alt_value(&self, ctx: &mut RenderContext) -> Value {
        self.alt
            .as_ref()
            .map(|alt| alt.evaluate(ctx))
            .unwrap_or_else(Value::empty)
    }
}

/// A primary expression with an optional conditional guard.
pub struct FullExpression {
    expression: ExprPtr,
    tester: Option<IfExpression>,
}

impl FullExpression {
    /// Wrap a primary expression.
    pub fn new(expression: ExprPtr) -> Self {
        FullExpression {
            expression,
            tester: None,
        }
    }

    /// Attach a conditional guard.
    #[must_use]
    pub fn with_tester(mut self, tester: IfExpression) -> Self {
        self.tester = Some(tester);
        self
    }

    /// Evaluate the primary, falling back to the guard's alternative when
    /// the guard fails.
    pub fn evaluate(&self, ctx: &mut RenderContext) -> Value {
        let result = self.expression.evaluate(ctx);
        if let Some(tester) = &self.tester {
            if !tester.evaluate(ctx) {
                return tester.evaluate_alt_value(ctx);
            }
        }
        result
    }

    /// Render into a stream. Without a guard the primary streams itself,
    /// preserving direct output for statement callables.
    pub fn render(&self, stream: &mut dyn OutStream, ctx: &mut RenderContext) {
        match &self.tester {
            None => self.expression.render(stream, ctx),
            Some(_) => {
                let value = self.evaluate(ctx);
                stream.write_value(&value);
            }
        }
    }
}

// Binary dispatch with short-circuiting

fn eval_binary_expr(
    op: BinaryOp,
    left: &ExprPtr,
    right: &ExprPtr,
    ctx: &mut RenderContext,
) -> Value {
    let result = match op {
        BinaryOp::And => {
            let mut truth = convert_to_bool(&left.evaluate(ctx));
            if truth {
                truth = convert_to_bool(&right.evaluate(ctx));
            }
            Value::boolean(truth)
        }
        BinaryOp::Or => {
            let mut truth = convert_to_bool(&left.evaluate(ctx));
            if !truth {
                truth = convert_to_bool(&right.evaluate(ctx));
            }
            Value::boolean(truth)
        }
        BinaryOp::In => {
            let needle = left.evaluate(ctx);
            let seq = right.evaluate(ctx);
            Value::boolean(value_contains(&needle, &seq))
        }
        BinaryOp::Concat => {
            let left_val = left.evaluate(ctx);
            let right_val = right.evaluate(ctx);
            let callback = ctx.renderer_callback();
            let mut target = callback.as_target_string(&left_val);
            target.append(&callback.as_target_string(&right_val));
            Value::target(target)
        }
        _ => evaluate_binary(left.evaluate(ctx), right.evaluate(ctx), op),
    };
    result.with_temporary(true)
}

// Subscripting

/// Subscript a value: integer index on lists (negatives count from the
/// end), string or integer key on maps. Anything else is empty.
pub fn subscript(value: &Value, index: &Value) -> Value {
    match value.data() {
        ValueData::List(list) => {
            let ValueData::Int(raw) = index.data() else {
                return Value::empty();
            };
            let len = list.len() as i64;
            let idx = if *raw < 0 { len + *raw } else { *raw };
            if (0..len).contains(&idx) {
                list.get(idx as usize).unwrap_or_else(Value::empty)
            } else {
                Value::empty()
            }
        }
        ValueData::Map(map) => match index.data() {
            ValueData::Int(key) => map.get(&key.to_string()).unwrap_or_else(Value::empty),
            _ => match index.as_narrow() {
                Some(key) => map.get(key).unwrap_or_else(Value::empty),
                None => Value::empty(),
            },
        },
        _ => Value::empty(),
    }
}

// Calls

#[tracing::instrument(level = "debug", skip_all)]
fn eval_call(callee: &ExprPtr, params: &CallParams, ctx: &mut RenderContext) -> Value {
    let fn_val = callee.evaluate(ctx);

    // Special built-ins are addressed by an integer id in a plain value.
    if let ValueData::Int(id) = fn_val.data() {
        return match SpecialFn::from_id(*id) {
            Some(SpecialFn::Range) => call_global_range(params, ctx),
            Some(SpecialFn::LoopCycle) => call_loop_cycle(params, ctx),
            None => Value::empty(),
        };
    }

    call_arbitrary_fn(fn_val, params, ctx)
}

/// Resolve a value to its callable, trying one `operator()` member lookup
/// as a fallback.
fn resolve_callable(fn_val: &Value) -> Option<Callable> {
    if let ValueData::Callable(callable) = fn_val.data() {
        return Some(callable.clone());
    }
    let member = subscript(fn_val, &Value::string("operator()"));
    match member.into_data() {
        ValueData::Callable(callable) => Some(callable),
        _ => None,
    }
}

fn call_arbitrary_fn(fn_val: Value, params: &CallParams, ctx: &mut RenderContext) -> Value {
    let Some(callable) = resolve_callable(&fn_val) else {
        return Value::empty();
    };

    match callable.kind() {
        CallableKind::GlobalFunc | CallableKind::UserCallable => {}
        _ => return Value::empty(),
    }

    // Runaway recursion through user callables ends in an empty value,
    // not a blown stack.
    if !ctx.enter_call() {
        return Value::empty();
    }
    let result = match callable.body() {
        CallableBody::Expression(body) => body(params, ctx),
        CallableBody::Statement(body) => {
            // Capture statement output into a target string of the
            // renderer's width.
            let mut stream = TargetStringStream::new(ctx.renderer_callback());
            body(params, &mut stream, ctx);
            Value::target(stream.into_target())
        }
    };
    ctx.leave_call();
    result
}

fn render_call(
    callee: &ExprPtr,
    params: &CallParams,
    stream: &mut dyn OutStream,
    ctx: &mut RenderContext,
) {
    let fn_val = callee.evaluate(ctx);
    let Some(callable) = resolve_callable(&fn_val) else {
        // Not directly callable; fall back to evaluate-then-write, which
        // also covers the special built-ins.
        let value = eval_call(callee, params, ctx);
        stream.write_value(&value);
        return;
    };

    match callable.body() {
        CallableBody::Expression(body) => {
            let value = body(params, ctx);
            stream.write_value(&value);
        }
        CallableBody::Statement(body) => body(params, stream, ctx),
    }
}

fn call_global_range(params: &CallParams, ctx: &mut RenderContext) -> Value {
    let schema = [
        ArgumentInfo::optional("start"),
        ArgumentInfo::required("stop"),
        ArgumentInfo::optional("step"),
    ];
    let Ok(args) = parse_call_params(&schema, params) else {
        return Value::empty();
    };

    let start = convert_to_int(&args.eval("start", ctx), 0);
    let stop = convert_to_int(&args.eval("stop", ctx), 0);
    let step = if args.get("step").is_none() {
        1
    } else {
        let step = convert_to_int(&args.eval("step", ctx), 0);
        if step == 0 {
            return Value::empty();
        }
        step
    };

    let Some(distance) = stop.checked_sub(start) else {
        return Value::empty();
    };
    let count = ceil_div(distance, step).max(0) as usize;

    Value::generated_list(count, move |idx| Value::int(start + step * idx as i64))
}

/// Ceiling division toward the step direction, so the produced sequence
/// covers every element strictly before `stop`.
fn ceil_div(distance: i64, step: i64) -> i64 {
    let quotient = distance / step;
    let remainder = distance % step;
    if remainder != 0 && (remainder < 0) == (step < 0) {
        quotient + 1
    } else {
        quotient
    }
}

fn call_loop_cycle(params: &CallParams, ctx: &mut RenderContext) -> Value {
    let Some(loop_val) = ctx.find_value("loop") else {
        return Value::empty();
    };
    let ValueData::Map(loop_map) = loop_val.data() else {
        return Value::empty();
    };
    if params.pos.is_empty() {
        return Value::empty();
    }

    let index0 = convert_to_int(&loop_map.get("index0").unwrap_or_else(Value::empty), 0);
    let idx = index0.rem_euclid(params.pos.len() as i64) as usize;
    params.pos[idx].evaluate(ctx)
}
