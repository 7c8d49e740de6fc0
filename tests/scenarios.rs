//! End-to-end scenarios driving the public API the way the statement
//! renderer would: build an expression tree, evaluate it in a fresh
//! render context, check the produced value or rendered text.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use stanza::{
    convert_to_bool, ArgumentInfo, BinaryOp, Callable, CallableKind, CallParams, Expression,
    FilterChain, FullExpression, RenderContext, Value,
};

fn eval(expr: &stanza::ExprPtr) -> Value {
    let mut ctx = RenderContext::default();
    expr.evaluate(&mut ctx)
}

fn filtered(input: Value, name: &str, params: CallParams) -> Value {
    let chain = FilterChain::new(name, params).unwrap();
    eval(&Expression::filtered(Expression::constant(input), chain))
}

#[test]
fn scenario_title() {
    let result = filtered(Value::string("hello world"), "title", CallParams::new());
    assert_eq!(result.display_value(), "Hello World");
}

#[test]
fn scenario_trim() {
    let result = filtered(Value::string("  a   b  "), "trim", CallParams::new());
    assert_eq!(result.display_value(), "a b");
}

#[test]
fn scenario_wordcount() {
    let result = filtered(
        Value::string("one two three four"),
        "wordcount",
        CallParams::new(),
    );
    assert_eq!(result, Value::int(4));
}

#[test]
fn scenario_urlencode() {
    let result = filtered(Value::string("Hello, World!"), "urlencode", CallParams::new());
    assert_eq!(result.display_value(), "Hello%2C+World%21");
}

#[test]
fn scenario_truncate() {
    let params = CallParams::new()
        .with_pos(Expression::constant(Value::int(9)))
        .with_pos(Expression::constant(Value::boolean(false)))
        .with_pos(Expression::constant(Value::string("...")))
        .with_pos(Expression::constant(Value::int(2)));
    let result = filtered(Value::string("The quick brown fox"), "truncate", params);
    assert_eq!(result.display_value(), "The...");
}

#[test]
fn scenario_replace_first() {
    let params = CallParams::new()
        .with_pos(Expression::constant(Value::string("a")))
        .with_pos(Expression::constant(Value::string("X")))
        .with_pos(Expression::constant(Value::int(1)));
    let result = filtered(Value::string("abcabc"), "replace", params);
    assert_eq!(result.display_value(), "Xbcabc");
}

#[test]
fn scenario_range() {
    let expr = Expression::call(
        Expression::value_ref("range"),
        CallParams::new()
            .with_pos(Expression::constant(Value::int(1)))
            .with_pos(Expression::constant(Value::int(10)))
            .with_pos(Expression::constant(Value::int(2))),
    );
    assert_eq!(
        eval(&expr),
        Value::list(vec![
            Value::int(1),
            Value::int(3),
            Value::int(5),
            Value::int(7),
            Value::int(9)
        ])
    );
}

#[test]
fn scenario_mixed_positional_and_keyword_binding() {
    // f(1, 2, x=3) where f declares (a, x, b='d').
    let schema = [
        ArgumentInfo::required("a"),
        ArgumentInfo::required("x"),
        ArgumentInfo::with_default("b", Value::string("d")),
    ];
    let params = CallParams::new()
        .with_pos(Expression::constant(Value::int(1)))
        .with_pos(Expression::constant(Value::int(2)))
        .with_kw("x", Expression::constant(Value::int(3)));
    let args = stanza::parse_call_params(&schema, &params).unwrap();

    let mut ctx = RenderContext::default();
    assert_eq!(args.eval("a", &mut ctx), Value::int(1));
    assert_eq!(args.eval("b", &mut ctx), Value::int(2));
    assert_eq!(args.eval("x", &mut ctx), Value::int(3));
}

#[test]
fn scenario_short_circuit() {
    // true and undefined_name is falsy: the right side evaluates to the
    // empty value.
    let expr = Expression::binary(
        BinaryOp::And,
        Expression::constant(Value::boolean(true)),
        Expression::value_ref("undefined_name"),
    );
    assert!(!convert_to_bool(&eval(&expr)));

    // false and probe() leaves the probe unevaluated.
    let counter = Arc::new(AtomicUsize::new(0));
    let probe_counter = counter.clone();
    let probe = Value::callable(Callable::expression(
        CallableKind::UserCallable,
        move |_, _| {
            probe_counter.fetch_add(1, Ordering::SeqCst);
            Value::boolean(true)
        },
    ));
    let expr = Expression::binary(
        BinaryOp::And,
        Expression::constant(Value::boolean(false)),
        Expression::call(Expression::constant(probe), CallParams::new()),
    );
    assert!(!convert_to_bool(&eval(&expr)));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn scenario_negative_list_index() {
    let list = Value::list(vec![Value::int(10), Value::int(20), Value::int(30)]);
    let expr = Expression::subscript(
        Expression::constant(list),
        vec![Expression::constant(Value::int(-1))],
    );
    assert_eq!(eval(&expr), Value::int(30));
}

#[test]
fn scenario_subscript_view_survives_whole_render() {
    // A subscript chain's result stays readable for the rest of the
    // render; its parents are anchored in the context pool.
    let inner = Value::list(vec![Value::string("deep")]);
    let mut entries = FxHashMap::default();
    entries.insert("items".to_string(), inner);
    let scope_value = Value::map(entries);

    let mut ctx = RenderContext::default();
    ctx.define("data", scope_value);

    let expr = Expression::subscript(
        Expression::value_ref("data"),
        vec![
            Expression::constant(Value::string("items")),
            Expression::constant(Value::int(0)),
        ],
    );
    let result = expr.evaluate(&mut ctx);

    // Run more evaluation in the same render, then read the value again.
    let noise = Expression::call(
        Expression::value_ref("range"),
        CallParams::new().with_pos(Expression::constant(Value::int(100))),
    );
    let _ = noise.evaluate(&mut ctx);

    assert_eq!(result.display_value(), "deep");
    let parent = ctx.pool().get(result.parent().unwrap()).unwrap();
    assert_eq!(parent, Value::list(vec![Value::string("deep")]));
}

#[test]
fn scenario_filter_pipeline_on_scope_variable() {
    // {{ greeting | trim | title }} with greeting bound in scope.
    let mut ctx = RenderContext::default();
    ctx.define("greeting", Value::string("  hello   there  "));

    let chain = FilterChain::new("trim", CallParams::new())
        .unwrap()
        .then("title", CallParams::new())
        .unwrap();
    let full = FullExpression::new(Expression::filtered(
        Expression::value_ref("greeting"),
        chain,
    ));
    assert_eq!(full.evaluate(&mut ctx).display_value(), "Hello There");
}

#[test]
fn scenario_is_tester_with_guard() {
    // {{ 'big' if n is odd else 'small' }} with n = 7.
    let mut ctx = RenderContext::default();
    ctx.define("n", Value::int(7));

    let guard = Expression::is_tester(Expression::value_ref("n"), "odd", CallParams::new()).unwrap();
    let full = FullExpression::new(Expression::constant(Value::string("big"))).with_tester(
        stanza::IfExpression::new(guard, Some(Expression::constant(Value::string("small")))),
    );
    assert_eq!(full.evaluate(&mut ctx), Value::string("big"));
}

#[test]
fn scenario_concurrent_renders_share_one_tree() {
    // One parsed tree, many renders with their own contexts.
    let chain = FilterChain::new("upper", CallParams::new()).unwrap();
    let expr = Expression::filtered(Expression::value_ref("word"), chain);
    let full = Arc::new(FullExpression::new(expr));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let full = Arc::clone(&full);
            std::thread::spawn(move || {
                let mut ctx = RenderContext::default();
                ctx.define("word", Value::string(format!("word{i}")));
                full.evaluate(&mut ctx).display_value()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), format!("WORD{i}"));
    }
}
