//! Tests for call-parameter binding.

use crate::context::RenderContext;
use crate::expr::{parse_call_params, ArgumentInfo, CallParams, Expression};
use crate::value::Value;

fn pos(v: Value) -> CallParams {
    CallParams::new().with_pos(Expression::constant(v))
}

fn eval_bound(args: &crate::expr::ParsedArguments, name: &str) -> Value {
    let mut ctx = RenderContext::default();
    args.eval(name, &mut ctx)
}

#[test]
fn test_all_positional_in_schema_order() {
    let schema = [ArgumentInfo::required("a"), ArgumentInfo::required("b")];
    let params = CallParams::new()
        .with_pos(Expression::constant(Value::int(1)))
        .with_pos(Expression::constant(Value::int(2)));
    let args = parse_call_params(&schema, &params).unwrap();
    assert_eq!(eval_bound(&args, "a"), Value::int(1));
    assert_eq!(eval_bound(&args, "b"), Value::int(2));
    assert!(args.extra_pos.is_empty());
    assert!(args.extra_kw.is_empty());
}

#[test]
fn test_keyword_binding() {
    let schema = [ArgumentInfo::required("a"), ArgumentInfo::optional("b")];
    let params = CallParams::new()
        .with_kw("b", Expression::constant(Value::int(2)))
        .with_kw("a", Expression::constant(Value::int(1)));
    let args = parse_call_params(&schema, &params).unwrap();
    assert_eq!(eval_bound(&args, "a"), Value::int(1));
    assert_eq!(eval_bound(&args, "b"), Value::int(2));
}

#[test]
fn test_positionals_skip_keyword_bound_slots() {
    // f(1, 2, x=3) against (a, x, b='d'): positionals flow past the
    // keyword-bound x into a and b.
    let schema = [
        ArgumentInfo::required("a"),
        ArgumentInfo::required("x"),
        ArgumentInfo::with_default("b", Value::string("d")),
    ];
    let params = CallParams::new()
        .with_pos(Expression::constant(Value::int(1)))
        .with_pos(Expression::constant(Value::int(2)))
        .with_kw("x", Expression::constant(Value::int(3)));
    let args = parse_call_params(&schema, &params).unwrap();
    assert_eq!(eval_bound(&args, "a"), Value::int(1));
    assert_eq!(eval_bound(&args, "b"), Value::int(2));
    assert_eq!(eval_bound(&args, "x"), Value::int(3));
}

#[test]
fn test_keyword_slot_is_not_overwritten_by_positional() {
    let schema = [ArgumentInfo::optional("a"), ArgumentInfo::optional("b")];
    let params = CallParams::new()
        .with_pos(Expression::constant(Value::int(5)))
        .with_kw("a", Expression::constant(Value::int(1)));
    let args = parse_call_params(&schema, &params).unwrap();
    // The positional lands on the first unbound slot.
    assert_eq!(eval_bound(&args, "a"), Value::int(1));
    assert_eq!(eval_bound(&args, "b"), Value::int(5));
}

#[test]
fn test_defaults_fill_unbound_slots() {
    let schema = [
        ArgumentInfo::required("stop"),
        ArgumentInfo::with_default("step", Value::int(1)),
    ];
    let params = pos(Value::int(10));
    let args = parse_call_params(&schema, &params).unwrap();
    assert_eq!(eval_bound(&args, "stop"), Value::int(10));
    assert_eq!(eval_bound(&args, "step"), Value::int(1));
}

#[test]
fn test_optional_without_default_stays_unbound() {
    let schema = [ArgumentInfo::required("stop"), ArgumentInfo::optional("step")];
    let args = parse_call_params(&schema, &pos(Value::int(10))).unwrap();
    assert!(args.get("step").is_none());
    assert!(eval_bound(&args, "step").is_empty());
}

#[test]
fn test_missing_mandatory_fails() {
    let schema = [ArgumentInfo::required("a"), ArgumentInfo::required("b")];
    let result = parse_call_params(&schema, &pos(Value::int(1)));
    assert!(result.is_err());
    let message = result.err().unwrap().to_string();
    assert!(message.contains('b'), "unexpected message: {message}");
}

#[test]
fn test_success_implies_all_mandatory_bound() {
    let schema = [
        ArgumentInfo::required("a"),
        ArgumentInfo::with_default("b", Value::int(0)),
        ArgumentInfo::required("c"),
    ];
    let params = CallParams::new()
        .with_pos(Expression::constant(Value::int(1)))
        .with_kw("c", Expression::constant(Value::int(3)));
    let args = parse_call_params(&schema, &params).unwrap();
    for info in &schema {
        if info.mandatory {
            assert!(args.get(&info.name).is_some(), "unbound mandatory {}", info.name);
        }
    }
}

#[test]
fn test_placeholder_slots_are_ignored() {
    // (a, *args, **kwargs) with f(1, 2, 3, x=5): a binds, the rest are
    // extras; placeholders never consume arguments.
    let schema = [
        ArgumentInfo::required("a"),
        ArgumentInfo::optional("*args"),
        ArgumentInfo::optional("**kwargs"),
    ];
    let params = CallParams::new()
        .with_pos(Expression::constant(Value::int(1)))
        .with_pos(Expression::constant(Value::int(2)))
        .with_pos(Expression::constant(Value::int(3)))
        .with_kw("x", Expression::constant(Value::int(5)));
    let args = parse_call_params(&schema, &params).unwrap();
    assert_eq!(eval_bound(&args, "a"), Value::int(1));
    assert_eq!(args.extra_pos.len(), 2);
    assert_eq!(args.extra_kw.len(), 1);
    assert_eq!(args.extra_kw[0].0, "x");
}

#[test]
fn test_placeholder_between_real_slots() {
    let schema = [
        ArgumentInfo::required("a"),
        ArgumentInfo::optional("*args"),
        ArgumentInfo::required("b"),
    ];
    let params = CallParams::new()
        .with_pos(Expression::constant(Value::int(1)))
        .with_pos(Expression::constant(Value::int(2)));
    let args = parse_call_params(&schema, &params).unwrap();
    assert_eq!(eval_bound(&args, "a"), Value::int(1));
    assert_eq!(eval_bound(&args, "b"), Value::int(2));
    assert!(args.extra_pos.is_empty());
}

#[test]
fn test_surplus_positionals_become_extras() {
    let schema = [ArgumentInfo::required("a")];
    let params = CallParams::new()
        .with_pos(Expression::constant(Value::int(1)))
        .with_pos(Expression::constant(Value::int(2)));
    let args = parse_call_params(&schema, &params).unwrap();
    assert_eq!(eval_bound(&args, "a"), Value::int(1));
    assert_eq!(args.extra_pos.len(), 1);
}

#[test]
fn test_positional_with_fully_keyword_bound_schema() {
    let schema = [ArgumentInfo::required("a")];
    let params = CallParams::new()
        .with_pos(Expression::constant(Value::int(5)))
        .with_kw("a", Expression::constant(Value::int(1)));
    let args = parse_call_params(&schema, &params).unwrap();
    assert_eq!(eval_bound(&args, "a"), Value::int(1));
    assert_eq!(args.extra_pos.len(), 1);
}

#[test]
fn test_unknown_keyword_becomes_extra() {
    let schema = [ArgumentInfo::required("a")];
    let params = pos(Value::int(1)).with_kw("zzz", Expression::constant(Value::int(9)));
    let args = parse_call_params(&schema, &params).unwrap();
    assert_eq!(args.extra_kw.len(), 1);
    assert_eq!(args.extra_kw[0].0, "zzz");
}

#[test]
fn test_empty_schema_and_params() {
    let args = parse_call_params(&[], &CallParams::new()).unwrap();
    assert!(args.args.is_empty());
    assert!(args.extra_pos.is_empty());
    assert!(args.extra_kw.is_empty());
}

#[test]
fn test_leading_optionals_yield_to_mandatory() {
    // (opt, mand) called with one positional: the mandatory slot wins it.
    let schema = [
        ArgumentInfo::optional("opt"),
        ArgumentInfo::required("mand"),
    ];
    let args = parse_call_params(&schema, &pos(Value::int(7))).unwrap();
    assert!(args.get("opt").is_none());
    assert_eq!(eval_bound(&args, "mand"), Value::int(7));
}

#[test]
fn test_leading_optionals_consumed_when_no_mandatory_skipped() {
    let schema = [
        ArgumentInfo::optional("start"),
        ArgumentInfo::required("stop"),
    ];
    let params = CallParams::new()
        .with_pos(Expression::constant(Value::int(1)))
        .with_pos(Expression::constant(Value::int(10)));
    let args = parse_call_params(&schema, &params).unwrap();
    assert_eq!(eval_bound(&args, "start"), Value::int(1));
    assert_eq!(eval_bound(&args, "stop"), Value::int(10));
}
