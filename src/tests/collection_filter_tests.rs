//! Tests for the sequence and formatting filters.

use rustc_hash::FxHashMap;

use crate::context::RenderContext;
use crate::expr::{CallParams, Expression};
use crate::filters::create_filter;
use crate::value::Value;

fn apply(name: &str, params: CallParams, input: Value) -> Value {
    let filter = create_filter(name, params).unwrap();
    let mut ctx = RenderContext::default();
    filter.filter(input, &mut ctx)
}

fn person(name: &str, age: i64) -> Value {
    let mut entries = FxHashMap::default();
    entries.insert("name".to_string(), Value::string(name));
    entries.insert("age".to_string(), Value::int(age));
    Value::map(entries)
}

#[test]
fn test_pprint() {
    assert_eq!(
        apply("pprint", CallParams::new(), Value::string("hi")),
        Value::string("'hi'")
    );
    assert_eq!(
        apply("pprint", CallParams::new(), Value::int(42)),
        Value::string("42")
    );
    assert_eq!(
        apply(
            "pprint",
            CallParams::new(),
            Value::list(vec![Value::int(1), Value::string("a")])
        ),
        Value::string("[1, 'a']")
    );
}

#[test]
fn test_default_on_empty() {
    let params = CallParams::new().with_pos(Expression::constant(Value::string("fallback")));
    assert_eq!(
        apply("default", params, Value::empty()),
        Value::string("fallback")
    );
}

#[test]
fn test_default_passes_non_empty_through() {
    let params = CallParams::new().with_pos(Expression::constant(Value::string("fallback")));
    assert_eq!(apply("default", params, Value::int(0)), Value::int(0));
}

#[test]
fn test_default_boolean_mode_replaces_falsy() {
    let params = CallParams::new()
        .with_pos(Expression::constant(Value::string("fallback")))
        .with_pos(Expression::constant(Value::boolean(true)));
    assert_eq!(
        apply("default", params, Value::int(0)),
        Value::string("fallback")
    );
}

#[test]
fn test_join_with_delimiter() {
    let params = CallParams::new().with_pos(Expression::constant(Value::string(", ")));
    let input = Value::list(vec![Value::int(1), Value::int(2), Value::int(3)]);
    assert_eq!(apply("join", params, input), Value::string("1, 2, 3"));
}

#[test]
fn test_join_default_delimiter_is_empty() {
    let input = Value::list(vec![Value::string("a"), Value::string("b")]);
    assert_eq!(apply("join", CallParams::new(), input), Value::string("ab"));
}

#[test]
fn test_join_with_attribute() {
    let params = CallParams::new()
        .with_pos(Expression::constant(Value::string("-")))
        .with_kw("attribute", Expression::constant(Value::string("name")));
    let input = Value::list(vec![person("ada", 36), person("alan", 41)]);
    assert_eq!(apply("join", params, input), Value::string("ada-alan"));
}

#[test]
fn test_list_of_string_splits_chars() {
    assert_eq!(
        apply("list", CallParams::new(), Value::string("abc")),
        Value::list(vec![
            Value::string("a"),
            Value::string("b"),
            Value::string("c")
        ])
    );
}

#[test]
fn test_list_materializes_generated() {
    let generated = Value::generated_list(3, |i| Value::int(i as i64));
    assert_eq!(
        apply("list", CallParams::new(), generated),
        Value::list(vec![Value::int(0), Value::int(1), Value::int(2)])
    );
}

#[test]
fn test_list_of_map_is_sorted_keys() {
    assert_eq!(
        apply("list", CallParams::new(), person("ada", 36)),
        Value::list(vec![Value::string("age"), Value::string("name")])
    );
}

#[test]
fn test_map_with_named_filter() {
    let params = CallParams::new().with_pos(Expression::constant(Value::string("upper")));
    let input = Value::list(vec![Value::string("ab"), Value::string("cd")]);
    let result = apply("map", params, input);
    assert_eq!(result.display_value(), "['AB', 'CD']");
}

#[test]
fn test_map_with_filter_arguments() {
    let params = CallParams::new()
        .with_pos(Expression::constant(Value::string("replace")))
        .with_pos(Expression::constant(Value::string("a")))
        .with_pos(Expression::constant(Value::string("o")));
    let input = Value::list(vec![Value::string("cat"), Value::string("bat")]);
    let result = apply("map", params, input);
    assert_eq!(result.display_value(), "['cot', 'bot']");
}

#[test]
fn test_map_with_attribute() {
    let params =
        CallParams::new().with_kw("attribute", Expression::constant(Value::string("age")));
    let input = Value::list(vec![person("ada", 36), person("alan", 41)]);
    assert_eq!(
        apply("map", params, input),
        Value::list(vec![Value::int(36), Value::int(41)])
    );
}

#[test]
fn test_select_by_truthiness() {
    let input = Value::list(vec![
        Value::int(0),
        Value::int(1),
        Value::string(""),
        Value::string("x"),
    ]);
    assert_eq!(
        apply("select", CallParams::new(), input),
        Value::list(vec![Value::int(1), Value::string("x")])
    );
}

#[test]
fn test_select_with_tester() {
    let params = CallParams::new().with_pos(Expression::constant(Value::string("odd")));
    let input = Value::list(vec![Value::int(1), Value::int(2), Value::int(3)]);
    assert_eq!(
        apply("select", params, input),
        Value::list(vec![Value::int(1), Value::int(3)])
    );
}

#[test]
fn test_select_with_tester_arguments() {
    let params = CallParams::new()
        .with_pos(Expression::constant(Value::string("equalto")))
        .with_pos(Expression::constant(Value::int(2)));
    let input = Value::list(vec![Value::int(1), Value::int(2), Value::int(2)]);
    assert_eq!(
        apply("select", params, input),
        Value::list(vec![Value::int(2), Value::int(2)])
    );
}

#[test]
fn test_reject_inverts_selection() {
    let params = CallParams::new().with_pos(Expression::constant(Value::string("odd")));
    let input = Value::list(vec![Value::int(1), Value::int(2), Value::int(3)]);
    assert_eq!(apply("reject", params, input), Value::list(vec![Value::int(2)]));
}

#[test]
fn test_sort_numbers() {
    let input = Value::list(vec![Value::int(3), Value::int(1), Value::int(2)]);
    assert_eq!(
        apply("sort", CallParams::new(), input),
        Value::list(vec![Value::int(1), Value::int(2), Value::int(3)])
    );
}

#[test]
fn test_sort_reverse() {
    let params = CallParams::new().with_kw("reverse", Expression::constant(Value::boolean(true)));
    let input = Value::list(vec![Value::int(3), Value::int(1), Value::int(2)]);
    assert_eq!(
        apply("sort", params, input),
        Value::list(vec![Value::int(3), Value::int(2), Value::int(1)])
    );
}

#[test]
fn test_sort_strings_case_insensitive_by_default() {
    let input = Value::list(vec![
        Value::string("banana"),
        Value::string("Apple"),
        Value::string("cherry"),
    ]);
    assert_eq!(
        apply("sort", CallParams::new(), input).display_value(),
        "['Apple', 'banana', 'cherry']"
    );
}

#[test]
fn test_sort_by_attribute() {
    let params =
        CallParams::new().with_kw("attribute", Expression::constant(Value::string("age")));
    let input = Value::list(vec![person("alan", 41), person("ada", 36)]);
    let result = apply("sort", params, input);
    let first = crate::expr::subscript(
        &crate::expr::subscript(&result, &Value::int(0)),
        &Value::string("name"),
    );
    assert_eq!(first, Value::string("ada"));
}

#[test]
fn test_length() {
    assert_eq!(
        apply("length", CallParams::new(), Value::string("héllo")),
        Value::int(5)
    );
    assert_eq!(
        apply("length", CallParams::new(), Value::list(vec![Value::int(1)])),
        Value::int(1)
    );
    assert_eq!(
        apply("length", CallParams::new(), person("ada", 36)),
        Value::int(2)
    );
    assert!(apply("length", CallParams::new(), Value::int(5)).is_empty());
}

#[test]
fn test_sequence_filters_reject_non_sequences() {
    assert!(apply("join", CallParams::new(), Value::int(1)).is_empty());
    assert!(apply("sort", CallParams::new(), Value::string("abc")).is_empty());
    assert!(apply("select", CallParams::new(), Value::int(1)).is_empty());
}
