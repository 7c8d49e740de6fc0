//! Sequence and formatting filters.
//!
//! These follow Jinja semantics: `pprint`, `default`, `join`, `list`,
//! `map`, `select`, `reject`, `sort`, and `length`. The projecting
//! filters (`map`, `select`, `reject`) resolve their named filter or
//! tester lazily, because the name itself is an expression; a resolution
//! miss at render time follows the silent-empty policy.

use std::cmp::Ordering;

use crate::context::RenderContext;
use crate::errors::Error;
use crate::expr::{parse_call_params, subscript, ArgumentInfo, CallParams, ParsedArguments};
use crate::operators::value_order;
use crate::testers::create_tester;
use crate::value::{convert_to_bool, ListAdapter, Value, ValueData};

use super::{create_filter, Filter};

/// Elements of a sequence value, if it is one.
fn sequence_items(value: &Value) -> Option<Vec<Value>> {
    match value.data() {
        ValueData::List(list) => Some(list.iter().collect()),
        _ => None,
    }
}

/// Project an element through an attribute name (map key lookup).
fn project_attribute(item: &Value, attribute: &str) -> Value {
    subscript(item, &Value::string(attribute))
}

// pprint

pub(super) struct PPrint;

impl PPrint {
    pub(super) fn boxed(_params: CallParams) -> Result<Box<dyn Filter>, Error> {
        Ok(Box::new(PPrint))
    }
}

impl Filter for PPrint {
    fn filter(&self, base: Value, _ctx: &mut RenderContext) -> Value {
        Value::string(base.repr_value())
    }
}

// default

pub(super) struct Default_ {
    args: ParsedArguments,
}

impl Default_ {
    pub(super) fn boxed(params: CallParams) -> Result<Box<dyn Filter>, Error> {
        let args = parse_call_params(
            &[
                ArgumentInfo::with_default("default_value", Value::string("")),
                ArgumentInfo::with_default("boolean", Value::boolean(false)),
            ],
            &params,
        )?;
        Ok(Box::new(Default_ { args }))
    }
}

impl Filter for Default_ {
    fn filter(&self, base: Value, ctx: &mut RenderContext) -> Value {
        let falsy_counts = convert_to_bool(&self.args.eval("boolean", ctx));
        if base.is_empty() || (falsy_counts && !convert_to_bool(&base)) {
            self.args.eval("default_value", ctx)
        } else {
            base
        }
    }
}

// join

pub(super) struct Join {
    args: ParsedArguments,
}

impl Join {
    pub(super) fn boxed(params: CallParams) -> Result<Box<dyn Filter>, Error> {
        let args = parse_call_params(
            &[
                ArgumentInfo::with_default("d", Value::string("")),
                ArgumentInfo::optional("attribute"),
            ],
            &params,
        )?;
        Ok(Box::new(Join { args }))
    }
}

impl Filter for Join {
    fn filter(&self, base: Value, ctx: &mut RenderContext) -> Value {
        let Some(items) = sequence_items(&base) else {
            return Value::empty();
        };
        let delimiter = self.args.eval("d", ctx).display_value();
        let attribute = self.args.eval("attribute", ctx);

        let rendered: Vec<String> = items
            .iter()
            .map(|item| match attribute.as_narrow() {
                Some(attr) => project_attribute(item, attr).display_value(),
                None => item.display_value(),
            })
            .collect();
        Value::string(rendered.join(&delimiter))
    }
}

// list

pub(super) struct ListFilter;

impl ListFilter {
    pub(super) fn boxed(_params: CallParams) -> Result<Box<dyn Filter>, Error> {
        Ok(Box::new(ListFilter))
    }
}

impl Filter for ListFilter {
    fn filter(&self, base: Value, _ctx: &mut RenderContext) -> Value {
        if let Some(s) = base.as_narrow() {
            return Value::list(s.chars().map(|ch| Value::string(ch.to_string())).collect());
        }
        if let Some(w) = base.as_wide() {
            return Value::list(w.iter().map(|ch| Value::wide(vec![*ch])).collect());
        }
        match base.data() {
            ValueData::List(list) => Value::list(list.iter().collect()),
            ValueData::Map(map) => {
                let mut keys = map.keys();
                keys.sort();
                Value::list(keys.into_iter().map(Value::string).collect())
            }
            _ => Value::empty(),
        }
    }
}

// map

pub(super) struct MapFilter {
    params: CallParams,
}

impl MapFilter {
    pub(super) fn boxed(params: CallParams) -> Result<Box<dyn Filter>, Error> {
        Ok(Box::new(MapFilter { params }))
    }
}

impl Filter for MapFilter {
    fn filter(&self, base: Value, ctx: &mut RenderContext) -> Value {
        let Some(items) = sequence_items(&base) else {
            return Value::empty();
        };

        if let Some(attr_expr) = self.params.kw_get("attribute") {
            let attribute = attr_expr.evaluate(ctx);
            let Some(attr) = attribute.as_narrow() else {
                return Value::empty();
            };
            return Value::list(
                items
                    .iter()
                    .map(|item| project_attribute(item, attr))
                    .collect(),
            );
        }

        // First positional is the filter name, the rest are its arguments.
        let Some(name_expr) = self.params.pos.first() else {
            return Value::empty();
        };
        let name_val = name_expr.evaluate(ctx);
        let Some(name) = name_val.as_narrow() else {
            return Value::empty();
        };
        let inner_params = CallParams {
            pos: self.params.pos[1..].to_vec(),
            kw: self
                .params
                .kw
                .iter()
                .filter(|(kw_name, _)| kw_name != "attribute")
                .cloned()
                .collect(),
        };
        let Ok(inner) = create_filter(name, inner_params) else {
            return Value::empty();
        };

        Value::list(
            items
                .into_iter()
                .map(|item| inner.filter(item, ctx))
                .collect(),
        )
    }
}

// select / reject

pub(super) struct Select {
    params: CallParams,
    reject: bool,
}

impl Select {
    pub(super) fn boxed(params: CallParams, reject: bool) -> Result<Box<dyn Filter>, Error> {
        Ok(Box::new(Select { params, reject }))
    }
}

impl Filter for Select {
    fn filter(&self, base: Value, ctx: &mut RenderContext) -> Value {
        let Some(items) = sequence_items(&base) else {
            return Value::empty();
        };

        // Without a tester name, selection is plain truthiness.
        let tester = match self.params.pos.first() {
            None => None,
            Some(name_expr) => {
                let name_val = name_expr.evaluate(ctx);
                let Some(name) = name_val.as_narrow() else {
                    return Value::empty();
                };
                let tester_params = CallParams {
                    pos: self.params.pos[1..].to_vec(),
                    kw: self.params.kw.clone(),
                };
                match create_tester(name, tester_params) {
                    Ok(tester) => Some(tester),
                    Err(_) => return Value::empty(),
                }
            }
        };

        let mut kept = Vec::new();
        for item in items {
            let passes = match &tester {
                Some(tester) => tester.test(&item, ctx),
                None => convert_to_bool(&item),
            };
            if passes != self.reject {
                kept.push(item);
            }
        }
        Value::list(kept)
    }
}

// sort

pub(super) struct Sort {
    args: ParsedArguments,
}

impl Sort {
    pub(super) fn boxed(params: CallParams) -> Result<Box<dyn Filter>, Error> {
        let args = parse_call_params(
            &[
                ArgumentInfo::with_default("reverse", Value::boolean(false)),
                ArgumentInfo::with_default("case_sensitive", Value::boolean(false)),
                ArgumentInfo::optional("attribute"),
            ],
            &params,
        )?;
        Ok(Box::new(Sort { args }))
    }
}

impl Filter for Sort {
    fn filter(&self, base: Value, ctx: &mut RenderContext) -> Value {
        let Some(mut items) = sequence_items(&base) else {
            return Value::empty();
        };
        let reverse = convert_to_bool(&self.args.eval("reverse", ctx));
        let case_sensitive = convert_to_bool(&self.args.eval("case_sensitive", ctx));
        let attribute = self.args.eval("attribute", ctx);

        let key = |item: &Value| -> Value {
            match attribute.as_narrow() {
                Some(attr) => project_attribute(item, attr),
                None => item.clone(),
            }
        };

        items.sort_by(|a, b| {
            let (ka, kb) = (key(a), key(b));
            let ordering = if case_sensitive {
                value_order(&ka, &kb)
            } else {
                case_folded_order(&ka, &kb)
            };
            ordering.unwrap_or(Ordering::Equal)
        });
        if reverse {
            items.reverse();
        }
        Value::list_adapter(ListAdapter::materialized(items))
    }
}

fn case_folded_order(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(sa), Some(sb)) = (a.as_narrow(), b.as_narrow()) {
        return Some(sa.to_lowercase().cmp(&sb.to_lowercase()));
    }
    value_order(a, b)
}

// length

pub(super) struct Length;

impl Length {
    pub(super) fn boxed(_params: CallParams) -> Result<Box<dyn Filter>, Error> {
        Ok(Box::new(Length))
    }
}

impl Filter for Length {
    fn filter(&self, base: Value, _ctx: &mut RenderContext) -> Value {
        if let Some(s) = base.as_narrow() {
            return Value::int(s.chars().count() as i64);
        }
        if let Some(w) = base.as_wide() {
            return Value::int(w.len() as i64);
        }
        match base.data() {
            ValueData::List(list) => Value::int(list.len() as i64),
            ValueData::Map(map) => Value::int(map.len() as i64),
            _ => Value::empty(),
        }
    }
}
