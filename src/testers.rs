//! Named testers, the predicates behind `is` and `in`.
//!
//! Like filters, testers are resolved by name against a process-wide
//! registry populated on first use and immutable afterwards. A tester
//! answers a boolean question about a value in a render context.

use std::sync::OnceLock;

use rustc_hash::FxHashMap;

use crate::context::RenderContext;
use crate::errors::{unknown_tester, Error};
use crate::expr::{parse_call_params, ArgumentInfo, CallParams, ParsedArguments};
use crate::value::{Value, ValueData};

/// A named predicate over values.
pub trait Tester: Send + Sync {
    /// Test `value` in the given render context.
    fn test(&self, value: &Value, ctx: &mut RenderContext) -> bool;
}

type TesterFactory = fn(CallParams) -> Result<Box<dyn Tester>, Error>;

static REGISTRY: OnceLock<FxHashMap<&'static str, TesterFactory>> = OnceLock::new();

fn registry() -> &'static FxHashMap<&'static str, TesterFactory> {
    REGISTRY.get_or_init(|| {
        let mut testers: FxHashMap<&'static str, TesterFactory> = FxHashMap::default();
        testers.insert("in", InTester::boxed);
        testers.insert("defined", |_| Ok(Box::new(Defined)));
        testers.insert("undefined", |_| Ok(Box::new(Undefined)));
        testers.insert("odd", |_| Ok(Box::new(Odd)));
        testers.insert("even", |_| Ok(Box::new(Even)));
        testers.insert("string", |_| Ok(Box::new(IsString)));
        testers.insert("number", |_| Ok(Box::new(IsNumber)));
        testers.insert("sequence", |_| Ok(Box::new(IsSequence)));
        testers.insert("mapping", |_| Ok(Box::new(IsMapping)));
        testers.insert("equalto", EqualTo::boxed);
        tracing::debug!(count = testers.len(), "initialized tester registry");
        testers
    })
}

/// Create a tester by name. Unknown names are construction-time errors
/// surfaced to the template loader.
pub fn create_tester(name: &str, params: CallParams) -> Result<Box<dyn Tester>, Error> {
    let factory = registry().get(name).ok_or_else(|| unknown_tester(name))?;
    factory(params)
}

/// Membership check shared by the `in` operator and the `in` tester:
/// element of a list, key of a map, substring of a string.
pub fn value_contains(needle: &Value, seq: &Value) -> bool {
    match seq.data() {
        ValueData::List(list) => list.iter().any(|item| item.equals(needle)),
        ValueData::Map(map) => needle.as_narrow().is_some_and(|key| map.contains(key)),
        _ => {
            if let (Some(haystack), Some(sub)) = (seq.as_narrow(), needle.as_narrow()) {
                return haystack.contains(sub);
            }
            if let (Some(haystack), Some(sub)) = (seq.as_wide(), needle.as_wide()) {
                return sub.is_empty()
                    || haystack.windows(sub.len()).any(|window| window == sub);
            }
            false
        }
    }
}

// Built-in testers

struct InTester {
    args: ParsedArguments,
}

impl InTester {
    fn boxed(params: CallParams) -> Result<Box<dyn Tester>, Error> {
        let args = parse_call_params(&[ArgumentInfo::required("seq")], &params)?;
        Ok(Box::new(InTester { args }))
    }
}

impl Tester for InTester {
    fn test(&self, value: &Value, ctx: &mut RenderContext) -> bool {
        let seq = self.args.eval("seq", ctx);
        value_contains(value, &seq)
    }
}

struct Defined;

impl Tester for Defined {
    fn test(&self, value: &Value, _ctx: &mut RenderContext) -> bool {
        !value.is_empty()
    }
}

struct Undefined;

impl Tester for Undefined {
    fn test(&self, value: &Value, _ctx: &mut RenderContext) -> bool {
        value.is_empty()
    }
}

struct Odd;

impl Tester for Odd {
    fn test(&self, value: &Value, _ctx: &mut RenderContext) -> bool {
        matches!(value.data(), ValueData::Int(n) if n % 2 != 0)
    }
}

struct Even;

impl Tester for Even {
    fn test(&self, value: &Value, _ctx: &mut RenderContext) -> bool {
        matches!(value.data(), ValueData::Int(n) if n % 2 == 0)
    }
}

struct IsString;

impl Tester for IsString {
    fn test(&self, value: &Value, _ctx: &mut RenderContext) -> bool {
        value.as_narrow().is_some() || value.as_wide().is_some()
    }
}

struct IsNumber;

impl Tester for IsNumber {
    fn test(&self, value: &Value, _ctx: &mut RenderContext) -> bool {
        matches!(value.data(), ValueData::Int(_) | ValueData::Double(_))
    }
}

struct IsSequence;

impl Tester for IsSequence {
    fn test(&self, value: &Value, _ctx: &mut RenderContext) -> bool {
        // Strings subscript like sequences; maps are tested separately.
        matches!(value.data(), ValueData::List(_))
            || value.as_narrow().is_some()
            || value.as_wide().is_some()
    }
}

struct IsMapping;

impl Tester for IsMapping {
    fn test(&self, value: &Value, _ctx: &mut RenderContext) -> bool {
        matches!(value.data(), ValueData::Map(_))
    }
}

struct EqualTo {
    args: ParsedArguments,
}

impl EqualTo {
    fn boxed(params: CallParams) -> Result<Box<dyn Tester>, Error> {
        let args = parse_call_params(&[ArgumentInfo::required("value")], &params)?;
        Ok(Box::new(EqualTo { args }))
    }
}

impl Tester for EqualTo {
    fn test(&self, value: &Value, ctx: &mut RenderContext) -> bool {
        let other = self.args.eval("value", ctx);
        value.equals(&other)
    }
}
