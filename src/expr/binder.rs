//! Call-parameter binding.
//!
//! Reconciles a caller's mixed positional and keyword arguments against a
//! callee's declared parameter schema. The algorithm runs in two passes:
//! a keyword pass that binds named arguments and threads the still-unbound
//! schema slots onto a doubly-linked chain (two parallel index arrays),
//! then a window-location loop that decides which unbound slots the
//! positional arguments may fill. Positionals start at the first unbound
//! mandatory slot, so leading optional slots are consumed only when no
//! mandatory slot would be skipped. Slots named `*args` or `**kwargs` are
//! placeholders and never consume an argument; leftovers become extras.

use rustc_hash::FxHashMap;

use crate::context::RenderContext;
use crate::errors::{missing_argument, Error};
use crate::value::Value;

use super::{CallParams, ExprPtr, Expression};

/// A callee's declared parameter.
#[derive(Clone, Debug)]
pub struct ArgumentInfo {
    /// Parameter name. `*args` and `**kwargs` mark placeholder slots.
    pub name: String,
    /// Whether a call must bind this parameter.
    pub mandatory: bool,
    /// Default value; the empty value means no default.
    pub default: Value,
}

impl ArgumentInfo {
    /// A mandatory parameter.
    pub fn required(name: impl Into<String>) -> Self {
        ArgumentInfo {
            name: name.into(),
            mandatory: true,
            default: Value::empty(),
        }
    }

    /// An optional parameter without a default.
    pub fn optional(name: impl Into<String>) -> Self {
        ArgumentInfo {
            name: name.into(),
            mandatory: false,
            default: Value::empty(),
        }
    }

    /// An optional parameter with a default.
    pub fn with_default(name: impl Into<String>, default: Value) -> Self {
        ArgumentInfo {
            name: name.into(),
            mandatory: false,
            default,
        }
    }
}

/// The binder's output: bound arguments plus extras.
#[derive(Default)]
pub struct ParsedArguments {
    /// Bound arguments by declared name. Defaults appear as constant
    /// expressions.
    pub args: FxHashMap<String, ExprPtr>,
    /// Positional arguments beyond the consumed count.
    pub extra_pos: Vec<ExprPtr>,
    /// Keyword arguments matching no declared name.
    pub extra_kw: Vec<(String, ExprPtr)>,
}

impl ParsedArguments {
    /// The expression bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&ExprPtr> {
        self.args.get(name)
    }

    /// Evaluate the expression bound to `name`, or the empty value.
    pub fn eval(&self, name: &str, ctx: &mut RenderContext) -> Value {
        self.args
            .get(name)
            .map(|expr| expr.evaluate(ctx))
            .unwrap_or_else(Value::empty)
    }
}

#[derive(Clone, Copy, PartialEq)]
enum SlotState {
    NotFound,
    NotFoundMandatory,
    Keyword,
    Positional,
    Ignored,
}

struct Slot {
    state: SlotState,
    prev_unbound: isize,
    next_unbound: isize,
}

/// Bind a caller's arguments against a declared schema.
///
/// Fails when a mandatory parameter ends up unbound; everything else
/// (surplus positionals, unknown keywords) lands in the extras.
pub fn parse_call_params(
    schema: &[ArgumentInfo],
    params: &CallParams,
) -> Result<ParsedArguments, Error> {
    let mut slots: Vec<Slot> = schema
        .iter()
        .map(|_| Slot {
            state: SlotState::NotFound,
            prev_unbound: -1,
            next_unbound: -1,
        })
        .collect();

    let mut result = ParsedArguments::default();
    let mut first_mandatory: isize = -1;
    let mut prev_unbound: isize = -1;

    // Keyword pass: bind named arguments, chain the unbound slots.
    for (idx, info) in schema.iter().enumerate() {
        if info.name == "*args" || info.name == "**kwargs" {
            slots[idx].state = SlotState::Ignored;
            continue;
        }

        if let Some(expr) = params.kw_get(&info.name) {
            result.args.insert(info.name.clone(), expr.clone());
            slots[idx].state = SlotState::Keyword;
        } else {
            if info.mandatory {
                slots[idx].state = SlotState::NotFoundMandatory;
                if first_mandatory == -1 {
                    first_mandatory = idx as isize;
                }
            }
            if prev_unbound != -1 {
                slots[prev_unbound as usize].next_unbound = idx as isize;
            }
            slots[idx].prev_unbound = prev_unbound;
            prev_unbound = idx as isize;
        }
    }

    // Locate the scanning window for positional arguments and count how
    // many of them the unbound slots can absorb.
    let mut start_pos = if first_mandatory == -1 {
        0
    } else {
        first_mandatory as usize
    };
    let mut cur_pos = start_pos;
    let mut eaten: usize = 0;
    let mut first_time = true;

    while eaten < params.pos.len() && start_pos < schema.len() {
        if first_time {
            while start_pos < schema.len()
                && matches!(
                    slots[start_pos].state,
                    SlotState::Keyword | SlotState::Positional
                )
            {
                start_pos += 1;
            }
            first_time = false;
            if start_pos == schema.len() {
                break;
            }
        } else {
            let prev = slots[start_pos].prev_unbound;
            if prev != -1 {
                start_pos = prev as usize;
            } else if cur_pos == schema.len() {
                break;
            } else {
                let next = slots[cur_pos].next_unbound;
                if next == -1 {
                    break;
                }
                cur_pos = next as usize;
            }
        }
        eaten += usize::from(slots[start_pos].state != SlotState::Ignored);
    }

    // Walk the unbound chain, handing out positionals in caller order.
    let mut cur_arg = start_pos as isize;
    for idx in 0..eaten {
        if cur_arg == -1 || cur_arg as usize >= slots.len() {
            break;
        }
        let c = cur_arg as usize;
        if slots[c].state != SlotState::Ignored {
            result
                .args
                .insert(schema[c].name.clone(), params.pos[idx].clone());
            slots[c].state = SlotState::Positional;
        }
        cur_arg = slots[c].next_unbound;
    }

    // Fill defaults for the still-unbound slots and check for mandatory.
    let mut missing: Option<&str> = None;
    for (idx, slot) in slots.iter().enumerate() {
        match slot.state {
            SlotState::Positional | SlotState::Keyword | SlotState::Ignored => {}
            SlotState::NotFound => {
                if !schema[idx].default.is_empty() {
                    result.args.insert(
                        schema[idx].name.clone(),
                        Expression::constant(schema[idx].default.clone()),
                    );
                }
            }
            SlotState::NotFoundMandatory => {
                missing.get_or_insert(&schema[idx].name);
            }
        }
    }
    if let Some(name) = missing {
        return Err(missing_argument(name));
    }

    // Collect the extras.
    for (name, expr) in &params.kw {
        if !result.args.contains_key(name) {
            result.extra_kw.push((name.clone(), expr.clone()));
        }
    }
    for expr in params.pos.iter().skip(eaten) {
        result.extra_pos.push(expr.clone());
    }

    Ok(result)
}
