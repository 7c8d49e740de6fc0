//! The string-transforming filter suite.
//!
//! One converter type covers the eight character-level modes; each mode
//! consumes the piped value as a string slice of preserved width and
//! rebuilds a target string of the same width. Casing uses Unicode
//! default mappings. `wordcount` is the odd one out: it produces an
//! integer, not a string.

use crate::context::RenderContext;
use crate::errors::Error;
use crate::expr::{parse_call_params, ArgumentInfo, CallParams, ParsedArguments};
use crate::value::{convert_to_bool, convert_to_int, StringSlice, TargetString, Value};

use super::Filter;

/// Which transformation this converter performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Mode {
    Trim,
    Title,
    WordCount,
    Upper,
    Lower,
    Replace,
    Truncate,
    UrlEncode,
}

pub(super) struct StringConverter {
    mode: Mode,
    args: ParsedArguments,
}

impl StringConverter {
    pub(super) fn new(mode: Mode, params: CallParams) -> Result<Self, Error> {
        let args = match mode {
            Mode::Replace => parse_call_params(
                &[
                    ArgumentInfo::required("old"),
                    ArgumentInfo::required("new"),
                    ArgumentInfo::with_default("count", Value::int(0)),
                ],
                &params,
            )?,
            Mode::Truncate => parse_call_params(
                &[
                    ArgumentInfo::with_default("length", Value::int(255)),
                    ArgumentInfo::with_default("killwords", Value::boolean(false)),
                    ArgumentInfo::with_default("end", Value::string("...")),
                    ArgumentInfo::optional("leeway"),
                ],
                &params,
            )?,
            _ => ParsedArguments::default(),
        };
        Ok(StringConverter { mode, args })
    }

    pub(super) fn boxed(mode: Mode, params: CallParams) -> Result<Box<dyn Filter>, Error> {
        Ok(Box::new(StringConverter::new(mode, params)?))
    }
}

impl Filter for StringConverter {
    fn filter(&self, base: Value, ctx: &mut RenderContext) -> Value {
        let Some(slice) = base.string_slice() else {
            // Non-string input has no string reading; type errors are
            // silent empties.
            return Value::empty();
        };

        match self.mode {
            Mode::Trim => Value::target(trim(slice)),
            Mode::Title => Value::target(title(slice)),
            Mode::WordCount => Value::int(word_count(slice)).with_temporary(true),
            Mode::Upper => Value::target(recase(slice, true)),
            Mode::Lower => Value::target(recase(slice, false)),
            Mode::Replace => {
                let old = arg_as_chars(&self.args, "old", ctx);
                let new = arg_as_chars(&self.args, "new", ctx);
                let count = convert_to_int(&self.args.eval("count", ctx), 0);
                Value::target(replace(slice, &old, &new, count))
            }
            Mode::Truncate => {
                let length = convert_to_int(&self.args.eval("length", ctx), 0).max(0) as usize;
                let killwords = convert_to_bool(&self.args.eval("killwords", ctx));
                let end = arg_as_chars(&self.args, "end", ctx);
                let leeway = convert_to_int(&self.args.eval("leeway", ctx), 5).max(0) as usize;
                Value::target(truncate(slice, length, killwords, &end, leeway))
            }
            Mode::UrlEncode => Value::target(url_encode(slice)),
        }
    }
}

// Character plumbing

fn chars_of(slice: StringSlice<'_>) -> Box<dyn Iterator<Item = char> + '_> {
    match slice {
        StringSlice::Narrow(s) => Box::new(s.chars()),
        StringSlice::Wide(w) => Box::new(w.iter().copied()),
    }
}

fn empty_like(slice: StringSlice<'_>) -> TargetString {
    match slice {
        StringSlice::Narrow(_) => TargetString::Narrow(String::new()),
        StringSlice::Wide(_) => TargetString::Wide(Vec::new()),
    }
}

fn build_like(slice: StringSlice<'_>, chars: &[char]) -> TargetString {
    match slice {
        StringSlice::Narrow(_) => TargetString::Narrow(chars.iter().collect()),
        StringSlice::Wide(_) => TargetString::Wide(chars.to_vec()),
    }
}

/// Read a filter argument as characters, whatever its width.
fn arg_as_chars(args: &ParsedArguments, name: &str, ctx: &mut RenderContext) -> Vec<char> {
    let value = args.eval(name, ctx);
    if let Some(s) = value.as_narrow() {
        return s.chars().collect();
    }
    if let Some(w) = value.as_wide() {
        return w.to_vec();
    }
    Vec::new()
}

// Modes

/// Collapse internal whitespace runs to a single space and trim the ends.
fn trim(slice: StringSlice<'_>) -> TargetString {
    let mut out = empty_like(slice);
    let mut pending_space = false;
    for ch in chars_of(slice) {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }
    out
}

/// Capitalize the first alphabetic character after each non-alphanumeric
/// run. The delimiter state starts true so the first word is capitalized.
fn title(slice: StringSlice<'_>) -> TargetString {
    let mut out = empty_like(slice);
    let mut is_delim = true;
    for ch in chars_of(slice) {
        if is_delim && ch.is_alphabetic() {
            is_delim = false;
            for upper in ch.to_uppercase() {
                out.push(upper);
            }
            continue;
        }
        is_delim = !ch.is_alphanumeric();
        out.push(ch);
    }
    out
}

/// Count delimiter-to-alphanumeric transitions, i.e. maximal
/// alphanumeric runs.
fn word_count(slice: StringSlice<'_>) -> i64 {
    let mut count = 0;
    let mut is_delim = true;
    for ch in chars_of(slice) {
        if is_delim && ch.is_alphanumeric() {
            is_delim = false;
            count += 1;
            continue;
        }
        is_delim = !ch.is_alphanumeric();
    }
    count
}

fn recase(slice: StringSlice<'_>, upper: bool) -> TargetString {
    let mut out = empty_like(slice);
    for ch in chars_of(slice) {
        if ch.is_alphabetic() {
            if upper {
                for mapped in ch.to_uppercase() {
                    out.push(mapped);
                }
            } else {
                for mapped in ch.to_lowercase() {
                    out.push(mapped);
                }
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Replace occurrences of `old` with `new`, left to right and
/// non-overlapping. A count of zero replaces every occurrence.
fn replace(slice: StringSlice<'_>, old: &[char], new: &[char], count: i64) -> TargetString {
    let src: Vec<char> = chars_of(slice).collect();
    if old.is_empty() {
        return build_like(slice, &src);
    }

    let mut out: Vec<char> = Vec::with_capacity(src.len());
    let mut replaced: i64 = 0;
    let mut pos = 0;
    while pos < src.len() {
        let budget_left = count == 0 || replaced < count;
        if budget_left && src[pos..].starts_with(old) {
            out.extend_from_slice(new);
            pos += old.len();
            replaced += 1;
        } else {
            out.push(src[pos]);
            pos += 1;
        }
    }
    build_like(slice, &out)
}

/// Jinja-compatible truncation. The end marker counts toward `length`;
/// `leeway` extra alphanumerics may be scanned past the cut point before
/// the word containing it is dropped entirely.
fn truncate(
    slice: StringSlice<'_>,
    length: usize,
    killwords: bool,
    end: &[char],
    leeway: usize,
) -> TargetString {
    let src: Vec<char> = chars_of(slice).collect();
    if src.len() <= length {
        return build_like(slice, &src);
    }

    let cut = length.saturating_sub(end.len());

    if killwords {
        if src.len() > length.saturating_add(leeway) {
            let mut out = src[..cut].to_vec();
            out.extend_from_slice(end);
            return build_like(slice, &out);
        }
        return build_like(slice, &src);
    }

    let mut p = cut;
    let mut slack = leeway;
    while slack != 0 && p < src.len() && src[p].is_alphanumeric() {
        slack -= 1;
        p += 1;
    }
    if p == src.len() {
        return build_like(slice, &src);
    }

    if src[p].is_alphanumeric() {
        // Still inside a word: back out to its start.
        while p > 0 && src[p].is_alphanumeric() {
            p -= 1;
        }
    }

    let mut out = src[..p].to_vec();
    while out.last().is_some_and(|ch| ch.is_whitespace()) {
        out.pop();
    }
    out.extend_from_slice(end);
    build_like(slice, &out)
}

// Percent encoding

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

fn push_percent(out: &mut TargetString, byte: u8) {
    out.push('%');
    out.push(HEX_DIGITS[(byte >> 4) as usize] as char);
    out.push(HEX_DIGITS[(byte & 0x0f) as usize] as char);
}

fn is_reserved(ch: char) -> bool {
    matches!(
        ch,
        '+' | '"'
            | '%'
            | '-'
            | '!'
            | '#'
            | '$'
            | '&'
            | '\''
            | '('
            | ')'
            | '*'
            | ','
            | '/'
            | ':'
            | ';'
            | '='
            | '?'
            | '@'
            | '['
            | ']'
    )
}

/// Percent-encode for URLs: space becomes `+`, the reserved set and
/// non-ASCII are percent-encoded with uppercase hex. Narrow strings
/// encode their UTF-8 bytes; wide strings encode each code point's
/// significant bytes big-endian.
fn url_encode(slice: StringSlice<'_>) -> TargetString {
    match slice {
        StringSlice::Narrow(s) => {
            let mut out = TargetString::Narrow(String::new());
            for byte in s.bytes() {
                let ch = byte as char;
                if byte == b' ' {
                    out.push('+');
                } else if byte > 0x7f || is_reserved(ch) {
                    push_percent(&mut out, byte);
                } else {
                    out.push(ch);
                }
            }
            out
        }
        StringSlice::Wide(w) => {
            let mut out = TargetString::Wide(Vec::new());
            for &ch in w {
                if ch == ' ' {
                    out.push('+');
                    continue;
                }
                let code = ch as u32;
                if code <= 0x7f && !is_reserved(ch) {
                    out.push(ch);
                    continue;
                }
                if code > 0xff_ff_ff {
                    push_percent(&mut out, (code >> 24) as u8);
                }
                if code > 0xff_ff {
                    push_percent(&mut out, (code >> 16) as u8);
                }
                if code > 0xff {
                    push_percent(&mut out, (code >> 8) as u8);
                }
                push_percent(&mut out, code as u8);
            }
            out
        }
    }
}
