//! Output strings with a fixed character width.
//!
//! A `TargetString` is the string shape the surrounding template writes
//! into: either narrow (UTF-8) or wide (one `char` per code point). The
//! renderer callback picks the width once per render; values of mixed
//! width are normalized through it before they meet in an operation.

use std::fmt;

/// An output string whose width is determined by the renderer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetString {
    /// UTF-8 string.
    Narrow(String),
    /// Wide string, one `char` per code point.
    Wide(Vec<char>),
}

impl TargetString {
    /// Create an empty target of the same width as `self`.
    #[inline]
    pub fn new_like(&self) -> TargetString {
        match self {
            TargetString::Narrow(_) => TargetString::Narrow(String::new()),
            TargetString::Wide(_) => TargetString::Wide(Vec::new()),
        }
    }

    /// Length in code points.
    pub fn len(&self) -> usize {
        match self {
            TargetString::Narrow(s) => s.chars().count(),
            TargetString::Wide(w) => w.len(),
        }
    }

    /// Check whether the string is empty.
    pub fn is_empty(&self) -> bool {
        match self {
            TargetString::Narrow(s) => s.is_empty(),
            TargetString::Wide(w) => w.is_empty(),
        }
    }

    /// Append a single character, respecting the target width.
    #[inline]
    pub fn push(&mut self, ch: char) {
        match self {
            TargetString::Narrow(s) => s.push(ch),
            TargetString::Wide(w) => w.push(ch),
        }
    }

    /// Append another target string. A width mismatch is resolved in favor
    /// of `self`'s width, one character at a time.
    pub fn append(&mut self, other: &TargetString) {
        match (self, other) {
            (TargetString::Narrow(dst), TargetString::Narrow(src)) => dst.push_str(src),
            (TargetString::Wide(dst), TargetString::Wide(src)) => dst.extend_from_slice(src),
            (TargetString::Narrow(dst), TargetString::Wide(src)) => dst.extend(src.iter()),
            (TargetString::Wide(dst), TargetString::Narrow(src)) => dst.extend(src.chars()),
        }
    }
}

impl fmt::Display for TargetString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetString::Narrow(s) => f.write_str(s),
            TargetString::Wide(w) => {
                for ch in w {
                    fmt::Write::write_char(f, *ch)?;
                }
                Ok(())
            }
        }
    }
}
