//! Construction-time errors.
//!
//! Evaluation itself never fails: unknown names, type mismatches, zero
//! divisors, and out-of-range subscripts all yield the empty value.
//! `Error` surfaces only from the APIs that build evaluators, where a
//! template loader needs a human-readable message: unknown filter or
//! tester names, and argument lists that cannot satisfy a schema.

use std::fmt;

/// A construction-time error with a human-readable message.
#[derive(Clone, Debug)]
pub struct Error {
    message: String,
}

impl Error {
    /// Create an error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Error {
            message: message.into(),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}

// Registry Errors

/// Unknown filter name.
#[cold]
pub fn unknown_filter(name: &str) -> Error {
    Error::new(format!("can't find filter '{name}'"))
}

/// Unknown tester name.
#[cold]
pub fn unknown_tester(name: &str) -> Error {
    Error::new(format!("can't find tester '{name}'"))
}

// Binding Errors

/// A mandatory declared argument was not provided.
#[cold]
pub fn missing_argument(name: &str) -> Error {
    Error::new(format!("mandatory argument '{name}' is missing"))
}
