//! Output contracts between the core and the statement renderer.
//!
//! The core writes through `OutStream` and coerces values to strings of
//! the template's width through `RendererCallback`. The callback is the
//! seam the surrounding renderer implements; two stock implementations
//! cover the narrow and wide cases.

use std::sync::Arc;

use crate::value::{TargetString, Value};

/// A sink the renderer exposes for expression output.
pub trait OutStream {
    /// Write one evaluated value.
    fn write_value(&mut self, value: &Value);
}

/// Renderer-side services the core borrows during evaluation: coercion of
/// any value to the template's target string width.
pub trait RendererCallback: Send + Sync {
    /// Render `value` as a target string of the template's width.
    fn as_target_string(&self, value: &Value) -> TargetString;
}

/// Callback for templates rendering narrow (UTF-8) output.
#[derive(Clone, Copy, Debug, Default)]
pub struct NarrowRenderer;

impl RendererCallback for NarrowRenderer {
    fn as_target_string(&self, value: &Value) -> TargetString {
        TargetString::Narrow(value.display_value())
    }
}

/// Callback for templates rendering wide output.
#[derive(Clone, Copy, Debug, Default)]
pub struct WideRenderer;

impl RendererCallback for WideRenderer {
    fn as_target_string(&self, value: &Value) -> TargetString {
        match value.as_wide() {
            Some(w) => TargetString::Wide(w.to_vec()),
            None => TargetString::Wide(value.display_value().chars().collect()),
        }
    }
}

/// An `OutStream` accumulating into a target string, used to capture the
/// output of statement callables invoked in value position.
pub struct TargetStringStream {
    target: TargetString,
    callback: Arc<dyn RendererCallback>,
}

impl TargetStringStream {
    /// Create a stream whose width follows the callback.
    pub fn new(callback: Arc<dyn RendererCallback>) -> Self {
        // An empty value renders as an empty string of the right width.
        let target = callback.as_target_string(&Value::empty());
        TargetStringStream { target, callback }
    }

    /// Finish writing and take the accumulated string.
    pub fn into_target(self) -> TargetString {
        self.target
    }
}

impl OutStream for TargetStringStream {
    fn write_value(&mut self, value: &Value) {
        let piece = self.callback.as_target_string(value);
        self.target.append(&piece);
    }
}
