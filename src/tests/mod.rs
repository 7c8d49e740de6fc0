//! Test modules relocated from implementation files.
//!
//! Inline test modules that would exceed a screenful live here instead,
//! next to the code they exercise.

mod binder_tests;
mod collection_filter_tests;
