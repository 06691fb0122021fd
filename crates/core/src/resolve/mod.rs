//! Implicit request resolution.

pub mod filter_index;

pub use filter_index::{DataMatcher, FilterIndex, SchemeMatcher};
