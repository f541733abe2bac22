//! Method registry.
//!
//! Methods are looked up once, when a predicate is synthesized, by exact
//! (declaring type, name, parameter types) signature. The resolved
//! `MethodRef` carries its implementation, so evaluating a predicate never
//! performs a lookup.

pub mod builtins;
pub mod registry;

pub use builtins::{ordinal, ordinal_ignore_case, string_comparison, string_comparison_type};
pub use registry::{Dispatch, MethodFn, MethodKey, MethodRef, MethodRegistry};
