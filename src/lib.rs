//! Typed predicate synthesis for data-grid column filters.
//!
//! Column accessors and predicates are small expression trees over one row
//! parameter. Methods they call are resolved from an explicit
//! [`method::MethodRegistry`] when the predicate is built.

pub mod expression;
pub mod filter;
pub mod method;
pub mod synthesis;
pub mod types;

pub use expression::{Accessor, EvalError, Predicate, SynthesisError};
pub use filter::{StringCondition, StringFilter};
pub use method::MethodRegistry;
pub use types::{Record, RecordType, TypeDesc, Value};
