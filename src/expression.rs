//! Expression trees over a single row.
//!
//! This module provides:
//! - Expression AST representation (member access, literals, calls, NOT/AND/OR)
//! - Typed one-parameter lambdas: column accessors and predicates
//! - Expression evaluation against rows
//! - Synthesis and evaluation error types

pub mod error;
pub mod eval;
pub mod expr;
pub mod lambda;

pub use error::{EvalError, EvalResult, SynthesisError, SynthesisResult};
pub use eval::{evaluate_expression, ExpressionEvaluator};
pub use expr::{Expression, Literal, Parameter};
pub use lambda::{Accessor, Lambda, Predicate};
