//! Error types for predicate synthesis and evaluation.

use crate::method::Dispatch;
use crate::types::{MemberKind, TypeDesc};
use thiserror::Error;

/// Configuration defects detected while building an expression.
///
/// These are raised at synthesis time, never deferred to the first row.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    #[error("Method not found: {declaring}.{name}({})", join_types(.parameters))]
    MethodNotFound {
        declaring: TypeDesc,
        name: String,
        parameters: Vec<TypeDesc>,
    },

    #[error("Method already registered: {declaring}.{name}({})", join_types(.parameters))]
    DuplicateMethod {
        declaring: TypeDesc,
        name: String,
        parameters: Vec<TypeDesc>,
    },

    #[error("Method {method} expects {expected} arguments, got {actual}")]
    ArgumentCountMismatch {
        method: String,
        expected: usize,
        actual: usize,
    },

    #[error("Argument {position} of {method} expects {expected}, got {actual}")]
    ArgumentTypeMismatch {
        method: String,
        position: usize,
        expected: TypeDesc,
        actual: String,
    },

    #[error("Method {method} is declared on {expected}, receiver is {actual}")]
    ReceiverTypeMismatch {
        method: String,
        expected: TypeDesc,
        actual: TypeDesc,
    },

    #[error("Method {method} is {actual}, expected {required}")]
    DispatchMismatch {
        method: String,
        actual: Dispatch,
        required: Dispatch,
    },

    #[error("Method {method} returns {actual}, a predicate must return Boolean")]
    NotAPredicate { method: String, actual: TypeDesc },

    #[error("Member {member} is a {kind:?}; expected a field, property or event")]
    InvalidMemberKind { member: String, kind: MemberKind },

    #[error("Type {owner} has no readable member {member}")]
    UnknownMember { owner: String, member: String },

    #[error("Cannot convert {from} to {to}")]
    InvalidConversion { from: TypeDesc, to: TypeDesc },

    #[error("Parameter {name} is not bound by the enclosing lambda")]
    UnboundParameter { name: String },

    #[error("Cannot combine predicates over different parameters")]
    ParameterMismatch,

    #[error("Predicate body must be Boolean, got {actual}")]
    NonBooleanBody { actual: TypeDesc },
}

/// Failures raised while evaluating an expression against a row
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Null reference at {target}")]
    NullReference { target: String },

    #[error("Parameter {name} is not bound to a row")]
    UnboundParameter { name: String },

    #[error("Argument {position} of {method} must not be null")]
    NullArgument { method: String, position: usize },

    #[error("Expected a row of type {expected}, got {actual}")]
    RecordTypeMismatch { expected: String, actual: String },

    #[error("Invalid row for {record}: {reason}")]
    RowShape { record: String, reason: String },

    #[error("Expected {expected} in {context}, got {actual}")]
    TypeMismatch {
        expected: String,
        actual: String,
        context: String,
    },

    #[error("Method {method} failed: {message}")]
    MethodFailed { method: String, message: String },
}

/// Result type for synthesis operations
pub type SynthesisResult<T> = Result<T, SynthesisError>;

/// Result type for evaluation
pub type EvalResult<T> = Result<T, EvalError>;

fn join_types(types: &[TypeDesc]) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SynthesisError::MethodNotFound {
            declaring: TypeDesc::String,
            name: "Frobnicate".to_string(),
            parameters: vec![TypeDesc::String, TypeDesc::Int32],
        };
        assert_eq!(
            err.to_string(),
            "Method not found: String.Frobnicate(String, Int32)"
        );

        let err = SynthesisError::ArgumentCountMismatch {
            method: "String.Contains".to_string(),
            expected: 1,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "Method String.Contains expects 1 arguments, got 2"
        );

        let err = SynthesisError::NotAPredicate {
            method: "String.CompareTo".to_string(),
            actual: TypeDesc::Int32,
        };
        assert_eq!(
            err.to_string(),
            "Method String.CompareTo returns Int32, a predicate must return Boolean"
        );

        let err = SynthesisError::InvalidMemberKind {
            member: "Describe".to_string(),
            kind: MemberKind::Method,
        };
        assert_eq!(
            err.to_string(),
            "Member Describe is a Method; expected a field, property or event"
        );

        let err = EvalError::NullReference {
            target: "String.StartsWith".to_string(),
        };
        assert_eq!(err.to_string(), "Null reference at String.StartsWith");
    }
}
