//! One-parameter lambdas over a row: column accessors and predicates.

use crate::expression::{
    EvalResult, Expression, ExpressionEvaluator, Parameter, SynthesisError, SynthesisResult,
};
use crate::types::{MemberRef, Record, RecordType, TypeDesc, Value};
use std::fmt;
use std::sync::Arc;

/// A parameter plus a body in which it is the only free variable
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    parameter: Parameter,
    body: Expression,
}

impl Lambda {
    /// Create a lambda, rejecting bodies that reference any other parameter
    pub fn new(parameter: Parameter, body: Expression) -> SynthesisResult<Self> {
        let mut unbound = None;
        body.visit_parameters(&mut |p| {
            if *p != parameter && unbound.is_none() {
                unbound = Some(p.name().to_string());
            }
        });
        if let Some(name) = unbound {
            return Err(SynthesisError::UnboundParameter { name });
        }

        Ok(Self { parameter, body })
    }

    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    pub fn body(&self) -> &Expression {
        &self.body
    }

    pub fn return_type(&self) -> TypeDesc {
        self.body.static_type()
    }

    pub fn evaluate(&self, row: &Record) -> EvalResult<Value> {
        ExpressionEvaluator::new(&self.parameter, row)?.evaluate(&self.body)
    }

    /// Build a lambda over the same parameter from this one's body
    fn rebuild(&self, body: Expression) -> Self {
        Self {
            parameter: self.parameter.clone(),
            body,
        }
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.parameter.name(), self.body)
    }
}

/// Column accessor: `Row -> Value`
#[derive(Debug, Clone, PartialEq)]
pub struct Accessor(Lambda);

impl Accessor {
    pub fn new(parameter: Parameter, body: Expression) -> SynthesisResult<Self> {
        Lambda::new(parameter, body).map(Self)
    }

    /// `x => x.Name` over a fresh parameter
    pub fn property(record_type: &Arc<RecordType>, name: &str) -> SynthesisResult<Self> {
        let x = Parameter::new("x", TypeDesc::Record(record_type.clone()));
        let body = Expression::member(Expression::parameter(&x), name)?;
        Self::new(x, body)
    }

    /// `x => x.First.Second...` over a fresh parameter
    pub fn path(record_type: &Arc<RecordType>, path: &[&str]) -> SynthesisResult<Self> {
        let x = Parameter::new("x", TypeDesc::Record(record_type.clone()));
        let mut body = Expression::parameter(&x);
        for name in path {
            body = Expression::member(body, name)?;
        }
        Self::new(x, body)
    }

    /// Box the accessor's value to `Object`, as hosts do to store mixed columns
    pub fn boxed(&self) -> SynthesisResult<Self> {
        let body = Expression::convert(self.0.body.clone(), TypeDesc::Object)?;
        Ok(Self(self.0.rebuild(body)))
    }

    pub fn lambda(&self) -> &Lambda {
        &self.0
    }

    pub fn parameter(&self) -> &Parameter {
        self.0.parameter()
    }

    pub fn body(&self) -> &Expression {
        self.0.body()
    }

    /// Static type of the value the accessor reads, before any boxing
    pub fn value_type(&self) -> TypeDesc {
        self.0.body().strip_convert().static_type()
    }

    /// The member this accessor reads directly off its parameter.
    ///
    /// At most one conversion layer is looked through. Chains and other
    /// shapes yield `None`.
    pub fn member(&self) -> Option<&MemberRef> {
        match self.0.body().strip_convert() {
            Expression::Member { target, member }
                if matches!(target.as_ref(), Expression::Parameter(p) if p == self.parameter()) =>
            {
                Some(member)
            }
            _ => None,
        }
    }

    pub fn evaluate(&self, row: &Record) -> EvalResult<Value> {
        self.0.evaluate(row)
    }
}

impl fmt::Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Predicate: `Row -> bool`
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate(Lambda);

impl Predicate {
    /// Create a predicate; the body must be statically Boolean
    pub fn new(parameter: Parameter, body: Expression) -> SynthesisResult<Self> {
        match body.static_type() {
            TypeDesc::Boolean => Lambda::new(parameter, body).map(Self),
            actual => Err(SynthesisError::NonBooleanBody { actual }),
        }
    }

    pub fn lambda(&self) -> &Lambda {
        &self.0
    }

    pub fn parameter(&self) -> &Parameter {
        self.0.parameter()
    }

    pub fn body(&self) -> &Expression {
        self.0.body()
    }

    /// Logical negation over the same parameter
    pub fn not(&self) -> Predicate {
        Self(self.0.rebuild(Expression::Not(Box::new(self.0.body.clone()))))
    }

    /// Short-circuit conjunction of two predicates over the same parameter
    pub fn and(&self, other: &Predicate) -> SynthesisResult<Predicate> {
        self.check_same_parameter(other)?;
        Ok(Self(self.0.rebuild(Expression::And {
            left: Box::new(self.0.body.clone()),
            right: Box::new(other.0.body.clone()),
        })))
    }

    /// Short-circuit disjunction of two predicates over the same parameter
    pub fn or(&self, other: &Predicate) -> SynthesisResult<Predicate> {
        self.check_same_parameter(other)?;
        Ok(Self(self.0.rebuild(Expression::Or {
            left: Box::new(self.0.body.clone()),
            right: Box::new(other.0.body.clone()),
        })))
    }

    pub fn evaluate(&self, row: &Record) -> EvalResult<bool> {
        ExpressionEvaluator::new(self.parameter(), row)?.evaluate_predicate(self.body())
    }

    /// Rows for which the predicate holds; the first evaluation error aborts
    pub fn filter<'r, I>(&self, rows: I) -> EvalResult<Vec<&'r Record>>
    where
        I: IntoIterator<Item = &'r Record>,
    {
        let mut matched = Vec::new();
        for row in rows {
            if self.evaluate(row)? {
                matched.push(row);
            }
        }
        Ok(matched)
    }

    fn check_same_parameter(&self, other: &Predicate) -> SynthesisResult<()> {
        if self.parameter() == other.parameter() {
            Ok(())
        } else {
            Err(SynthesisError::ParameterMismatch)
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
