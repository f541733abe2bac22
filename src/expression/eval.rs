//! Expression evaluation implementation.

use crate::expression::{EvalError, EvalResult, Expression, Parameter};
use crate::types::{MemberRef, Record, TypeDesc, Value};
use std::borrow::Cow;
use std::sync::Arc;

/// Intermediate result: either the bound row itself or a value
enum Operand<'a> {
    Row(&'a Record),
    Value(Cow<'a, Value>),
}

impl<'a> Operand<'a> {
    fn into_value(self) -> Cow<'a, Value> {
        match self {
            Operand::Row(record) => Cow::Owned(Value::Record(Arc::new(record.clone()))),
            Operand::Value(value) => value,
        }
    }
}

/// Evaluator for expressions over a single row
pub struct ExpressionEvaluator<'a> {
    /// Parameter the row is bound to
    parameter: &'a Parameter,
    /// The row to evaluate against
    row: &'a Record,
}

impl<'a> ExpressionEvaluator<'a> {
    /// Bind `row` to `parameter`, checking the row's type
    pub fn new(parameter: &'a Parameter, row: &'a Record) -> EvalResult<Self> {
        if let TypeDesc::Record(expected) = parameter.ty() {
            let actual = row.record_type();
            if !Arc::ptr_eq(expected, actual) && expected != actual {
                return Err(EvalError::RecordTypeMismatch {
                    expected: expected.name().to_string(),
                    actual: actual.name().to_string(),
                });
            }
        }
        Ok(Self { parameter, row })
    }

    /// Evaluate an expression and return the result
    pub fn evaluate(&self, expr: &'a Expression) -> EvalResult<Value> {
        Ok(self.eval(expr)?.into_value().into_owned())
    }

    /// Evaluate an expression that must produce a boolean
    pub fn evaluate_predicate(&self, expr: &'a Expression) -> EvalResult<bool> {
        let value = self.eval(expr)?.into_value();
        Self::as_bool(&value, "predicate")
    }

    fn eval(&self, expr: &'a Expression) -> EvalResult<Operand<'a>> {
        match expr {
            Expression::Parameter(p) => {
                if p == self.parameter {
                    Ok(Operand::Row(self.row))
                } else {
                    Err(EvalError::UnboundParameter {
                        name: p.name().to_string(),
                    })
                }
            }

            Expression::Literal(lit) => Ok(Operand::Value(Cow::Borrowed(&lit.value))),

            Expression::Member { target, member } => {
                let target = self.eval(target)?;
                self.evaluate_member(target, member)
            }

            // Boxing and nullable lifting do not change the runtime value
            Expression::Convert { operand, .. } => self.eval(operand),

            Expression::Call {
                receiver,
                method,
                args,
            } => {
                let receiver = match receiver {
                    Some(receiver) => Some(self.eval(receiver)?.into_value()),
                    None => None,
                };
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg).map(Operand::into_value))
                    .collect::<EvalResult<Vec<_>>>()?;
                let arg_refs: Vec<&Value> = args.iter().map(|arg| arg.as_ref()).collect();

                let result = method.invoke(receiver.as_deref(), &arg_refs)?;
                Ok(Operand::Value(Cow::Owned(result)))
            }

            Expression::Not(operand) => {
                let value = self.eval(operand)?.into_value();
                let b = Self::as_bool(&value, "NOT")?;
                Ok(Operand::Value(Cow::Owned(Value::Boolean(!b))))
            }

            Expression::And { left, right } => {
                let left = self.eval(left)?.into_value();
                if !Self::as_bool(&left, "AND")? {
                    return Ok(Operand::Value(Cow::Owned(Value::Boolean(false))));
                }
                let right = self.eval(right)?.into_value();
                let b = Self::as_bool(&right, "AND")?;
                Ok(Operand::Value(Cow::Owned(Value::Boolean(b))))
            }

            Expression::Or { left, right } => {
                let left = self.eval(left)?.into_value();
                if Self::as_bool(&left, "OR")? {
                    return Ok(Operand::Value(Cow::Owned(Value::Boolean(true))));
                }
                let right = self.eval(right)?.into_value();
                let b = Self::as_bool(&right, "OR")?;
                Ok(Operand::Value(Cow::Owned(Value::Boolean(b))))
            }
        }
    }

    /// Read a member slot from a row or a nested record value
    fn evaluate_member(
        &self,
        target: Operand<'a>,
        member: &'a MemberRef,
    ) -> EvalResult<Operand<'a>> {
        let value = match target {
            Operand::Row(record) => Cow::Borrowed(record.get(member)?),
            Operand::Value(Cow::Borrowed(Value::Record(record))) => {
                Cow::Borrowed(record.get(member)?)
            }
            Operand::Value(Cow::Owned(Value::Record(record))) => {
                Cow::Owned(record.get(member)?.clone())
            }
            Operand::Value(value) if value.is_null() => {
                return Err(EvalError::NullReference {
                    target: format!("{}.{}", member.owner, member.name),
                })
            }
            Operand::Value(value) => {
                return Err(EvalError::TypeMismatch {
                    expected: member.owner.clone(),
                    actual: format!("{:?}", value),
                    context: format!("member access {}", member.name),
                })
            }
        };
        Ok(Operand::Value(value))
    }

    /// Strict boolean check: no truthiness coercion, NULL is an error
    fn as_bool(value: &Value, context: &str) -> EvalResult<bool> {
        match value {
            Value::Boolean(b) => Ok(*b),
            other => Err(EvalError::TypeMismatch {
                expected: "Boolean".to_string(),
                actual: format!("{:?}", other),
                context: context.to_string(),
            }),
        }
    }
}

/// Convenience function to evaluate an expression with `row` bound to `parameter`
pub fn evaluate_expression(
    expr: &Expression,
    parameter: &Parameter,
    row: &Record,
) -> EvalResult<Value> {
    ExpressionEvaluator::new(parameter, row)?.evaluate(expr)
}
