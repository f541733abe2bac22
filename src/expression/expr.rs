//! Expression tree definitions.

use crate::expression::{SynthesisError, SynthesisResult};
use crate::method::{Dispatch, MethodRef};
use crate::types::{MemberRef, TypeDesc, Value};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_PARAMETER_ID: AtomicU64 = AtomicU64::new(1);

/// Formal parameter of a lambda.
///
/// Identity is assigned at creation; two parameters with the same name and
/// type are still different variables.
#[derive(Debug, Clone)]
pub struct Parameter {
    id: u64,
    name: Arc<str>,
    ty: TypeDesc,
}

impl Parameter {
    pub fn new(name: impl Into<Arc<str>>, ty: TypeDesc) -> Self {
        Self {
            id: NEXT_PARAMETER_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            ty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeDesc {
        &self.ty
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Parameter {}

impl Hash for Parameter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Constant value in an expression
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: Value,
}

impl Literal {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn null() -> Self {
        Self { value: Value::Null }
    }
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Reference to the lambda's row parameter
    Parameter(Parameter),

    /// Literal constant value
    Literal(Literal),

    /// Read of a field or property
    Member {
        target: Box<Expression>,
        member: MemberRef,
    },

    /// Widening conversion (boxing to `Object`, lifting to nullable)
    Convert {
        operand: Box<Expression>,
        to: TypeDesc,
    },

    /// Method invocation; `receiver` is `None` for static methods
    Call {
        receiver: Option<Box<Expression>>,
        method: MethodRef,
        args: Vec<Expression>,
    },

    Not(Box<Expression>),

    /// Short-circuit conjunction
    And {
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Short-circuit disjunction
    Or {
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    /// Create a parameter reference expression
    pub fn parameter(parameter: &Parameter) -> Self {
        Expression::Parameter(parameter.clone())
    }

    /// Create a literal expression
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(Literal::new(value))
    }

    /// Create a member access by name on a record-typed target
    pub fn member(target: Expression, name: &str) -> SynthesisResult<Self> {
        let ty = target.static_type();
        let member = ty
            .as_record()
            .and_then(|record| record.member(name))
            .filter(|m| m.kind.is_readable())
            .cloned()
            .ok_or_else(|| SynthesisError::UnknownMember {
                owner: ty.to_string(),
                member: name.to_string(),
            })?;

        Ok(Expression::Member {
            target: Box::new(target),
            member,
        })
    }

    /// Create a member access from a member handle
    pub fn member_ref(target: Expression, member: &MemberRef) -> SynthesisResult<Self> {
        let declared = target
            .static_type()
            .as_record()
            .map(|record| record.declares(member))
            .unwrap_or(false);
        if !declared || !member.kind.is_readable() {
            return Err(SynthesisError::UnknownMember {
                owner: target.static_type().to_string(),
                member: member.name.clone(),
            });
        }

        Ok(Expression::Member {
            target: Box::new(target),
            member: member.clone(),
        })
    }

    /// Create a widening conversion
    pub fn convert(operand: Expression, to: TypeDesc) -> SynthesisResult<Self> {
        let from = operand.static_type();
        if !to.is_assignable_from(&from) {
            return Err(SynthesisError::InvalidConversion { from, to });
        }

        Ok(Expression::Convert {
            operand: Box::new(operand),
            to,
        })
    }

    /// Create a method call, checking dispatch, receiver type and arguments
    pub fn call(
        receiver: Option<Expression>,
        method: &MethodRef,
        args: Vec<Expression>,
    ) -> SynthesisResult<Self> {
        match (&receiver, method.dispatch()) {
            (Some(receiver), Dispatch::Instance) => {
                let actual = receiver.static_type();
                if actual.non_nullable() != method.declaring().non_nullable() {
                    return Err(SynthesisError::ReceiverTypeMismatch {
                        method: method.qualified_name(),
                        expected: method.declaring().clone(),
                        actual,
                    });
                }
            }
            (None, Dispatch::Static) => {}
            (receiver, actual) => {
                let required = if receiver.is_some() {
                    Dispatch::Instance
                } else {
                    Dispatch::Static
                };
                return Err(SynthesisError::DispatchMismatch {
                    method: method.qualified_name(),
                    actual,
                    required,
                });
            }
        }

        if args.len() != method.parameters().len() {
            return Err(SynthesisError::ArgumentCountMismatch {
                method: method.qualified_name(),
                expected: method.parameters().len(),
                actual: args.len(),
            });
        }

        for (position, (arg, expected)) in args.iter().zip(method.parameters()).enumerate() {
            if !arg.fits(expected) {
                return Err(SynthesisError::ArgumentTypeMismatch {
                    method: method.qualified_name(),
                    position,
                    expected: expected.clone(),
                    actual: arg.describe_type(),
                });
            }
        }

        Ok(Expression::Call {
            receiver: receiver.map(Box::new),
            method: method.clone(),
            args,
        })
    }

    /// Create a NOT expression
    pub fn not_expr(operand: Expression) -> SynthesisResult<Self> {
        Self::require_boolean(&operand)?;
        Ok(Expression::Not(Box::new(operand)))
    }

    /// Create an AND expression
    pub fn and(left: Expression, right: Expression) -> SynthesisResult<Self> {
        Self::require_boolean(&left)?;
        Self::require_boolean(&right)?;
        Ok(Expression::And {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Create an OR expression
    pub fn or(left: Expression, right: Expression) -> SynthesisResult<Self> {
        Self::require_boolean(&left)?;
        Self::require_boolean(&right)?;
        Ok(Expression::Or {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Static type of the value this expression produces
    pub fn static_type(&self) -> TypeDesc {
        match self {
            Expression::Parameter(p) => p.ty().clone(),
            Expression::Literal(lit) => lit.value.data_type().unwrap_or(TypeDesc::Object),
            Expression::Member { member, .. } => member.ty.clone(),
            Expression::Convert { to, .. } => to.clone(),
            Expression::Call { method, .. } => method.return_type().clone(),
            Expression::Not(_) | Expression::And { .. } | Expression::Or { .. } => {
                TypeDesc::Boolean
            }
        }
    }

    /// The expression with at most one conversion layer removed
    pub fn strip_convert(&self) -> &Expression {
        match self {
            Expression::Convert { operand, .. } => operand.as_ref(),
            other => other,
        }
    }

    /// Visit every parameter reference in the tree
    pub fn visit_parameters<F: FnMut(&Parameter)>(&self, f: &mut F) {
        match self {
            Expression::Parameter(p) => f(p),
            Expression::Literal(_) => {}
            Expression::Member { target, .. } => target.visit_parameters(f),
            Expression::Convert { operand, .. } => operand.visit_parameters(f),
            Expression::Call { receiver, args, .. } => {
                if let Some(receiver) = receiver {
                    receiver.visit_parameters(f);
                }
                for arg in args {
                    arg.visit_parameters(f);
                }
            }
            Expression::Not(operand) => operand.visit_parameters(f),
            Expression::And { left, right } | Expression::Or { left, right } => {
                left.visit_parameters(f);
                right.visit_parameters(f);
            }
        }
    }

    /// Whether this expression can be passed where `ty` is expected.
    ///
    /// Literals are checked by value so a null literal fits any nullable slot.
    fn fits(&self, ty: &TypeDesc) -> bool {
        match self {
            Expression::Literal(lit) => lit.value.is_compatible_with(ty),
            other => ty.is_assignable_from(&other.static_type()),
        }
    }

    fn describe_type(&self) -> String {
        match self {
            Expression::Literal(Literal { value: Value::Null }) => "null".to_string(),
            other => other.static_type().to_string(),
        }
    }

    fn require_boolean(expr: &Expression) -> SynthesisResult<()> {
        match expr.static_type() {
            TypeDesc::Boolean => Ok(()),
            actual => Err(SynthesisError::NonBooleanBody { actual }),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Parameter(p) => write!(f, "{}", p.name()),
            Expression::Literal(lit) => match &lit.value {
                Value::Null => write!(f, "null"),
                Value::Boolean(b) => write!(f, "{}", b),
                Value::Int32(v) => write!(f, "{}", v),
                Value::Int64(v) => write!(f, "{}", v),
                Value::Float64(v) => write!(f, "{}", v),
                Value::String(s) => write!(f, "{:?}", s),
                Value::Enum(e) => match e.name() {
                    Some(name) => write!(f, "{}.{}", e.enum_type.name(), name),
                    None => write!(f, "{}({})", e.enum_type.name(), e.value),
                },
                Value::Record(r) => write!(f, "<{}>", r.record_type().name()),
            },
            Expression::Member { target, member } => write!(f, "{}.{}", target, member.name),
            Expression::Convert { operand, to } => write!(f, "Convert({}, {})", operand, to),
            Expression::Call {
                receiver,
                method,
                args,
            } => {
                match receiver {
                    Some(receiver) => write!(f, "{}.{}(", receiver, method.name())?,
                    None => write!(f, "{}.{}(", method.declaring(), method.name())?,
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expression::Not(operand) => write!(f, "Not({})", operand),
            Expression::And { left, right } => write!(f, "({} AndAlso {})", left, right),
            Expression::Or { left, right } => write!(f, "({} OrElse {})", left, right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::MethodRegistry;
    use crate::types::RecordType;

    fn person() -> Arc<RecordType> {
        RecordType::builder("Person")
            .property("Name", TypeDesc::String)
            .property("Age", TypeDesc::Int32)
            .method("Describe", TypeDesc::String)
            .build()
    }

    #[test]
    fn test_parameter_identity() {
        let a = Parameter::new("x", TypeDesc::Record(person()));
        let b = Parameter::new("x", TypeDesc::Record(person()));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_member_access() {
        let x = Parameter::new("x", TypeDesc::Record(person()));

        let name = Expression::member(Expression::parameter(&x), "Name").unwrap();
        assert_eq!(name.static_type(), TypeDesc::String);
        assert_eq!(name.to_string(), "x.Name");

        let err = Expression::member(Expression::parameter(&x), "Missing").unwrap_err();
        assert!(matches!(err, SynthesisError::UnknownMember { .. }));

        // Methods cannot be read as members
        let err = Expression::member(Expression::parameter(&x), "Describe").unwrap_err();
        assert!(matches!(err, SynthesisError::UnknownMember { .. }));

        // Member access on a non-record target
        let err = Expression::member(Expression::literal(1), "Name").unwrap_err();
        assert!(matches!(err, SynthesisError::UnknownMember { .. }));
    }

    #[test]
    fn test_convert() {
        let x = Parameter::new("x", TypeDesc::Record(person()));
        let age = Expression::member(Expression::parameter(&x), "Age").unwrap();

        let boxed = Expression::convert(age.clone(), TypeDesc::Object).unwrap();
        assert_eq!(boxed.static_type(), TypeDesc::Object);
        assert_eq!(boxed.strip_convert(), &age);
        assert_eq!(boxed.to_string(), "Convert(x.Age, Object)");

        let lifted = Expression::convert(age.clone(), TypeDesc::nullable(TypeDesc::Int32));
        assert!(lifted.is_ok());

        let err = Expression::convert(age, TypeDesc::Int64).unwrap_err();
        assert_eq!(
            err,
            SynthesisError::InvalidConversion {
                from: TypeDesc::Int32,
                to: TypeDesc::Int64,
            }
        );
    }

    #[test]
    fn test_call_checks() {
        let registry = MethodRegistry::with_builtins();
        let x = Parameter::new("x", TypeDesc::Record(person()));
        let name = Expression::member(Expression::parameter(&x), "Name").unwrap();
        let age = Expression::member(Expression::parameter(&x), "Age").unwrap();

        let contains = registry
            .resolve(&TypeDesc::String, "Contains", &[TypeDesc::String])
            .unwrap();
        let call =
            Expression::call(Some(name.clone()), &contains, vec![Expression::literal("a")])
                .unwrap();
        assert_eq!(call.static_type(), TypeDesc::Boolean);
        assert_eq!(call.to_string(), "x.Name.Contains(\"a\")");

        // Receiver of the wrong type
        let err = Expression::call(Some(age), &contains, vec![Expression::literal("a")])
            .unwrap_err();
        assert!(matches!(err, SynthesisError::ReceiverTypeMismatch { .. }));

        // Argument of the wrong type
        let err =
            Expression::call(Some(name.clone()), &contains, vec![Expression::literal(1)])
                .unwrap_err();
        assert!(matches!(
            err,
            SynthesisError::ArgumentTypeMismatch { position: 0, .. }
        ));

        // Instance method without a receiver
        let err = Expression::call(None, &contains, vec![Expression::literal("a")]).unwrap_err();
        assert!(matches!(err, SynthesisError::DispatchMismatch { .. }));

        // Static method with a receiver
        let is_empty = registry
            .resolve(&TypeDesc::String, "IsNullOrEmpty", &[TypeDesc::String])
            .unwrap();
        let err = Expression::call(Some(name.clone()), &is_empty, vec![name.clone()])
            .unwrap_err();
        assert!(matches!(err, SynthesisError::DispatchMismatch { .. }));

        let call = Expression::call(None, &is_empty, vec![name]).unwrap();
        assert_eq!(call.to_string(), "String.IsNullOrEmpty(x.Name)");
    }

    #[test]
    fn test_logical_builders_require_boolean() {
        let err = Expression::not_expr(Expression::literal(1)).unwrap_err();
        assert_eq!(
            err,
            SynthesisError::NonBooleanBody {
                actual: TypeDesc::Int32
            }
        );

        let expr = Expression::and(Expression::literal(true), Expression::literal(false)).unwrap();
        assert_eq!(expr.to_string(), "(true AndAlso false)");

        let err = Expression::or(Expression::literal(true), Expression::literal("x")).unwrap_err();
        assert!(matches!(err, SynthesisError::NonBooleanBody { .. }));
    }

    #[test]
    fn test_visit_parameters() {
        let x = Parameter::new("x", TypeDesc::Record(person()));
        let name = Expression::member(Expression::parameter(&x), "Name").unwrap();
        let expr = Expression::and(
            Expression::literal(true),
            Expression::not_expr(Expression::literal(false)).unwrap(),
        )
        .unwrap();

        let mut seen = Vec::new();
        name.visit_parameters(&mut |p| seen.push(p.clone()));
        assert_eq!(seen, vec![x]);

        let mut count = 0;
        expr.visit_parameters(&mut |_| count += 1);
        assert_eq!(count, 0);
    }
}
