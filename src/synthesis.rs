//! Predicate synthesis and reflection helpers.
//!
//! Predicates are built from a column accessor plus a method resolved in a
//! [`MethodRegistry`]. Every configuration problem (unknown method, wrong
//! signature, wrong receiver type) is reported here, when the predicate is
//! built, and never deferred to the first row.

use crate::expression::{
    Accessor, Expression, Predicate, SynthesisError, SynthesisResult,
};
use crate::method::{MethodRef, MethodRegistry};
use crate::types::{MemberKind, MemberRef, TypeDesc, Value};
use log::debug;

/// Underlying type of a one-level nullable wrapper, otherwise `ty` itself
pub fn non_nullable_type(ty: &TypeDesc) -> &TypeDesc {
    ty.non_nullable()
}

/// Label attached to an enum value's member.
///
/// Non-enum values, undeclared values and unlabelled members yield `None`.
/// When several members share a value the first declared one is used.
pub fn description(value: &Value) -> Option<&str> {
    value.description()
}

/// `x => body(x).method(value)` for an instance method with one parameter
pub fn call_method_type(
    registry: &MethodRegistry,
    accessor: &Accessor,
    declaring: &TypeDesc,
    method: &str,
    parameter: TypeDesc,
    value: impl Into<Value>,
) -> SynthesisResult<Predicate> {
    call_method_type_many(
        registry,
        accessor,
        declaring,
        method,
        &[parameter],
        vec![value.into()],
    )
}

/// `x => body(x).method(values...)` for an instance method.
///
/// Parameter types and values are matched positionally. The accessor body is
/// used as receiver with one conversion layer removed.
pub fn call_method_type_many(
    registry: &MethodRegistry,
    accessor: &Accessor,
    declaring: &TypeDesc,
    method: &str,
    parameters: &[TypeDesc],
    values: Vec<Value>,
) -> SynthesisResult<Predicate> {
    if parameters.len() != values.len() {
        return Err(SynthesisError::ArgumentCountMismatch {
            method: format!("{}.{}", declaring, method),
            expected: parameters.len(),
            actual: values.len(),
        });
    }

    let resolved = resolve_predicate_method(registry, declaring, method, parameters)?;
    let receiver = accessor.body().strip_convert().clone();
    let args = values.into_iter().map(Expression::literal).collect();

    let call = Expression::call(Some(receiver), &resolved, args).map_err(|err| {
        debug!("cannot synthesize {} over {}: {}", method, accessor, err);
        err
    })?;
    let predicate = Predicate::new(accessor.parameter().clone(), call)?;
    debug!("synthesized {}", predicate);
    Ok(predicate)
}

/// `x => Declaring.method(body(x))` for a static method with one parameter
pub fn call_method_type_static_self(
    registry: &MethodRegistry,
    accessor: &Accessor,
    declaring: &TypeDesc,
    method: &str,
    parameter: TypeDesc,
) -> SynthesisResult<Predicate> {
    let resolved = resolve_predicate_method(registry, declaring, method, &[parameter])?;
    let arg = accessor.body().strip_convert().clone();

    let call = Expression::call(None, &resolved, vec![arg]).map_err(|err| {
        debug!("cannot synthesize {} over {}: {}", method, accessor, err);
        err
    })?;
    let predicate = Predicate::new(accessor.parameter().clone(), call)?;
    debug!("synthesized {}", predicate);
    Ok(predicate)
}

/// The member an accessor reads directly off its row parameter.
///
/// Looks through at most one conversion. No accessor, member chains and any
/// other shape yield `None`.
pub fn property_member(accessor: Option<&Accessor>) -> Option<&MemberRef> {
    accessor.and_then(Accessor::member)
}

/// Logical negation of `predicate` over the same parameter
pub fn not(predicate: &Predicate) -> Predicate {
    predicate.not()
}

/// Declared value type of a field, property or event-like member
pub fn member_underlying_type(member: &MemberRef) -> SynthesisResult<&TypeDesc> {
    match member.kind {
        MemberKind::Field | MemberKind::Property | MemberKind::Event => Ok(&member.ty),
        kind => Err(SynthesisError::InvalidMemberKind {
            member: member.name.clone(),
            kind,
        }),
    }
}

/// Resolve a method usable as a predicate: it must return Boolean
fn resolve_predicate_method(
    registry: &MethodRegistry,
    declaring: &TypeDesc,
    method: &str,
    parameters: &[TypeDesc],
) -> SynthesisResult<MethodRef> {
    let resolved = registry.resolve(declaring, method, parameters)?;
    if resolved.return_type() != &TypeDesc::Boolean {
        return Err(SynthesisError::NotAPredicate {
            method: resolved.qualified_name(),
            actual: resolved.return_type().clone(),
        });
    }
    Ok(resolved)
}
