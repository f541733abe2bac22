//! Built-in string, numeric and boolean methods.

use crate::expression::{EvalError, EvalResult};
use crate::method::registry::{Dispatch, MethodKey, MethodRegistry};
use crate::types::{EnumMember, EnumType, EnumValue, TypeDesc, Value};
use std::cmp::Ordering;
use std::sync::{Arc, OnceLock};

static STRING_COMPARISON: OnceLock<Arc<EnumType>> = OnceLock::new();

/// The `StringComparison` enum accepted by the two-argument string methods.
///
/// Odd values compare case-insensitively.
pub fn string_comparison() -> Arc<EnumType> {
    STRING_COMPARISON
        .get_or_init(|| {
            Arc::new(EnumType::new(
                "StringComparison",
                vec![
                    EnumMember::new("CurrentCulture", 0),
                    EnumMember::new("CurrentCultureIgnoreCase", 1),
                    EnumMember::new("InvariantCulture", 2),
                    EnumMember::new("InvariantCultureIgnoreCase", 3),
                    EnumMember::with_description("Ordinal", 4, "Case-sensitive"),
                    EnumMember::with_description("OrdinalIgnoreCase", 5, "Case-insensitive"),
                ],
            ))
        })
        .clone()
}

pub fn string_comparison_type() -> TypeDesc {
    TypeDesc::Enum(string_comparison())
}

/// `StringComparison.Ordinal` as a literal value
pub fn ordinal() -> Value {
    Value::Enum(EnumValue::new(string_comparison(), 4))
}

/// `StringComparison.OrdinalIgnoreCase` as a literal value
pub fn ordinal_ignore_case() -> Value {
    Value::Enum(EnumValue::new(string_comparison(), 5))
}

type Matcher = fn(&str, &str) -> bool;

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.contains(needle)
}

fn starts_with(haystack: &str, needle: &str) -> bool {
    haystack.starts_with(needle)
}

fn ends_with(haystack: &str, needle: &str) -> bool {
    haystack.ends_with(needle)
}

pub(super) fn define_builtins(registry: &mut MethodRegistry) {
    define_string_methods(registry);
    for ty in [
        TypeDesc::Int32,
        TypeDesc::Int64,
        TypeDesc::Float64,
        TypeDesc::Boolean,
    ] {
        define_scalar_methods(registry, ty);
    }
}

fn define_string_methods(registry: &mut MethodRegistry) {
    let comparison = string_comparison_type();
    let matchers: [(&'static str, Matcher); 3] = [
        ("Contains", contains),
        ("StartsWith", starts_with),
        ("EndsWith", ends_with),
    ];

    for (name, matcher) in matchers {
        define(
            registry,
            TypeDesc::String,
            name,
            vec![TypeDesc::String],
            Dispatch::Instance,
            TypeDesc::Boolean,
            move |receiver, args| {
                string_match(name, matcher, receiver, args[0], false)
            },
        );
        define(
            registry,
            TypeDesc::String,
            name,
            vec![TypeDesc::String, comparison.clone()],
            Dispatch::Instance,
            TypeDesc::Boolean,
            move |receiver, args| {
                let ignore_case = ignores_case(name, args[1])?;
                string_match(name, matcher, receiver, args[0], ignore_case)
            },
        );
    }

    define(
        registry,
        TypeDesc::String,
        "Equals",
        vec![TypeDesc::String],
        Dispatch::Instance,
        TypeDesc::Boolean,
        |receiver, args| string_equals(receiver, args[0], false),
    );
    define(
        registry,
        TypeDesc::String,
        "Equals",
        vec![TypeDesc::String, comparison],
        Dispatch::Instance,
        TypeDesc::Boolean,
        |receiver, args| {
            let ignore_case = ignores_case("Equals", args[1])?;
            string_equals(receiver, args[0], ignore_case)
        },
    );

    define(
        registry,
        TypeDesc::String,
        "CompareTo",
        vec![TypeDesc::String],
        Dispatch::Instance,
        TypeDesc::Int32,
        |receiver, args| {
            let this = receiver_str("CompareTo", receiver)?;
            let ordering = match string_arg("CompareTo", args, 0)? {
                Some(other) => this.cmp(other),
                // Any string sorts after null
                None => Ordering::Greater,
            };
            Ok(ordering_value(ordering))
        },
    );

    define(
        registry,
        TypeDesc::String,
        "IsNullOrEmpty",
        vec![TypeDesc::String],
        Dispatch::Static,
        TypeDesc::Boolean,
        |_, args| {
            let value = string_arg("IsNullOrEmpty", args, 0)?;
            Ok(Value::Boolean(value.map_or(true, str::is_empty)))
        },
    );
    define(
        registry,
        TypeDesc::String,
        "IsNullOrWhiteSpace",
        vec![TypeDesc::String],
        Dispatch::Static,
        TypeDesc::Boolean,
        |_, args| {
            let value = string_arg("IsNullOrWhiteSpace", args, 0)?;
            Ok(Value::Boolean(
                value.map_or(true, |s| s.chars().all(char::is_whitespace)),
            ))
        },
    );
}

fn define_scalar_methods(registry: &mut MethodRegistry, ty: TypeDesc) {
    define(
        registry,
        ty.clone(),
        "Equals",
        vec![ty.clone()],
        Dispatch::Instance,
        TypeDesc::Boolean,
        |receiver, args| {
            let equal = match (receiver, args[0]) {
                (Some(Value::Float64(a)), Value::Float64(b)) => {
                    a == b || (a.is_nan() && b.is_nan())
                }
                (Some(a), b) => a == b,
                (None, _) => false,
            };
            Ok(Value::Boolean(equal))
        },
    );

    let name = ty.to_string();
    define(
        registry,
        ty.clone(),
        "CompareTo",
        vec![ty],
        Dispatch::Instance,
        TypeDesc::Int32,
        move |receiver, args| {
            let ordering = match (receiver, args[0]) {
                (Some(Value::Int32(a)), Value::Int32(b)) => a.cmp(b),
                (Some(Value::Int64(a)), Value::Int64(b)) => a.cmp(b),
                (Some(Value::Boolean(a)), Value::Boolean(b)) => a.cmp(b),
                (Some(Value::Float64(a)), Value::Float64(b)) => compare_f64(*a, *b),
                (_, other) => {
                    return Err(EvalError::TypeMismatch {
                        expected: name.clone(),
                        actual: format!("{:?}", other),
                        context: format!("{}.CompareTo", name),
                    })
                }
            };
            Ok(ordering_value(ordering))
        },
    );
}

fn define<F>(
    registry: &mut MethodRegistry,
    declaring: TypeDesc,
    name: &str,
    parameters: Vec<TypeDesc>,
    dispatch: Dispatch,
    return_type: TypeDesc,
    func: F,
) where
    F: Fn(Option<&Value>, &[&Value]) -> EvalResult<Value> + Send + Sync + 'static,
{
    registry.define(
        MethodKey {
            declaring,
            name: name.to_string(),
            parameters,
        },
        dispatch,
        return_type,
        func,
    );
}

/// NaN sorts before every other value and equal to itself
fn compare_f64(a: f64, b: f64) -> Ordering {
    match a.partial_cmp(&b) {
        Some(ordering) => ordering,
        None => match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            _ => Ordering::Greater,
        },
    }
}

fn ordering_value(ordering: Ordering) -> Value {
    Value::Int32(match ordering {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    })
}

fn string_match(
    method: &str,
    matcher: Matcher,
    receiver: Option<&Value>,
    needle: &Value,
    ignore_case: bool,
) -> EvalResult<Value> {
    let haystack = receiver_str(method, receiver)?;
    let needle = match needle {
        Value::String(s) => s.as_str(),
        Value::Null => {
            return Err(EvalError::NullArgument {
                method: format!("String.{}", method),
                position: 0,
            })
        }
        other => return Err(not_a_string(method, other)),
    };

    let matched = if ignore_case {
        matcher(&haystack.to_lowercase(), &needle.to_lowercase())
    } else {
        matcher(haystack, needle)
    };
    Ok(Value::Boolean(matched))
}

fn string_equals(receiver: Option<&Value>, other: &Value, ignore_case: bool) -> EvalResult<Value> {
    let this = receiver_str("Equals", receiver)?;
    let equal = match other {
        Value::String(other) if ignore_case => this.to_lowercase() == other.to_lowercase(),
        Value::String(other) => this == other,
        Value::Null => false,
        other => return Err(not_a_string("Equals", other)),
    };
    Ok(Value::Boolean(equal))
}

fn ignores_case(method: &str, comparison: &Value) -> EvalResult<bool> {
    match comparison {
        Value::Enum(e) if e.name().is_some() && e.enum_type.name() == "StringComparison" => {
            Ok(e.value % 2 == 1)
        }
        other => Err(EvalError::MethodFailed {
            method: format!("String.{}", method),
            message: format!("invalid StringComparison {:?}", other),
        }),
    }
}

fn receiver_str<'v>(method: &str, receiver: Option<&'v Value>) -> EvalResult<&'v str> {
    match receiver {
        Some(Value::String(s)) => Ok(s),
        Some(Value::Null) | None => Err(EvalError::NullReference {
            target: format!("String.{}", method),
        }),
        Some(other) => Err(not_a_string(method, other)),
    }
}

fn string_arg<'v>(method: &str, args: &[&'v Value], position: usize) -> EvalResult<Option<&'v str>> {
    match args.get(position).copied() {
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Null) => Ok(None),
        Some(other) => Err(not_a_string(method, other)),
        None => Err(EvalError::MethodFailed {
            method: format!("String.{}", method),
            message: format!("missing argument {}", position),
        }),
    }
}

fn not_a_string(method: &str, value: &Value) -> EvalError {
    EvalError::TypeMismatch {
        expected: "String".to_string(),
        actual: format!("{:?}", value),
        context: format!("String.{}", method),
    }
}
