use crate::types::{EnumValue, Record, TypeDesc};
use std::sync::Arc;

/// Runtime values held by rows and literals
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
    Enum(EnumValue),
    Record(Arc<Record>),
}

impl Value {
    /// Get the type of this value, `None` for NULL
    pub fn data_type(&self) -> Option<TypeDesc> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(TypeDesc::Boolean),
            Value::Int32(_) => Some(TypeDesc::Int32),
            Value::Int64(_) => Some(TypeDesc::Int64),
            Value::Float64(_) => Some(TypeDesc::Float64),
            Value::String(_) => Some(TypeDesc::String),
            Value::Enum(e) => Some(TypeDesc::Enum(e.enum_type.clone())),
            Value::Record(r) => Some(TypeDesc::Record(r.record_type().clone())),
        }
    }

    /// Check if this value can be stored where `ty` is expected
    pub fn is_compatible_with(&self, ty: &TypeDesc) -> bool {
        match self.data_type() {
            None => ty.admits_null(),
            Some(actual) => ty.is_assignable_from(&actual),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer representation of discrete values
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            Value::Enum(e) => Some(e.value),
            _ => None,
        }
    }

    /// Label of an enum value; `None` for non-enum values and unlabelled members
    pub fn description(&self) -> Option<&str> {
        match self {
            Value::Enum(e) => e.description(),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(Arc::new(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
