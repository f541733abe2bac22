//! Runtime type descriptors.

use crate::types::{EnumType, RecordType};
use std::fmt;
use std::sync::Arc;

/// Runtime handle to a data type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    /// Boxed supertype of every other type
    Object,
    Boolean,
    Int32,
    Int64,
    Float64,
    String,
    Enum(Arc<EnumType>),
    Record(Arc<RecordType>),
    /// Declared type of an event-like slot
    Handler(String),
    /// "May additionally be absent" wrapper around a value type
    Nullable(Box<TypeDesc>),
}

impl TypeDesc {
    /// Wrap a value type as nullable.
    ///
    /// Reference types and already nullable types are returned unchanged, so
    /// nullable-of-nullable can never be built.
    pub fn nullable(inner: TypeDesc) -> Self {
        if inner.is_value_type() {
            TypeDesc::Nullable(Box::new(inner))
        } else {
            inner
        }
    }

    /// Underlying type of a one-level nullable wrapper, otherwise `self`
    pub fn non_nullable(&self) -> &TypeDesc {
        match self {
            TypeDesc::Nullable(inner) => inner.as_ref(),
            other => other,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeDesc::Nullable(_))
    }

    /// Value types cannot hold null unless wrapped in `Nullable`
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            TypeDesc::Boolean
                | TypeDesc::Int32
                | TypeDesc::Int64
                | TypeDesc::Float64
                | TypeDesc::Enum(_)
        )
    }

    /// Whether null is a legal value of this type
    pub fn admits_null(&self) -> bool {
        !self.is_value_type()
    }

    /// Whether a value of static type `from` can be used where `self` is expected.
    ///
    /// Identity, boxing to `Object` and lifting into `Nullable` are accepted.
    /// Numeric widening is not.
    pub fn is_assignable_from(&self, from: &TypeDesc) -> bool {
        if self == from {
            return true;
        }
        match self {
            TypeDesc::Object => true,
            TypeDesc::Nullable(inner) => inner.as_ref() == from,
            _ => false,
        }
    }

    pub fn as_record(&self) -> Option<&Arc<RecordType>> {
        match self {
            TypeDesc::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&Arc<EnumType>> {
        match self.non_nullable() {
            TypeDesc::Enum(enum_type) => Some(enum_type),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Object => write!(f, "Object"),
            TypeDesc::Boolean => write!(f, "Boolean"),
            TypeDesc::Int32 => write!(f, "Int32"),
            TypeDesc::Int64 => write!(f, "Int64"),
            TypeDesc::Float64 => write!(f, "Float64"),
            TypeDesc::String => write!(f, "String"),
            TypeDesc::Enum(enum_type) => write!(f, "{}", enum_type.name()),
            TypeDesc::Record(record) => write!(f, "{}", record.name()),
            TypeDesc::Handler(name) => write!(f, "{}", name),
            TypeDesc::Nullable(inner) => write!(f, "{}?", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnumMember;

    #[test]
    fn test_non_nullable() {
        let wrapped = TypeDesc::nullable(TypeDesc::Int32);
        assert!(wrapped.is_nullable());
        assert_eq!(wrapped.non_nullable(), &TypeDesc::Int32);

        // Idempotent
        assert_eq!(wrapped.non_nullable().non_nullable(), &TypeDesc::Int32);

        // Non-nullable input is returned unchanged
        assert_eq!(TypeDesc::String.non_nullable(), &TypeDesc::String);
        assert_eq!(TypeDesc::Boolean.non_nullable(), &TypeDesc::Boolean);
    }

    #[test]
    fn test_nullable_never_nests() {
        let once = TypeDesc::nullable(TypeDesc::Int64);
        let twice = TypeDesc::nullable(once.clone());
        assert_eq!(once, twice);
        assert_eq!(twice.non_nullable(), &TypeDesc::Int64);

        // Reference types already admit null
        assert_eq!(TypeDesc::nullable(TypeDesc::String), TypeDesc::String);
        assert!(TypeDesc::String.admits_null());
        assert!(!TypeDesc::Int32.admits_null());
    }

    #[test]
    fn test_assignability() {
        assert!(TypeDesc::String.is_assignable_from(&TypeDesc::String));
        assert!(TypeDesc::Object.is_assignable_from(&TypeDesc::Int32));
        assert!(TypeDesc::nullable(TypeDesc::Int32).is_assignable_from(&TypeDesc::Int32));

        // No numeric widening
        assert!(!TypeDesc::Int64.is_assignable_from(&TypeDesc::Int32));
        assert!(!TypeDesc::Int32.is_assignable_from(&TypeDesc::nullable(TypeDesc::Int32)));
    }

    #[test]
    fn test_display() {
        let color = Arc::new(EnumType::new(
            "Color",
            vec![EnumMember::new("Red", 0), EnumMember::new("Blue", 1)],
        ));
        assert_eq!(TypeDesc::String.to_string(), "String");
        assert_eq!(TypeDesc::nullable(TypeDesc::Int32).to_string(), "Int32?");
        assert_eq!(TypeDesc::Enum(color).to_string(), "Color");
    }
}
