//! Enum types whose members may carry a human-readable description.

use crate::types::Value;
use std::sync::Arc;

/// A declared member of an enum type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumMember {
    pub name: String,
    /// Underlying integer value
    pub value: i64,
    /// Caller-attached label, if any
    pub description: Option<String>,
}

impl EnumMember {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
            description: None,
        }
    }

    pub fn with_description(
        name: impl Into<String>,
        value: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            description: Some(description.into()),
        }
    }
}

/// An enum type with members kept in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumType {
    name: String,
    members: Vec<EnumMember>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, members: Vec<EnumMember>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in declaration order
    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }

    /// First declared member with the given underlying value
    pub fn member_by_value(&self, value: i64) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.value == value)
    }

    pub fn member_by_name(&self, name: &str) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// A value of an enum type
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub enum_type: Arc<EnumType>,
    pub value: i64,
}

impl EnumValue {
    pub fn new(enum_type: Arc<EnumType>, value: i64) -> Self {
        Self { enum_type, value }
    }

    /// Value of the member with the given name
    pub fn named(enum_type: &Arc<EnumType>, name: &str) -> Option<Self> {
        let value = enum_type.member_by_name(name)?.value;
        Some(Self::new(enum_type.clone(), value))
    }

    /// Name of the first declared member with this value
    pub fn name(&self) -> Option<&str> {
        self.member().map(|m| m.name.as_str())
    }

    /// Description of the first declared member with this value.
    ///
    /// Later members sharing the value are not consulted.
    pub fn description(&self) -> Option<&str> {
        self.member().and_then(|m| m.description.as_deref())
    }

    fn member(&self) -> Option<&EnumMember> {
        self.enum_type.member_by_value(self.value)
    }
}

impl From<EnumValue> for Value {
    fn from(value: EnumValue) -> Self {
        Value::Enum(value)
    }
}
