//! Row types, member handles and rows.

use crate::expression::{EvalError, EvalResult};
use crate::types::{TypeDesc, Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of a data member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberKind {
    Field,
    Property,
    /// Event-like slot; its type is the handler type
    Event,
    Method,
}

impl MemberKind {
    /// Whether a member of this kind can be read by a member-access node
    pub fn is_readable(&self) -> bool {
        matches!(self, MemberKind::Field | MemberKind::Property)
    }
}

/// Handle to a specific member of a record type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberRef {
    /// Name of the declaring record type
    pub owner: String,
    pub name: String,
    /// Position of the member's slot in a row
    pub index: usize,
    pub kind: MemberKind,
    /// Declared type; the return type for methods
    pub ty: TypeDesc,
}

/// A record (row) type with its members in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordType {
    name: String,
    members: Vec<MemberRef>,
}

impl RecordType {
    pub fn builder(name: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[MemberRef] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&MemberRef> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Whether `member` was declared by this type
    pub fn declares(&self, member: &MemberRef) -> bool {
        member.owner == self.name && self.members.get(member.index) == Some(member)
    }
}

/// Fluent builder for record types
pub struct RecordTypeBuilder {
    name: String,
    members: Vec<MemberRef>,
}

impl RecordTypeBuilder {
    pub fn field(self, name: impl Into<String>, ty: TypeDesc) -> Self {
        self.member(name, MemberKind::Field, ty)
    }

    pub fn property(self, name: impl Into<String>, ty: TypeDesc) -> Self {
        self.member(name, MemberKind::Property, ty)
    }

    pub fn event(self, name: impl Into<String>, handler: impl Into<String>) -> Self {
        self.member(name, MemberKind::Event, TypeDesc::Handler(handler.into()))
    }

    pub fn method(self, name: impl Into<String>, return_type: TypeDesc) -> Self {
        self.member(name, MemberKind::Method, return_type)
    }

    pub fn member(mut self, name: impl Into<String>, kind: MemberKind, ty: TypeDesc) -> Self {
        let index = self.members.len();
        self.members.push(MemberRef {
            owner: self.name.clone(),
            name: name.into(),
            index,
            kind,
            ty,
        });
        self
    }

    pub fn build(self) -> Arc<RecordType> {
        Arc::new(RecordType {
            name: self.name,
            members: self.members,
        })
    }
}

/// A row: one value per member of its record type
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    record_type: Arc<RecordType>,
    values: Vec<Value>,
}

impl Record {
    /// Create a row, checking every value against its member's declared type.
    ///
    /// Event and method slots hold `Value::Null`.
    pub fn new(record_type: Arc<RecordType>, values: Vec<Value>) -> EvalResult<Self> {
        if values.len() != record_type.members().len() {
            return Err(EvalError::RowShape {
                record: record_type.name().to_string(),
                reason: format!(
                    "expected {} values, got {}",
                    record_type.members().len(),
                    values.len()
                ),
            });
        }

        for (member, value) in record_type.members().iter().zip(values.iter()) {
            let ok = if member.kind.is_readable() {
                value.is_compatible_with(&member.ty)
            } else {
                value.is_null()
            };
            if !ok {
                return Err(EvalError::RowShape {
                    record: record_type.name().to_string(),
                    reason: format!(
                        "value {:?} does not fit member {} of type {}",
                        value, member.name, member.ty
                    ),
                });
            }
        }

        Ok(Self {
            record_type,
            values,
        })
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.record_type
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value held in the slot of `member`
    pub fn get(&self, member: &MemberRef) -> EvalResult<&Value> {
        if !self.record_type.declares(member) {
            return Err(EvalError::RecordTypeMismatch {
                expected: member.owner.clone(),
                actual: self.record_type.name().to_string(),
            });
        }
        Ok(&self.values[member.index])
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        let member = self.record_type.member(name)?;
        self.values.get(member.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Arc<RecordType> {
        RecordType::builder("Person")
            .property("Name", TypeDesc::String)
            .field("Age", TypeDesc::Int32)
            .property("Score", TypeDesc::nullable(TypeDesc::Float64))
            .event("Changed", "EventHandler")
            .method("Describe", TypeDesc::String)
            .build()
    }

    #[test]
    fn test_builder_assigns_indices() {
        let person = person();
        assert_eq!(person.name(), "Person");
        assert_eq!(person.members().len(), 5);

        let age = person.member("Age").unwrap();
        assert_eq!(age.index, 1);
        assert_eq!(age.kind, MemberKind::Field);
        assert_eq!(age.owner, "Person");

        let changed = person.member("Changed").unwrap();
        assert_eq!(changed.ty, TypeDesc::Handler("EventHandler".to_string()));
        assert!(!changed.kind.is_readable());

        assert!(person.member("Missing").is_none());
    }

    #[test]
    fn test_record_new_and_get() {
        let person = person();
        let row = Record::new(
            person.clone(),
            vec![
                Value::from("Ada"),
                Value::Int32(36),
                Value::Null,
                Value::Null,
                Value::Null,
            ],
        )
        .unwrap();

        let name = person.member("Name").unwrap();
        assert_eq!(row.get(name).unwrap(), &Value::from("Ada"));
        assert_eq!(row.get_by_name("Age"), Some(&Value::Int32(36)));
        assert_eq!(row.get_by_name("Score"), Some(&Value::Null));
    }

    #[test]
    fn test_record_shape_errors() {
        let person = person();

        // Wrong arity
        let err = Record::new(person.clone(), vec![Value::from("Ada")]).unwrap_err();
        assert!(matches!(err, EvalError::RowShape { .. }));

        // Null in a non-nullable value slot
        let err = Record::new(
            person.clone(),
            vec![
                Value::from("Ada"),
                Value::Null,
                Value::Null,
                Value::Null,
                Value::Null,
            ],
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::RowShape { .. }));

        // Wrong type, no widening
        let err = Record::new(
            person,
            vec![
                Value::from("Ada"),
                Value::Int64(36),
                Value::Null,
                Value::Null,
                Value::Null,
            ],
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::RowShape { .. }));
    }

    #[test]
    fn test_get_with_foreign_member() {
        let person = person();
        let other = RecordType::builder("Order")
            .property("Name", TypeDesc::String)
            .build();
        let row = Record::new(other, vec![Value::from("x")]).unwrap();

        let err = row.get(person.member("Name").unwrap()).unwrap_err();
        assert_eq!(
            err,
            EvalError::RecordTypeMismatch {
                expected: "Person".to_string(),
                actual: "Order".to_string(),
            }
        );
    }
}
