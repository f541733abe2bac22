//! Runtime type metadata and values.
//!
//! Columns are not known at compile time, so everything a predicate touches
//! is described at runtime:
//!
//! - **TypeDesc**: handle to a data type, possibly a nullable wrapper
//! - **EnumType**: enum members in declaration order with optional labels
//! - **RecordType / MemberRef**: row types and handles to their members
//! - **Value / Record**: runtime values and rows

pub mod enum_type;
pub mod record;
pub mod type_desc;
pub mod value;

pub use enum_type::{EnumMember, EnumType, EnumValue};
pub use record::{MemberKind, MemberRef, Record, RecordType, RecordTypeBuilder};
pub use type_desc::TypeDesc;
pub use value::Value;
