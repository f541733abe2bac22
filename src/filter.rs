//! String column filters.
//!
//! A `StringFilter` is the persisted state of a grid column filter: a
//! condition plus the query text. Building it against a column accessor
//! yields a null-guarded, case-insensitive predicate.

use crate::expression::{Accessor, Predicate, SynthesisResult};
use crate::method::{ordinal_ignore_case, string_comparison_type, MethodRegistry};
use crate::synthesis::{call_method_type_many, call_method_type_static_self, not};
use crate::types::{TypeDesc, Value};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Condition applied by a string column filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StringCondition {
    #[default]
    Contains,
    DoesNotContain,
    StartsWith,
    EndsWith,
    IsEqualTo,
    IsNotEqualTo,
    IsNullOrEmpty,
    IsNotNullOrEmpty,
}

impl StringCondition {
    /// Every condition, in the order a condition picker lists them
    pub const ALL: [StringCondition; 8] = [
        StringCondition::Contains,
        StringCondition::DoesNotContain,
        StringCondition::StartsWith,
        StringCondition::EndsWith,
        StringCondition::IsEqualTo,
        StringCondition::IsNotEqualTo,
        StringCondition::IsNullOrEmpty,
        StringCondition::IsNotNullOrEmpty,
    ];

    /// Label shown to users
    pub fn label(&self) -> &'static str {
        match self {
            StringCondition::Contains => "Contains",
            StringCondition::DoesNotContain => "Does not contain",
            StringCondition::StartsWith => "Starts with",
            StringCondition::EndsWith => "Ends with",
            StringCondition::IsEqualTo => "Is equal to",
            StringCondition::IsNotEqualTo => "Is not equal to",
            StringCondition::IsNullOrEmpty => "Is null or empty",
            StringCondition::IsNotNullOrEmpty => "Is not null or empty",
        }
    }

    /// Whether the filter's query text is used by this condition
    pub fn uses_query(&self) -> bool {
        !matches!(
            self,
            StringCondition::IsNullOrEmpty | StringCondition::IsNotNullOrEmpty
        )
    }

    /// Instance method backing the condition and whether its result is negated
    fn method(&self) -> Option<(&'static str, bool)> {
        match self {
            StringCondition::Contains => Some(("Contains", false)),
            StringCondition::DoesNotContain => Some(("Contains", true)),
            StringCondition::StartsWith => Some(("StartsWith", false)),
            StringCondition::EndsWith => Some(("EndsWith", false)),
            StringCondition::IsEqualTo => Some(("Equals", false)),
            StringCondition::IsNotEqualTo => Some(("Equals", true)),
            StringCondition::IsNullOrEmpty | StringCondition::IsNotNullOrEmpty => None,
        }
    }
}

impl fmt::Display for StringCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Filter state of a string column
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StringFilter {
    pub condition: StringCondition,
    pub query: String,
}

impl StringFilter {
    pub fn new(condition: StringCondition, query: impl Into<String>) -> Self {
        Self {
            condition,
            query: query.into(),
        }
    }

    /// Build the predicate for a string column.
    ///
    /// Null and empty cells never match a positive condition and always match
    /// a negated one; no method is ever called on a null cell.
    pub fn build(&self, registry: &MethodRegistry, column: &Accessor) -> SynthesisResult<Predicate> {
        let is_null_or_empty = call_method_type_static_self(
            registry,
            column,
            &TypeDesc::String,
            "IsNullOrEmpty",
            TypeDesc::String,
        )?;

        let predicate = match self.condition.method() {
            None if self.condition == StringCondition::IsNullOrEmpty => is_null_or_empty,
            None => not(&is_null_or_empty),
            Some((method, negated)) => {
                let matches = call_method_type_many(
                    registry,
                    column,
                    &TypeDesc::String,
                    method,
                    &[TypeDesc::String, string_comparison_type()],
                    vec![Value::from(self.query.as_str()), ordinal_ignore_case()],
                )?;
                if negated {
                    is_null_or_empty.or(&not(&matches))?
                } else {
                    not(&is_null_or_empty).and(&matches)?
                }
            }
        };

        debug!("built {} filter: {}", self.condition, predicate);
        Ok(predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Record, RecordType};
    use std::sync::Arc;

    fn person() -> Arc<RecordType> {
        RecordType::builder("Person")
            .property("Name", TypeDesc::String)
            .field("Age", TypeDesc::Int32)
            .build()
    }

    fn rows(person: &Arc<RecordType>) -> Vec<Record> {
        [Some("Ada Lovelace"), Some("GRACE Hopper"), Some(""), None]
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                Record::new(person.clone(), vec![Value::from(name), Value::Int32(i as i32)])
                    .unwrap()
            })
            .collect()
    }

    fn matching(filter: &StringFilter) -> Vec<i32> {
        let person = person();
        let registry = MethodRegistry::with_builtins();
        let column = Accessor::property(&person, "Name").unwrap().boxed().unwrap();
        let predicate = filter.build(&registry, &column).unwrap();

        let rows = rows(&person);
        predicate
            .filter(&rows)
            .unwrap()
            .into_iter()
            .map(|r| match r.get_by_name("Age") {
                Some(Value::Int32(i)) => *i,
                other => panic!("unexpected age {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_positive_conditions() {
        let filter = StringFilter::new(StringCondition::Contains, "grace");
        assert_eq!(matching(&filter), vec![1]);

        let filter = StringFilter::new(StringCondition::StartsWith, "ada");
        assert_eq!(matching(&filter), vec![0]);

        let filter = StringFilter::new(StringCondition::EndsWith, "HOPPER");
        assert_eq!(matching(&filter), vec![1]);

        let filter = StringFilter::new(StringCondition::IsEqualTo, "ada lovelace");
        assert_eq!(matching(&filter), vec![0]);
    }

    #[test]
    fn test_negated_conditions_include_null_and_empty() {
        let filter = StringFilter::new(StringCondition::DoesNotContain, "grace");
        assert_eq!(matching(&filter), vec![0, 2, 3]);

        let filter = StringFilter::new(StringCondition::IsNotEqualTo, "ADA LOVELACE");
        assert_eq!(matching(&filter), vec![1, 2, 3]);
    }

    #[test]
    fn test_null_or_empty_conditions() {
        let filter = StringFilter::new(StringCondition::IsNullOrEmpty, "ignored");
        assert_eq!(matching(&filter), vec![2, 3]);

        let filter = StringFilter::new(StringCondition::IsNotNullOrEmpty, "");
        assert_eq!(matching(&filter), vec![0, 1]);
    }

    #[test]
    fn test_built_shape() {
        let person = person();
        let registry = MethodRegistry::with_builtins();
        let column = Accessor::property(&person, "Name").unwrap();

        let predicate = StringFilter::new(StringCondition::StartsWith, "A")
            .build(&registry, &column)
            .unwrap();
        assert_eq!(predicate.parameter(), column.parameter());
        assert_eq!(
            predicate.to_string(),
            "x => (Not(String.IsNullOrEmpty(x.Name)) AndAlso \
             x.Name.StartsWith(\"A\", StringComparison.OrdinalIgnoreCase))"
        );
    }

    #[test]
    fn test_non_string_column_rejected() {
        let person = person();
        let registry = MethodRegistry::with_builtins();
        let column = Accessor::property(&person, "Age").unwrap();

        let err = StringFilter::default().build(&registry, &column).unwrap_err();
        assert!(matches!(
            err,
            crate::expression::SynthesisError::ArgumentTypeMismatch { .. }
        ));
    }

    #[test]
    fn test_labels() {
        assert_eq!(StringCondition::ALL.len(), 8);
        assert_eq!(StringCondition::DoesNotContain.to_string(), "Does not contain");
        assert_eq!(StringCondition::default(), StringCondition::Contains);
        assert!(StringCondition::Contains.uses_query());
        assert!(!StringCondition::IsNotNullOrEmpty.uses_query());
    }

    #[test]
    fn test_filter_state_roundtrip() {
        let filter = StringFilter::new(StringCondition::EndsWith, "son");
        let bytes = bincode::serialize(&filter).unwrap();
        let restored: StringFilter = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored, filter);
    }
}
