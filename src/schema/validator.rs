//! # Schema Validation Engine
//!
//! Validates tuples against schema definitions with support for:
//! - Type checking
//! - Arity checking (correct number of columns)
//! - All-or-nothing batch semantics
//! - Violation reporting

use super::RelationSchema;
use crate::value::Tuple;

/// Represents a validation violation
#[derive(Debug, Clone)]
pub struct Violation {
    /// Index of the tuple in the batch that violated
    pub tuple_index: usize,
    /// The violating tuple
    pub tuple: Tuple,
    /// Column that failed validation (if applicable)
    pub column: Option<String>,
    /// Type of violation
    pub violation_type: ViolationType,
    /// Human-readable message
    pub message: String,
}

impl Violation {
    /// Create a new violation
    pub fn new(
        tuple_index: usize,
        tuple: Tuple,
        column: Option<String>,
        violation_type: ViolationType,
        message: impl Into<String>,
    ) -> Self {
        Violation {
            tuple_index,
            tuple,
            column,
            violation_type,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.column {
            Some(col) => write!(
                f,
                "Tuple #{}: column '{}' - {} ({})",
                self.tuple_index, col, self.violation_type, self.message
            ),
            None => write!(
                f,
                "Tuple #{}: {} ({})",
                self.tuple_index, self.violation_type, self.message
            ),
        }
    }
}

/// Types of validation violations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationType {
    /// The tuple's arity didn't match the schema's column count.
    ArityMismatch,
    /// A column's value didn't match its declared [`super::SchemaType`].
    TypeMismatch,
    /// A `@not_empty` column held an empty string or zero-length vector.
    MissingRequired,
    /// A `@unique` column repeated a value already seen in the batch.
    DuplicateValue,
    /// A `@range` column's value fell outside its declared bounds.
    OutOfRange,
    /// A `@pattern` column's value didn't match its regular expression.
    PatternMismatch,
    /// A check constraint referenced by the relation's validation config failed.
    CheckFailed,
}

impl std::fmt::Display for ViolationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ViolationType::ArityMismatch => "arity mismatch",
            ViolationType::TypeMismatch => "type mismatch",
            ViolationType::MissingRequired => "missing required value",
            ViolationType::DuplicateValue => "duplicate value",
            ViolationType::OutOfRange => "out of range",
            ViolationType::PatternMismatch => "pattern mismatch",
            ViolationType::CheckFailed => "check failed",
        };
        write!(f, "{label}")
    }
}

/// Raised by [`ValidationEngine::validate_batch`] when one or more tuples
/// violate the relation's schema. Batch semantics are all-or-nothing: a
/// single violation fails the whole batch, with every violation reported.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{} violation(s) in batch", self.0.len())]
pub struct ValidationError(pub Vec<Violation>);

impl ValidationError {
    pub fn violations(&self) -> &[Violation] {
        &self.0
    }
}

/// Validates batches of tuples against a [`RelationSchema`].
#[derive(Debug, Default)]
pub struct ValidationEngine;

impl ValidationEngine {
    pub fn new() -> Self {
        ValidationEngine
    }

    /// Validates every tuple in `tuples` against `schema`, collecting all
    /// violations rather than stopping at the first. Returns `Ok(())` only
    /// if every tuple is clean.
    pub fn validate_batch(
        &self,
        schema: &RelationSchema,
        tuples: &[Tuple],
    ) -> Result<(), ValidationError> {
        let mut violations = Vec::new();
        let mut seen_unique: std::collections::HashMap<usize, std::collections::HashSet<String>> =
            std::collections::HashMap::new();

        for (tuple_index, tuple) in tuples.iter().enumerate() {
            if tuple.arity() != schema.arity() {
                violations.push(Violation::new(
                    tuple_index,
                    tuple.clone(),
                    None,
                    ViolationType::ArityMismatch,
                    format!(
                        "expected {} columns, found {}",
                        schema.arity(),
                        tuple.arity()
                    ),
                ));
                continue;
            }

            for (col_index, column) in schema.columns.iter().enumerate() {
                let Some(value) = tuple.get(col_index) else {
                    continue;
                };

                if !column.data_type.matches(value) {
                    violations.push(Violation::new(
                        tuple_index,
                        tuple.clone(),
                        Some(column.name.clone()),
                        ViolationType::TypeMismatch,
                        format!("expected {}, found {value}", column.data_type),
                    ));
                    continue;
                }

                if column.is_not_empty() && is_empty_value(value) {
                    violations.push(Violation::new(
                        tuple_index,
                        tuple.clone(),
                        Some(column.name.clone()),
                        ViolationType::MissingRequired,
                        "value must not be empty",
                    ));
                }

                if column.is_unique() {
                    let key = value.to_string();
                    let slot = seen_unique.entry(col_index).or_default();
                    if !slot.insert(key) {
                        violations.push(Violation::new(
                            tuple_index,
                            tuple.clone(),
                            Some(column.name.clone()),
                            ViolationType::DuplicateValue,
                            "value must be unique within the batch",
                        ));
                    }
                }

                if let Some((min, max)) = column.range() {
                    if let Some(n) = as_i64(value) {
                        if n < min || n > max {
                            violations.push(Violation::new(
                                tuple_index,
                                tuple.clone(),
                                Some(column.name.clone()),
                                ViolationType::OutOfRange,
                                format!("{n} not in [{min}, {max}]"),
                            ));
                        }
                    }
                }

                if let Some(pattern) = column.pattern() {
                    if let Ok(re) = regex::Regex::new(pattern) {
                        if let crate::value::Value::String(s) = value {
                            if !re.is_match(s) {
                                violations.push(Violation::new(
                                    tuple_index,
                                    tuple.clone(),
                                    Some(column.name.clone()),
                                    ViolationType::PatternMismatch,
                                    format!("'{s}' does not match /{pattern}/"),
                                ));
                            }
                        }
                    }
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError(violations))
        }
    }
}

fn is_empty_value(value: &crate::value::Value) -> bool {
    match value {
        crate::value::Value::String(s) => s.is_empty(),
        crate::value::Value::Vector(v) => v.is_empty(),
        crate::value::Value::VectorInt8(v) => v.is_empty(),
        _ => false,
    }
}

fn as_i64(value: &crate::value::Value) -> Option<i64> {
    match value {
        crate::value::Value::Int32(n) => Some(i64::from(*n)),
        crate::value::Value::Int64(n) => Some(*n),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnAnnotation, ColumnSchema, SchemaType};
    use crate::value::Value;

    fn schema() -> RelationSchema {
        RelationSchema::new("User")
            .with_column(
                ColumnSchema::new("id", SchemaType::Int).with_annotation(ColumnAnnotation::Unique),
            )
            .with_column(
                ColumnSchema::new("name", SchemaType::String)
                    .with_annotation(ColumnAnnotation::NotEmpty),
            )
    }

    #[test]
    fn accepts_clean_batch() {
        let engine = ValidationEngine::new();
        let tuples = vec![Tuple::new(vec![Value::Int64(1), Value::string("alice")])];
        assert!(engine.validate_batch(&schema(), &tuples).is_ok());
    }

    #[test]
    fn rejects_duplicate_unique_column() {
        let engine = ValidationEngine::new();
        let tuples = vec![
            Tuple::new(vec![Value::Int64(1), Value::string("alice")]),
            Tuple::new(vec![Value::Int64(1), Value::string("bob")]),
        ];
        let err = engine.validate_batch(&schema(), &tuples).unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.violations()[0].violation_type, ViolationType::DuplicateValue);
    }

    #[test]
    fn rejects_empty_required_column() {
        let engine = ValidationEngine::new();
        let tuples = vec![Tuple::new(vec![Value::Int64(1), Value::string("")])];
        let err = engine.validate_batch(&schema(), &tuples).unwrap_err();
        assert_eq!(err.violations()[0].violation_type, ViolationType::MissingRequired);
    }
}
