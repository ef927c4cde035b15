//! # Value Type System
//!
//! Core value types: Int32, Int64, Float64, String, Bool, Null, Vector, VectorInt8, Timestamp.
//! Arbitrary arity tuples built on these types back the relation schema and
//! statement-parsing modules that sit in front of the control-flow IR core.
//!
//! ## Usage
//!
//! ```rust
//! use stratalog::value::{Value, Tuple, TupleSchema, DataType};
//!
//! // Create a 3-tuple with mixed types
//! let tuple = Tuple::new(vec![
//!     Value::Int32(1),
//!     Value::String("hello".into()),
//!     Value::Float64(3.14),
//! ]);
//!
//! // Define a schema
//! let schema = TupleSchema::new(vec![
//!     ("id".to_string(), DataType::Int32),
//!     ("name".to_string(), DataType::String),
//!     ("score".to_string(), DataType::Float64),
//! ]);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Supported data types for Datalog values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int32,
    Int64,
    Float64,
    String,
    Bool,
    /// Unix timestamp in milliseconds.
    Timestamp,
    /// Embedding vector; `None` dimension means "any length".
    Vector(Option<usize>),
    VectorInt8(Option<usize>),
    Null,
}

impl DataType {
    /// A vector type with no fixed dimension.
    pub fn vector_any() -> Self {
        DataType::Vector(None)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int32 => write!(f, "int32"),
            DataType::Int64 => write!(f, "int64"),
            DataType::Float64 => write!(f, "float64"),
            DataType::String => write!(f, "string"),
            DataType::Bool => write!(f, "bool"),
            DataType::Timestamp => write!(f, "timestamp"),
            DataType::Vector(None) => write!(f, "vector"),
            DataType::Vector(Some(n)) => write!(f, "vector[{n}]"),
            DataType::VectorInt8(None) => write!(f, "vector_int8"),
            DataType::VectorInt8(Some(n)) => write!(f, "vector_int8[{n}]"),
            DataType::Null => write!(f, "null"),
        }
    }
}

/// A single Datalog value of arbitrary type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
    Bool(bool),
    /// Unix timestamp in milliseconds.
    Timestamp(i64),
    Vector(Vec<f32>),
    VectorInt8(Vec<i8>),
    Null,
}

impl Value {
    /// Construct a string value from anything convertible into `String`.
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// The data type this value belongs to.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int32(_) => DataType::Int32,
            Value::Int64(_) => DataType::Int64,
            Value::Float64(_) => DataType::Float64,
            Value::String(_) => DataType::String,
            Value::Bool(_) => DataType::Bool,
            Value::Timestamp(_) => DataType::Timestamp,
            Value::Vector(v) => DataType::Vector(Some(v.len())),
            Value::VectorInt8(v) => DataType::VectorInt8(Some(v.len())),
            Value::Null => DataType::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v:?}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{v}"),
            Value::Vector(v) => write!(f, "{v:?}"),
            Value::VectorInt8(v) => write!(f, "{v:?}"),
            Value::Null => write!(f, "null"),
        }
    }
}

/// An arbitrary-arity tuple of [`Value`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuple {
    values: Vec<Value>,
}

impl Tuple {
    pub fn new(values: Vec<Value>) -> Self {
        Tuple { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn arity(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, ")")
    }
}

/// The named, typed shape of a [`Tuple`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleSchema {
    fields: Vec<(String, DataType)>,
}

impl TupleSchema {
    pub fn new(fields: Vec<(String, DataType)>) -> Self {
        TupleSchema { fields }
    }

    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    pub fn field_name(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|(name, _)| name.as_str())
    }

    pub fn field_type(&self, index: usize) -> Option<&DataType> {
        self.fields.get(index).map(|(_, ty)| ty)
    }

    /// Checks that `tuple` has the right arity and that each value is
    /// assignable to its column's declared type.
    pub fn validate(&self, tuple: &Tuple) -> Result<(), SchemaValidationError> {
        if tuple.arity() != self.arity() {
            return Err(SchemaValidationError::ArityMismatch {
                expected: self.arity(),
                found: tuple.arity(),
            });
        }
        for (index, ((name, expected), value)) in
            self.fields.iter().zip(tuple.values()).enumerate()
        {
            let actual = value.data_type();
            if &actual != expected && !matches!(value, Value::Null) {
                return Err(SchemaValidationError::TypeMismatch {
                    column: name.clone(),
                    index,
                    expected: expected.clone(),
                    found: actual,
                });
            }
        }
        Ok(())
    }
}

/// Errors produced while validating a [`Tuple`] against a [`TupleSchema`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaValidationError {
    #[error("expected {expected} columns, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("column '{column}' (index {index}): expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        index: usize,
        expected: DataType,
        found: DataType,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_string_constructor() {
        assert_eq!(Value::string("hi"), Value::String("hi".to_string()));
    }

    #[test]
    fn value_data_type_roundtrip() {
        assert_eq!(Value::Int32(1).data_type(), DataType::Int32);
        assert_eq!(Value::Vector(vec![1.0, 2.0]).data_type(), DataType::Vector(Some(2)));
    }

    #[test]
    fn tuple_schema_validates_arity_and_types() {
        let schema = TupleSchema::new(vec![
            ("id".to_string(), DataType::Int64),
            ("name".to_string(), DataType::String),
        ]);

        let good = Tuple::new(vec![Value::Int64(1), Value::string("alice")]);
        assert!(schema.validate(&good).is_ok());

        let wrong_arity = Tuple::new(vec![Value::Int64(1)]);
        assert!(matches!(
            schema.validate(&wrong_arity),
            Err(SchemaValidationError::ArityMismatch { expected: 2, found: 1 })
        ));

        let wrong_type = Tuple::new(vec![Value::string("nope"), Value::string("alice")]);
        assert!(matches!(
            schema.validate(&wrong_type),
            Err(SchemaValidationError::TypeMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn tuple_display() {
        let t = Tuple::new(vec![Value::Int32(1), Value::Bool(true)]);
        assert_eq!(format!("{t}"), "(1, true)");
    }
}
