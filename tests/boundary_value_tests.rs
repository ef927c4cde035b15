//! Boundary Value Tests
//!
//! Tests at exact boundary conditions - many bugs occur at exact limits.
//!
//! Tests for value handling at system boundaries:
//! - Integer boundaries (INT32_MIN/MAX, INT64_MIN/MAX)
//! - Float boundaries
//! - String boundaries (empty, long, Unicode)
//! - Vector boundaries
//! - Arity boundaries

use stratalog::{Tuple, Value};

#[test]
fn int32_boundaries_roundtrip() {
    let t = Tuple::new(vec![Value::Int32(i32::MAX), Value::Int32(i32::MIN)]);
    assert_eq!(t.get(0), Some(&Value::Int32(i32::MAX)));
    assert_eq!(t.get(1), Some(&Value::Int32(i32::MIN)));
}

#[test]
fn int64_boundaries_roundtrip() {
    let t = Tuple::new(vec![Value::Int64(i64::MAX), Value::Int64(i64::MIN)]);
    assert_eq!(t.get(0), Some(&Value::Int64(i64::MAX)));
    assert_eq!(t.get(1), Some(&Value::Int64(i64::MIN)));
}

#[test]
fn float_boundaries_roundtrip() {
    let t = Tuple::new(vec![
        Value::Float64(f64::MAX),
        Value::Float64(f64::MIN),
        Value::Float64(0.0),
        Value::Float64(-0.0),
    ]);
    assert_eq!(t.arity(), 4);
    assert_eq!(t.get(0), Some(&Value::Float64(f64::MAX)));
}

#[test]
fn empty_string_is_distinct_from_null() {
    let empty = Value::string("");
    let null = Value::Null;
    assert_ne!(empty, null);
    assert!(null.is_null());
    assert!(!empty.is_null());
}

#[test]
fn long_unicode_string_roundtrips() {
    let s: String = "\u{1F600}".repeat(10_000);
    let t = Tuple::new(vec![Value::string(s.clone())]);
    assert_eq!(t.get(0), Some(&Value::String(s)));
}

#[test]
fn empty_vector_has_zero_length() {
    let v = Value::Vector(Vec::new());
    assert_eq!(v.data_type(), stratalog::DataType::Vector(Some(0)));
}

#[test]
fn zero_arity_tuple_is_valid() {
    let t = Tuple::new(Vec::new());
    assert_eq!(t.arity(), 0);
    assert_eq!(t.values(), &[]);
}
