//! End-to-end scenarios over the public operation surface: binary operations
//! by name, unary operations, and casts of whole columns.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::context::{CancellationToken, Context};
use crate::error::StoreError;
use crate::operation::cast::{can_cast, cast};
use crate::operation::map::{names, run_binary_map, run_zip};
use crate::operation::unary;
use crate::problems::{Problem, ProblemAggregator};
use crate::storage::{BoolStorage, Column, DoubleStorage, LongStorage, ObjectStorage, Storage, TextStorage};
use crate::types::{IntegerType, StorageType, TextType, Value};

fn longs(values: &[Option<i64>]) -> Storage {
    Storage::Long(LongStorage::from_options(values.to_vec(), IntegerType::INT_64))
}

//==================================================================================
// 1. Arithmetic
//==================================================================================

#[test]
fn test_integer_addition_propagates_nulls() {
    let ctx = Context::default();
    let problems = ProblemAggregator::new();
    let left = longs(&[Some(1), Some(2), None, Some(4)]);
    let right = longs(&[Some(10), Some(20), Some(30), Some(40)]);

    let out = run_zip(&left, names::ADD, &right, &ctx, &problems).unwrap();

    assert_eq!(out.storage_type(), StorageType::INT_64);
    assert_eq!(
        out.to_values(),
        vec![Value::Long(11), Value::Long(22), Value::Null, Value::Long(44)]
    );
    assert!(problems.is_empty());
}

#[test]
fn test_integer_division_by_zero_is_reported_at_its_row() {
    let ctx = Context::default();
    let problems = ProblemAggregator::new();
    let out = run_zip(&longs(&[Some(10)]), names::DIV, &longs(&[Some(0)]), &ctx, &problems).unwrap();

    assert_eq!(out.to_values(), vec![Value::Null]);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems.problems()[0].problem, Problem::DivisionByZero { row: 0 });

    let out = run_zip(&longs(&[Some(7)]), names::MOD, &longs(&[Some(0)]), &ctx, &problems).unwrap();
    assert_eq!(out.to_values(), vec![Value::Null]);
    assert_eq!(problems.count("division_by_zero"), 2);
}

#[test]
fn test_float_division_by_zero_is_silent() {
    let ctx = Context::default();
    let problems = ProblemAggregator::new();
    let doubles = Storage::Double(DoubleStorage::from_options(vec![Some(1.0), Some(-1.0)]));

    let out = run_binary_map(&doubles, names::DIV, &Value::Double(0.0), &ctx, &problems).unwrap();

    assert_eq!(
        out.to_values(),
        vec![Value::Double(f64::INFINITY), Value::Double(f64::NEG_INFINITY)]
    );
    assert!(problems.is_empty());
}

#[test]
fn test_numeric_promotion_lattice() {
    let ctx = Context::default();
    let problems = ProblemAggregator::new();

    let big = Value::BigInteger(BigInt::from(5));
    let out = run_binary_map(&longs(&[Some(1)]), names::ADD, &big, &ctx, &problems).unwrap();
    assert_eq!(out.storage_type(), StorageType::BigInteger);
    assert_eq!(out.to_values(), vec![Value::BigInteger(BigInt::from(6))]);

    let bigs = Storage::BigInteger(ObjectStorage::new(vec![Some(BigInt::from(2))]));
    let half = Value::BigDecimal(BigDecimal::from_str("0.5").unwrap());
    let out = run_binary_map(&bigs, names::ADD, &half, &ctx, &problems).unwrap();
    assert_eq!(out.storage_type(), StorageType::BigDecimal);
    assert_eq!(
        out.to_values(),
        vec![Value::BigDecimal(BigDecimal::from_str("2.5").unwrap())]
    );

    let out = run_binary_map(&longs(&[Some(i64::MAX)]), names::MUL, &Value::Long(2), &ctx, &problems).unwrap();
    assert_eq!(
        out.to_values(),
        vec![Value::BigInteger(BigInt::from(i64::MAX) * 2)]
    );
    assert!(problems.is_empty());
}

//==================================================================================
// 2. Comparison & Coalescing
//==================================================================================

#[test]
fn test_float_equality_is_reported_once_per_invocation() {
    let ctx = Context::default();
    let problems = ProblemAggregator::new();
    let doubles = Storage::Double(DoubleStorage::from_options(vec![Some(1.0), Some(2.0), Some(3.0)]));

    let out = run_binary_map(&doubles, names::EQ, &Value::Long(2), &ctx, &problems).unwrap();

    assert_eq!(
        out.to_values(),
        vec![Value::Boolean(false), Value::Boolean(true), Value::Boolean(false)]
    );
    assert_eq!(problems.count("floating_point_equality"), 1);
}

#[test]
fn test_coalescing_skips_a_single_null() {
    let ctx = Context::default();
    let problems = ProblemAggregator::new();
    let left = longs(&[Some(1), None, Some(3), None]);
    let right = longs(&[None, Some(2), Some(5), None]);

    let min = run_zip(&left, names::MIN, &right, &ctx, &problems).unwrap();
    assert_eq!(
        min.to_values(),
        vec![Value::Long(1), Value::Long(2), Value::Long(3), Value::Null]
    );
    let max = run_zip(&left, names::MAX, &right, &ctx, &problems).unwrap();
    assert_eq!(
        max.to_values(),
        vec![Value::Long(1), Value::Long(2), Value::Long(5), Value::Null]
    );
}

//==================================================================================
// 3. Unary
//==================================================================================

#[test]
fn test_not_is_involutive() {
    let ctx = Context::default();
    let problems = ProblemAggregator::new();
    let bools = Storage::Bool(BoolStorage::from_options(vec![Some(true), None, Some(false)]));

    let once = unary::apply(&bools, unary::names::NOT, &ctx, &problems).unwrap();
    let twice = unary::apply(&once, unary::names::NOT, &ctx, &problems).unwrap();

    assert_eq!(
        once.to_values(),
        vec![Value::Boolean(false), Value::Null, Value::Boolean(true)]
    );
    assert_eq!(twice.to_values(), bools.to_values());
}

#[test]
fn test_unsupported_unary_is_structural() {
    let ctx = Context::default();
    let problems = ProblemAggregator::new();
    let texts = Storage::Text(TextStorage::from_strs(&[Some("a")], TextType::VARIABLE_LENGTH));
    assert!(!texts.is_unary_op_vectorized(unary::names::CEIL));
    let err = unary::apply(&texts, unary::names::CEIL, &ctx, &problems).unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedOperation { .. }));
}

//==================================================================================
// 4. Casts
//==================================================================================

#[test]
fn test_cast_to_own_type_is_identity() {
    let ctx = Context::default();
    let problems = ProblemAggregator::new();
    let column = Column::new("a", longs(&[Some(1), None]));
    let out = cast(&column, StorageType::INT_64, &ctx, &problems).unwrap();
    assert_eq!(out.storage(), column.storage());
    assert_eq!(out.name(), "a");
    assert!(can_cast(&StorageType::INT_64, &StorageType::INT_64));
}

#[test]
fn test_text_cast_truncates_with_problem() {
    let ctx = Context::default();
    let problems = ProblemAggregator::new();
    let column = Column::new(
        "greeting",
        Storage::Text(TextStorage::from_strs(&[Some("hello")], TextType::VARIABLE_LENGTH)),
    );

    let out = cast(&column, StorageType::Text(TextType::fixed_length(3)), &ctx, &problems).unwrap();

    assert_eq!(out.storage().to_values(), vec![Value::from("hel")]);
    assert_eq!(problems.count("text_too_long"), 1);
    let origin = problems.problems()[0].origin.clone().unwrap();
    assert_eq!(origin.column_name, "greeting");
}

#[test]
fn test_decimal_cast_to_bounded_integer_truncates() {
    let ctx = Context::default();
    let problems = ProblemAggregator::new();
    let column = Column::new(
        "d",
        Storage::BigDecimal(ObjectStorage::new(vec![Some(BigDecimal::from_str("1.9").unwrap())])),
    );

    let out = cast(&column, StorageType::Integer(IntegerType::INT_32), &ctx, &problems).unwrap();

    assert_eq!(out.storage_type(), StorageType::Integer(IntegerType::INT_32));
    assert_eq!(out.storage().to_values(), vec![Value::Long(1)]);
    assert!(problems.is_empty());
}

//==================================================================================
// 5. Cancellation
//==================================================================================

#[test]
fn test_cancelled_operation_unwinds() {
    let token = CancellationToken::new();
    let ctx = Context::with_token(token.clone());
    let problems = ProblemAggregator::new();
    let values: Vec<Option<i64>> = (0..10_000).map(Some).collect();
    let storage = longs(&values);

    token.cancel();
    let err = run_binary_map(&storage, names::ADD, &Value::Long(1), &ctx, &problems).unwrap_err();
    assert!(matches!(err, StoreError::Cancelled));

    let column = Column::new("c", storage);
    let err = cast(&column, StorageType::FLOAT_64, &ctx, &problems).unwrap_err();
    assert!(matches!(err, StoreError::Cancelled));
}
