//! Unary operations dispatched by symbolic name.
//!
//! Unlike binary operations, a unary operation is not owned by one storage
//! family: each declares which storage types it supports. A mixed storage is
//! specialized to the common type of its values when the operation does not
//! handle boxed values itself.

use std::sync::OnceLock;

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{Datelike, NaiveDate, Timelike};
use hashbrown::HashMap;
use num_bigint::BigInt;
use num_traits::FromPrimitive;

use crate::builder::{
    for_type, BoolBuilder, Builder, InferredIntegerBuilder, LongBuilder, ObjectBuilder,
};
use crate::context::Context;
use crate::error::StoreError;
use crate::operation::iterators::{
    build_over_doubles, build_over_items, build_over_storage, build_over_texts, for_each_row,
};
use crate::problems::ProblemAggregator;
use crate::storage::{NullStorage, Storage};
use crate::types::{IntegerType, StorageType, Value};

pub mod names {
    pub const NOT: &str = "not";
    pub const IS_NOTHING: &str = "is_nothing";
    pub const IS_EMPTY: &str = "is_empty";
    pub const TEXT_LENGTH: &str = "text_length";
    pub const IS_NAN: &str = "is_nan";
    pub const IS_INFINITE: &str = "is_infinite";
    pub const IS_FINITE: &str = "is_finite";
    pub const CEIL: &str = "ceil";
    pub const FLOOR: &str = "floor";
    pub const TRUNCATE: &str = "truncate";
    pub const YEAR: &str = "year";
    pub const QUARTER: &str = "quarter";
    pub const MONTH: &str = "month";
    pub const WEEK: &str = "week";
    pub const DAY: &str = "day";
    pub const DAY_OF_YEAR: &str = "day_of_year";
    pub const DAY_OF_WEEK: &str = "day_of_week";
    pub const HOUR: &str = "hour";
    pub const MINUTE: &str = "minute";
    pub const SECOND: &str = "second";
    pub const MILLISECOND: &str = "millisecond";
}

//==================================================================================
// 1. Contract & Registry
//==================================================================================

pub trait UnaryOperation: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the operation runs directly on storages of `storage_type`.
    fn supports(&self, storage_type: &StorageType) -> bool;

    /// Whether the operation gives something other than null on a null
    /// storage. Others short-circuit to an all-null result.
    fn handles_nothing(&self) -> bool {
        false
    }

    fn run(
        &self,
        storage: &Storage,
        ctx: &Context,
        problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError>;

    /// Whether `apply` would succeed in dispatching on `storage`.
    fn can_apply(&self, storage: &Storage) -> bool {
        match storage {
            Storage::Facade(f) => self.can_apply(f.inner()),
            Storage::Null(_) => true,
            Storage::Mixed(_) if self.supports(&StorageType::AnyObject) => true,
            Storage::Mixed(_) => self.supports(&storage.infer_precise_type()),
            other => self.supports(&other.storage_type()),
        }
    }
}

fn registry() -> &'static HashMap<&'static str, Box<dyn UnaryOperation>> {
    static REGISTRY: OnceLock<HashMap<&'static str, Box<dyn UnaryOperation>>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let ops: Vec<Box<dyn UnaryOperation>> = vec![
            Box::new(Not),
            Box::new(IsNothing),
            Box::new(IsEmpty),
            Box::new(TextLength),
            Box::new(FloatPredicate::IsNan),
            Box::new(FloatPredicate::IsInfinite),
            Box::new(FloatPredicate::IsFinite),
            Box::new(Round::Ceil),
            Box::new(Round::Floor),
            Box::new(Round::Truncate),
            Box::new(DatePart::Year),
            Box::new(DatePart::Quarter),
            Box::new(DatePart::Month),
            Box::new(DatePart::Week),
            Box::new(DatePart::Day),
            Box::new(DatePart::DayOfYear),
            Box::new(DatePart::DayOfWeek),
            Box::new(DatePart::Hour),
            Box::new(DatePart::Minute),
            Box::new(DatePart::Second),
            Box::new(DatePart::Millisecond),
        ];
        let table: HashMap<_, _> = ops.into_iter().map(|op| (op.name(), op)).collect();
        log::debug!("Built unary operation registry with {} operations", table.len());
        table
    })
}

pub fn lookup(name: &str) -> Option<&'static dyn UnaryOperation> {
    registry().get(name).map(|op| op.as_ref())
}

/// Applies unary operation `name` to every row of `storage`.
pub fn apply(
    storage: &Storage,
    name: &str,
    ctx: &Context,
    problems: &ProblemAggregator,
) -> Result<Storage, StoreError> {
    let unsupported = || StoreError::unsupported_op(name, storage.storage_type());
    let op = lookup(name).ok_or_else(unsupported)?;
    match storage {
        Storage::Facade(f) => return apply(f.inner(), name, ctx, problems),
        Storage::Null(_) if !op.handles_nothing() => {
            return Ok(Storage::Null(NullStorage::new(storage.size())));
        }
        _ => {}
    }

    let storage_type = storage.storage_type();
    if op.supports(&storage_type) || matches!(storage, Storage::Null(_)) {
        log_metric!(
            "event" = "unary_op",
            "op" = name,
            "storage" = storage_type,
            "rows" = storage.size()
        );
        return op.run(storage, ctx, problems);
    }
    if let Storage::Mixed(_) = storage {
        let inferred = storage.infer_precise_type();
        if op.supports(&inferred) {
            let mut builder = for_type(inferred, storage.size(), problems);
            builder.append_bulk_storage(storage)?;
            log_metric!("event" = "mixed_specialized", "op" = name, "to" = inferred);
            return op.run(&builder.seal(), ctx, problems);
        }
    }
    Err(unsupported())
}

//==================================================================================
// 2. Logic & Null Probes
//==================================================================================

struct Not;

impl UnaryOperation for Not {
    fn name(&self) -> &'static str {
        names::NOT
    }

    fn supports(&self, storage_type: &StorageType) -> bool {
        matches!(storage_type, StorageType::Boolean | StorageType::AnyObject)
    }

    fn run(
        &self,
        storage: &Storage,
        ctx: &Context,
        _problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        if let Storage::Bool(s) = storage {
            return Ok(Storage::Bool(s.not()));
        }
        let builder = BoolBuilder::new(storage.size());
        build_over_storage(storage, true, builder, ctx, |b, _, value| match value {
            Value::Boolean(v) => {
                b.append_boolean(!v);
                Ok(())
            }
            _ => Err(StoreError::UnexpectedType("a Boolean".into())),
        })
    }
}

struct IsNothing;

impl UnaryOperation for IsNothing {
    fn name(&self) -> &'static str {
        names::IS_NOTHING
    }

    fn supports(&self, _: &StorageType) -> bool {
        true
    }

    fn handles_nothing(&self) -> bool {
        true
    }

    fn run(
        &self,
        storage: &Storage,
        ctx: &Context,
        _problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let mut builder = BoolBuilder::new(storage.size());
        for_each_row(storage.size(), ctx, |i| {
            builder.append_boolean(storage.is_null_at(i));
            Ok(())
        })?;
        Ok(Storage::Bool(builder.finish()))
    }
}

/// True for null and for the empty text.
struct IsEmpty;

impl UnaryOperation for IsEmpty {
    fn name(&self) -> &'static str {
        names::IS_EMPTY
    }

    fn supports(&self, storage_type: &StorageType) -> bool {
        matches!(storage_type, StorageType::Text(_) | StorageType::AnyObject)
    }

    fn handles_nothing(&self) -> bool {
        true
    }

    fn run(
        &self,
        storage: &Storage,
        ctx: &Context,
        _problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let builder = BoolBuilder::new(storage.size());
        build_over_storage(storage, false, builder, ctx, |b, _, value| {
            b.append_boolean(match value {
                Value::Null => true,
                Value::Text(t) => t.is_empty(),
                _ => false,
            });
            Ok(())
        })
    }
}

//==================================================================================
// 3. Text & Numeric
//==================================================================================

/// Length in characters.
struct TextLength;

impl UnaryOperation for TextLength {
    fn name(&self) -> &'static str {
        names::TEXT_LENGTH
    }

    fn supports(&self, storage_type: &StorageType) -> bool {
        matches!(storage_type, StorageType::Text(_))
    }

    fn run(
        &self,
        storage: &Storage,
        ctx: &Context,
        _problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let Storage::Text(s) = storage else {
            return Err(StoreError::unsupported_op(self.name(), storage.storage_type()));
        };
        let builder = LongBuilder::new(IntegerType::INT_64, storage.size());
        build_over_texts(s, builder, ctx, |b, _, text| {
            b.append_long(text.chars().count() as i64);
            Ok(())
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum FloatPredicate {
    IsNan,
    IsInfinite,
    IsFinite,
}

impl FloatPredicate {
    fn test(self, value: f64) -> bool {
        match self {
            FloatPredicate::IsNan => value.is_nan(),
            FloatPredicate::IsInfinite => value.is_infinite(),
            FloatPredicate::IsFinite => value.is_finite(),
        }
    }

    /// The answer for every exact (non-float) number.
    fn exact_answer(self) -> bool {
        matches!(self, FloatPredicate::IsFinite)
    }
}

impl UnaryOperation for FloatPredicate {
    fn name(&self) -> &'static str {
        match self {
            FloatPredicate::IsNan => names::IS_NAN,
            FloatPredicate::IsInfinite => names::IS_INFINITE,
            FloatPredicate::IsFinite => names::IS_FINITE,
        }
    }

    fn supports(&self, storage_type: &StorageType) -> bool {
        storage_type.is_numeric()
    }

    fn run(
        &self,
        storage: &Storage,
        ctx: &Context,
        _problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let builder = BoolBuilder::new(storage.size());
        match storage {
            Storage::Double(s) => build_over_doubles(s, builder, ctx, |b, _, v| {
                b.append_boolean(self.test(v));
                Ok(())
            }),
            other => build_over_storage(other, true, builder, ctx, |b, _, _| {
                b.append_boolean(self.exact_answer());
                Ok(())
            }),
        }
    }
}

/// Floats at or beyond this magnitude are rounded through big integers.
const LONG_ROUNDING_LIMIT: f64 = 9.223372036854775e18;

#[derive(Debug, Clone, Copy)]
enum Round {
    Ceil,
    Floor,
    Truncate,
}

impl Round {
    fn round_f64(self, value: f64) -> f64 {
        match self {
            Round::Ceil => value.ceil(),
            Round::Floor => value.floor(),
            Round::Truncate => value.trunc(),
        }
    }

    fn round_decimal(self, value: &BigDecimal) -> BigInt {
        let mode = match self {
            Round::Ceil => RoundingMode::Ceiling,
            Round::Floor => RoundingMode::Floor,
            Round::Truncate => RoundingMode::Down,
        };
        value.with_scale_round(0, mode).as_bigint_and_exponent().0
    }

    fn append_rounded_double(
        self,
        builder: &mut InferredIntegerBuilder,
        value: f64,
        row: usize,
        problems: &ProblemAggregator,
    ) {
        if !value.is_finite() {
            problems.report_arithmetic_error(format!("Cannot round {value} to an integer"), row);
            builder.append_nulls(1);
            return;
        }
        let rounded = self.round_f64(value);
        if rounded.abs() < LONG_ROUNDING_LIMIT {
            builder.append_long(rounded as i64);
        } else {
            match BigInt::from_f64(rounded) {
                Some(big) => builder.append_big_integer(big),
                None => builder.append_nulls(1),
            }
        }
    }
}

impl UnaryOperation for Round {
    fn name(&self) -> &'static str {
        match self {
            Round::Ceil => names::CEIL,
            Round::Floor => names::FLOOR,
            Round::Truncate => names::TRUNCATE,
        }
    }

    /// `truncate` also drops the time of a date-time, giving a date.
    fn supports(&self, storage_type: &StorageType) -> bool {
        storage_type.is_numeric()
            || matches!((self, storage_type), (Round::Truncate, StorageType::DateTime))
    }

    fn run(
        &self,
        storage: &Storage,
        ctx: &Context,
        problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let builder = InferredIntegerBuilder::new(storage.size());
        match storage {
            Storage::Long(_) | Storage::BigInteger(_) => Ok(storage.clone()),
            Storage::DateTime(s) if matches!(self, Round::Truncate) => {
                let dates = ObjectBuilder::<NaiveDate>::new(storage.size());
                build_over_items(s, dates, ctx, |b, _, dt| {
                    b.append_item(dt.date_naive());
                    Ok(())
                })
            }
            Storage::Double(s) => build_over_doubles(s, builder, ctx, |b, i, v| {
                self.append_rounded_double(b, v, i, problems);
                Ok(())
            }),
            Storage::BigDecimal(s) => build_over_items(s, builder, ctx, |b, _, v| {
                b.append_big_integer(self.round_decimal(v));
                Ok(())
            }),
            other => Err(StoreError::unsupported_op(self.name(), other.storage_type())),
        }
    }
}

//==================================================================================
// 4. Date & Time Parts
//==================================================================================

#[derive(Debug, Clone, Copy)]
enum DatePart {
    Year,
    Quarter,
    Month,
    /// ISO-8601 week of the year.
    Week,
    Day,
    DayOfYear,
    /// 1 for Monday through 7 for Sunday.
    DayOfWeek,
    Hour,
    Minute,
    Second,
    Millisecond,
}

impl DatePart {
    fn is_time_part(self) -> bool {
        matches!(
            self,
            DatePart::Hour | DatePart::Minute | DatePart::Second | DatePart::Millisecond
        )
    }

    fn of_date(self, date: &impl Datelike) -> i64 {
        match self {
            DatePart::Year => i64::from(date.year()),
            DatePart::Quarter => i64::from((date.month() - 1) / 3 + 1),
            DatePart::Month => i64::from(date.month()),
            DatePart::Week => i64::from(date.iso_week().week()),
            DatePart::Day => i64::from(date.day()),
            DatePart::DayOfYear => i64::from(date.ordinal()),
            DatePart::DayOfWeek => i64::from(date.weekday().number_from_monday()),
            _ => 0,
        }
    }

    fn of_time(self, time: &impl Timelike) -> i64 {
        match self {
            DatePart::Hour => i64::from(time.hour()),
            DatePart::Minute => i64::from(time.minute()),
            DatePart::Second => i64::from(time.second()),
            // Leap seconds carry nanoseconds past one second.
            DatePart::Millisecond => i64::from(time.nanosecond() / 1_000_000 % 1_000),
            _ => 0,
        }
    }
}

impl UnaryOperation for DatePart {
    fn name(&self) -> &'static str {
        match self {
            DatePart::Year => names::YEAR,
            DatePart::Quarter => names::QUARTER,
            DatePart::Month => names::MONTH,
            DatePart::Week => names::WEEK,
            DatePart::Day => names::DAY,
            DatePart::DayOfYear => names::DAY_OF_YEAR,
            DatePart::DayOfWeek => names::DAY_OF_WEEK,
            DatePart::Hour => names::HOUR,
            DatePart::Minute => names::MINUTE,
            DatePart::Second => names::SECOND,
            DatePart::Millisecond => names::MILLISECOND,
        }
    }

    fn supports(&self, storage_type: &StorageType) -> bool {
        if self.is_time_part() {
            storage_type.has_time()
        } else {
            storage_type.has_date()
        }
    }

    fn run(
        &self,
        storage: &Storage,
        ctx: &Context,
        _problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let part = *self;
        let builder = LongBuilder::new(IntegerType::INT_64, storage.size());
        match storage {
            Storage::Date(s) if !part.is_time_part() => build_over_items(s, builder, ctx, |b, _, d| {
                b.append_long(part.of_date(d));
                Ok(())
            }),
            Storage::DateTime(s) => build_over_items(s, builder, ctx, |b, _, dt| {
                let v = if part.is_time_part() {
                    part.of_time(dt)
                } else {
                    part.of_date(dt)
                };
                b.append_long(v);
                Ok(())
            }),
            Storage::TimeOfDay(s) if part.is_time_part() => {
                build_over_items(s, builder, ctx, |b, _, t| {
                    b.append_long(part.of_time(t));
                    Ok(())
                })
            }
            other => Err(StoreError::unsupported_op(self.name(), other.storage_type())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BoolStorage, DoubleStorage, ObjectStorage, TextStorage};
    use crate::types::TextType;
    use chrono::{FixedOffset, NaiveTime, TimeZone};
    use std::str::FromStr;

    fn run(storage: &Storage, name: &str) -> (Storage, ProblemAggregator) {
        let ctx = Context::default();
        let problems = ProblemAggregator::new();
        let out = apply(storage, name, &ctx, &problems).unwrap();
        (out, problems)
    }

    #[test]
    fn test_not_is_involutive() {
        let storage = Storage::Bool(BoolStorage::from_options(vec![Some(true), None, Some(false)]));
        let (once, _) = run(&storage, names::NOT);
        let (twice, _) = run(&once, names::NOT);
        assert_eq!(
            once.to_values(),
            vec![Value::Boolean(false), Value::Null, Value::Boolean(true)]
        );
        assert_eq!(twice.to_values(), storage.to_values());
    }

    #[test]
    fn test_rounding_doubles() {
        let storage = Storage::Double(DoubleStorage::from_options(vec![
            Some(1.5),
            Some(-1.5),
            None,
            Some(f64::NAN),
            Some(1e19),
        ]));
        let (floor, problems) = run(&storage, names::FLOOR);
        assert_eq!(floor.storage_type(), StorageType::BigInteger);
        assert_eq!(
            floor.to_values(),
            vec![
                Value::BigInteger(BigInt::from(1)),
                Value::BigInteger(BigInt::from(-2)),
                Value::Null,
                Value::Null,
                Value::BigInteger(BigInt::from(10_000_000_000_000_000_000u64)),
            ]
        );
        assert_eq!(problems.count("arithmetic_error"), 1);

        let small = storage.slice(0, 2);
        let (truncated, _) = run(&small, names::TRUNCATE);
        assert_eq!(truncated.to_values(), vec![Value::Long(1), Value::Long(-1)]);
    }

    #[test]
    fn test_rounding_decimals() {
        let storage = Storage::BigDecimal(ObjectStorage::new(vec![Some(
            BigDecimal::from_str("-2.5").unwrap(),
        )]));
        let (ceil, _) = run(&storage, names::CEIL);
        assert_eq!(ceil.to_values(), vec![Value::Long(-2)]);
        let (floor, _) = run(&storage, names::FLOOR);
        assert_eq!(floor.to_values(), vec![Value::Long(-3)]);
    }

    #[test]
    fn test_truncating_date_times_keeps_the_local_date() {
        let offset = FixedOffset::east_opt(-5 * 3600).unwrap();
        let storage = Storage::DateTime(ObjectStorage::new(vec![
            Some(offset.with_ymd_and_hms(2024, 3, 1, 22, 15, 0).unwrap()),
            None,
        ]));
        assert!(lookup(names::TRUNCATE).unwrap().can_apply(&storage));
        assert!(!lookup(names::CEIL).unwrap().can_apply(&storage));

        let (dates, problems) = run(&storage, names::TRUNCATE);
        assert_eq!(dates.storage_type(), StorageType::Date);
        assert_eq!(
            dates.to_values(),
            vec![Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()), Value::Null]
        );
        assert!(problems.is_empty());

        let dates_only = Storage::Date(ObjectStorage::new(vec![NaiveDate::from_ymd_opt(2024, 3, 1)]));
        let ctx = Context::default();
        assert!(apply(&dates_only, names::TRUNCATE, &ctx, &problems).is_err());
    }

    #[test]
    fn test_text_length_and_is_empty() {
        let storage = Storage::Text(TextStorage::from_strs(
            &[Some("añb"), Some(""), None],
            TextType::VARIABLE_LENGTH,
        ));
        let (lengths, _) = run(&storage, names::TEXT_LENGTH);
        assert_eq!(
            lengths.to_values(),
            vec![Value::Long(3), Value::Long(0), Value::Null]
        );
        let (empty, _) = run(&storage, names::IS_EMPTY);
        assert_eq!(
            empty.to_values(),
            vec![Value::Boolean(false), Value::Boolean(true), Value::Boolean(true)]
        );
    }

    #[test]
    fn test_date_parts() {
        let storage = Storage::Date(ObjectStorage::new(vec![
            NaiveDate::from_ymd_opt(2024, 8, 15),
            None,
        ]));
        let (quarter, _) = run(&storage, names::QUARTER);
        assert_eq!(quarter.to_values(), vec![Value::Long(3), Value::Null]);
        let (weekday, _) = run(&storage, names::DAY_OF_WEEK);
        assert_eq!(weekday.get_item_boxed(0).unwrap(), Value::Long(4));

        assert!(!lookup(names::HOUR).unwrap().can_apply(&storage));
        let times = Storage::TimeOfDay(ObjectStorage::new(vec![NaiveTime::from_hms_milli_opt(
            10, 20, 30, 456,
        )]));
        let (millis, _) = run(&times, names::MILLISECOND);
        assert_eq!(millis.to_values(), vec![Value::Long(456)]);
    }

    #[test]
    fn test_null_storage_and_mixed_specialization() {
        let nulls = Storage::Null(NullStorage::new(2));
        let (out, _) = run(&nulls, names::CEIL);
        assert_eq!(out.storage_type(), StorageType::Null);
        let (nothing, _) = run(&nulls, names::IS_NOTHING);
        assert_eq!(nothing.to_values(), vec![Value::Boolean(true); 2]);

        let mixed = Storage::Mixed(ObjectStorage::new(vec![Some(Value::Double(2.5)), None]));
        let (ceil, _) = run(&mixed, names::CEIL);
        assert_eq!(ceil.to_values(), vec![Value::Long(3), Value::Null]);
    }

    #[test]
    fn test_unsupported_unary_is_an_error() {
        let ctx = Context::default();
        let problems = ProblemAggregator::new();
        let storage = Storage::Bool(BoolStorage::from_options(vec![Some(true)]));
        assert!(apply(&storage, names::TEXT_LENGTH, &ctx, &problems).is_err());
        assert!(apply(&storage, "no_such_op", &ctx, &problems).is_err());
    }
}
