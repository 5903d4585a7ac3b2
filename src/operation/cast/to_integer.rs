use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::builder::{Builder, LongBuilder};
use crate::context::Context;
use crate::error::StoreError;
use crate::operation::cast::{convert_boxed, log_retype, StorageConverter};
use crate::operation::iterators::{build_over_booleans, build_over_doubles, build_over_items, build_over_longs};
use crate::problems::{CastProblemAggregator, ProblemAggregator};
use crate::storage::Storage;
use crate::types::{IntegerType, StorageType, Value};

/// Converts to a fixed-width integer. Fractions are truncated toward zero;
/// values outside the target range are reported and become null.
pub struct ToIntegerConverter {
    target: IntegerType,
}

impl ToIntegerConverter {
    pub fn new(target: IntegerType) -> Self {
        Self { target }
    }

    fn append_double(&self, builder: &mut LongBuilder, value: f64, problems: &ProblemAggregator) -> Option<()> {
        if value.is_nan() {
            return None;
        }
        if self.target.fits_double(value) {
            builder.append_long(value.trunc() as i64);
        } else {
            problems.report_number_out_of_range(&Value::Double(value));
            builder.append_nulls(1);
        }
        Some(())
    }

    fn append_big_integer(&self, builder: &mut LongBuilder, value: &BigInt, problems: &ProblemAggregator) {
        match value.to_i64().filter(|v| self.target.fits(*v)) {
            Some(v) => builder.append_long(v),
            None => {
                problems.report_number_out_of_range(&Value::BigInteger(value.clone()));
                builder.append_nulls(1);
            }
        }
    }

    fn append_big_decimal(&self, builder: &mut LongBuilder, value: &BigDecimal, problems: &ProblemAggregator) {
        let (truncated, _) = value
            .with_scale_round(0, RoundingMode::Down)
            .as_bigint_and_exponent();
        match truncated.to_i64().filter(|v| self.target.fits(*v)) {
            Some(v) => builder.append_long(v),
            None => {
                problems.report_number_out_of_range(&Value::BigDecimal(value.clone()));
                builder.append_nulls(1);
            }
        }
    }

    fn append_value(&self, builder: &mut LongBuilder, value: &Value, problems: &ProblemAggregator) -> Option<()> {
        match value {
            Value::Long(v) if self.target.fits(*v) => builder.append_long(*v),
            Value::Long(_) => {
                problems.report_number_out_of_range(value);
                builder.append_nulls(1);
            }
            Value::Boolean(b) => builder.append_long(i64::from(*b)),
            Value::Double(d) => return self.append_double(builder, *d, problems),
            Value::BigInteger(b) => self.append_big_integer(builder, b, problems),
            Value::BigDecimal(d) => self.append_big_decimal(builder, d, problems),
            _ => return None,
        }
        Some(())
    }
}

impl StorageConverter for ToIntegerConverter {
    fn target(&self) -> StorageType {
        StorageType::Integer(self.target)
    }

    fn can_apply(&self, source: &StorageType) -> bool {
        source.is_numeric() || matches!(source, StorageType::Boolean | StorageType::AnyObject | StorageType::Null)
    }

    fn convert(
        &self,
        storage: &Storage,
        ctx: &Context,
        problems: &CastProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let len = storage.size();
        let sink = problems.aggregator();
        match storage {
            Storage::Long(s) => {
                if let Some(widened) = s.widen(self.target) {
                    log_retype(storage.storage_type(), self.target());
                    return Ok(Storage::Long(widened));
                }
                let builder = LongBuilder::bound_checked(self.target, len, sink);
                build_over_longs(s, builder, ctx, |b, _, v| {
                    b.append_long(v);
                    Ok(())
                })
            }
            Storage::Bool(s) => build_over_booleans(s, LongBuilder::new(self.target, len), ctx, |b, _, v| {
                b.append_long(i64::from(v));
                Ok(())
            }),
            Storage::Double(s) => build_over_doubles(s, LongBuilder::new(self.target, len), ctx, |b, _, v| {
                if self.append_double(b, v, sink).is_none() {
                    sink.report_conversion_failure(&Value::Double(v));
                    b.append_nulls(1);
                }
                Ok(())
            }),
            Storage::BigInteger(s) => build_over_items(s, LongBuilder::new(self.target, len), ctx, |b, _, v| {
                self.append_big_integer(b, v, sink);
                Ok(())
            }),
            Storage::BigDecimal(s) => build_over_items(s, LongBuilder::new(self.target, len), ctx, |b, _, v| {
                self.append_big_decimal(b, v, sink);
                Ok(())
            }),
            _ => convert_boxed(storage, LongBuilder::new(self.target, len), ctx, problems, |b, v| {
                self.append_value(b, v, sink)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::cast::cast;
    use crate::problems::ProblemAggregator;
    use crate::storage::{Column, DoubleStorage, LongStorage, ObjectStorage};
    use std::str::FromStr;

    fn run(storage: Storage, target: IntegerType, problems: &ProblemAggregator) -> Storage {
        let column = Column::new("x", storage);
        cast(&column, StorageType::Integer(target), &Context::default(), problems)
            .unwrap()
            .into_storage()
    }

    #[test]
    fn test_widening_reuses_values() {
        let problems = ProblemAggregator::new();
        let narrow = Storage::Long(LongStorage::from_options(vec![Some(-3), None], IntegerType::INT_16));
        let out = run(narrow, IntegerType::INT_64, &problems);
        assert_eq!(out.storage_type(), StorageType::INT_64);
        assert_eq!(out.to_values(), vec![Value::Long(-3), Value::Null]);
        assert!(problems.is_empty());
    }

    #[test]
    fn test_narrowing_reports_out_of_range() {
        let problems = ProblemAggregator::new();
        let wide = Storage::Long(LongStorage::from_options(vec![Some(100), Some(300)], IntegerType::INT_64));
        let out = run(wide, IntegerType::INT_8, &problems);
        assert_eq!(out.to_values(), vec![Value::Long(100), Value::Null]);
        assert_eq!(problems.count("number_out_of_range"), 1);
        assert_eq!(problems.problems()[0].origin.as_ref().unwrap().column_name, "x");
    }

    #[test]
    fn test_doubles_truncate_and_nan_fails() {
        let problems = ProblemAggregator::new();
        let doubles = Storage::Double(DoubleStorage::from_options(vec![
            Some(2.9),
            Some(-2.9),
            Some(f64::NAN),
            Some(1e20),
            None,
        ]));
        let out = run(doubles, IntegerType::INT_64, &problems);
        assert_eq!(
            out.to_values(),
            vec![Value::Long(2), Value::Long(-2), Value::Null, Value::Null, Value::Null]
        );
        assert_eq!(problems.count("conversion_failure"), 1);
        assert_eq!(problems.count("number_out_of_range"), 1);
    }

    #[test]
    fn test_decimal_truncates_toward_zero() {
        let problems = ProblemAggregator::new();
        let decimals = Storage::BigDecimal(ObjectStorage::new(vec![
            Some(BigDecimal::from_str("1.9").unwrap()),
            Some(BigDecimal::from_str("-1.9").unwrap()),
        ]));
        let out = run(decimals, IntegerType::INT_64, &problems);
        assert_eq!(out.to_values(), vec![Value::Long(1), Value::Long(-1)]);
        assert!(problems.is_empty());
    }

    #[test]
    fn test_mixed_rows_convert_individually() {
        let problems = ProblemAggregator::new();
        let mixed = Storage::Mixed(ObjectStorage::new(vec![
            Some(Value::Boolean(true)),
            Some(Value::from("12")),
            Some(Value::BigInteger(BigInt::from(7))),
            None,
        ]));
        let out = run(mixed, IntegerType::INT_32, &problems);
        assert_eq!(
            out.to_values(),
            vec![Value::Long(1), Value::Null, Value::Long(7), Value::Null]
        );
        assert_eq!(problems.count("conversion_failure"), 1);
    }
}
