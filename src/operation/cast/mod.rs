//! Casting storages to a target type.
//!
//! One [`StorageConverter`] exists per target type. `cast` picks the cheapest
//! strategy the converter has for the source: a no-copy retype when the data
//! already fits, an element-wise conversion otherwise. Rows that cannot be
//! converted are reported and become null; the cast itself still succeeds.

pub mod to_big;
pub mod to_boolean;
pub mod to_float;
pub mod to_integer;
pub mod to_mixed;
pub mod to_temporal;
pub mod to_text;

use crate::builder::Builder;
use crate::context::Context;
use crate::error::StoreError;
use crate::operation::iterators::build_over_storage;
use crate::problems::{CastProblemAggregator, ProblemAggregator};
use crate::storage::{Column, Storage};
use crate::types::{StorageType, Value};

pub use to_big::{ToBigDecimalConverter, ToBigIntegerConverter};
pub use to_boolean::ToBooleanConverter;
pub use to_float::ToFloatConverter;
pub use to_integer::ToIntegerConverter;
pub use to_mixed::ToMixedConverter;
pub use to_temporal::{ToDateConverter, ToDateTimeConverter, ToTimeOfDayConverter};
pub use to_text::ToTextConverter;

//==================================================================================
// 1. Converter Contract
//==================================================================================

pub trait StorageConverter {
    fn target(&self) -> StorageType;

    /// Whether the converter has any strategy for `source`. Mixed and null
    /// sources are always accepted.
    fn can_apply(&self, source: &StorageType) -> bool;

    /// Converts `storage`, which is neither a facade nor all-null.
    fn convert(
        &self,
        storage: &Storage,
        ctx: &Context,
        problems: &CastProblemAggregator,
    ) -> Result<Storage, StoreError>;
}

/// The converter producing `target`. There is none for the null type.
pub fn converter_for(target: StorageType) -> Result<Box<dyn StorageConverter>, StoreError> {
    Ok(match target {
        StorageType::Integer(t) => Box::new(ToIntegerConverter::new(t)),
        StorageType::Float(_) => Box::new(ToFloatConverter),
        StorageType::Boolean => Box::new(ToBooleanConverter),
        StorageType::Text(t) => Box::new(ToTextConverter::new(t)),
        StorageType::BigInteger => Box::new(ToBigIntegerConverter),
        StorageType::BigDecimal => Box::new(ToBigDecimalConverter),
        StorageType::Date => Box::new(ToDateConverter),
        StorageType::DateTime => Box::new(ToDateTimeConverter),
        StorageType::TimeOfDay => Box::new(ToTimeOfDayConverter),
        StorageType::AnyObject => Box::new(ToMixedConverter),
        StorageType::Null => {
            return Err(StoreError::UnsupportedType(
                "Cannot cast to the Null type".into(),
            ))
        }
    })
}

//==================================================================================
// 2. Entry Points
//==================================================================================

pub fn can_cast(source: &StorageType, target: &StorageType) -> bool {
    match converter_for(*target) {
        Ok(converter) => source == target || converter.can_apply(source),
        Err(_) => false,
    }
}

/// Casts a column, tagging every finding with the column's name and `target`.
pub fn cast(
    column: &Column,
    target: StorageType,
    ctx: &Context,
    problems: &ProblemAggregator,
) -> Result<Column, StoreError> {
    if column.storage_type() == target {
        return Ok(column.clone());
    }
    let cast_problems = CastProblemAggregator::new(problems, column.name(), target);
    let storage = cast_storage(column.storage(), target, ctx, &cast_problems)?;
    Ok(column.with_storage(storage))
}

pub fn cast_storage(
    storage: &Storage,
    target: StorageType,
    ctx: &Context,
    problems: &CastProblemAggregator,
) -> Result<Storage, StoreError> {
    let converter = converter_for(target)?;
    let source_type = storage.storage_type();
    if source_type == target {
        return Ok(storage.clone());
    }
    if !converter.can_apply(&source_type) {
        return Err(StoreError::UnsupportedType(format!(
            "No strategy for casting {source_type} to {target}"
        )));
    }
    match storage {
        Storage::Null(_) => Ok(Storage::make_empty(target, storage.size())),
        Storage::Facade(f) if target != StorageType::AnyObject => {
            cast_storage(f.inner(), target, ctx, problems)
        }
        _ => {
            log_metric!(
                "event" = "cast",
                "from" = source_type,
                "to" = target,
                "rows" = storage.size()
            );
            converter.convert(storage, ctx, problems)
        }
    }
}

//==================================================================================
// 3. Shared Helpers
//==================================================================================

/// Element-wise conversion of boxed rows. `convert` returns `None` for a
/// value it cannot handle; that row is reported and becomes null.
pub(crate) fn convert_boxed<B, F>(
    storage: &Storage,
    builder: B,
    ctx: &Context,
    problems: &CastProblemAggregator,
    mut convert: F,
) -> Result<Storage, StoreError>
where
    B: Builder,
    F: FnMut(&mut B, &Value) -> Option<()>,
{
    build_over_storage(storage, true, builder, ctx, |b, _, value| {
        if convert(b, &value).is_none() {
            problems.report_conversion_failure(&value);
            b.append_nulls(1);
        }
        Ok(())
    })
}

/// Logs that a cast reused the source data.
pub(crate) fn log_retype(from: StorageType, to: StorageType) {
    log_metric!("event" = "cast", "strategy" = "retype", "from" = from, "to" = to);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LongStorage, NullStorage, TextStorage};
    use crate::types::{IntegerType, TextType};

    #[test]
    fn test_cast_to_null_is_an_error() {
        let ctx = Context::default();
        let problems = ProblemAggregator::new();
        let column = Column::new("a", Storage::Null(NullStorage::new(1)));
        assert!(cast(&column, StorageType::Null, &ctx, &problems).is_ok());
        let longs = Column::new(
            "b",
            Storage::Long(LongStorage::from_options(vec![Some(1)], IntegerType::INT_64)),
        );
        assert!(cast(&longs, StorageType::Null, &ctx, &problems).is_err());
        assert!(!can_cast(&StorageType::INT_64, &StorageType::Null));
    }

    #[test]
    fn test_same_type_is_identity() {
        let ctx = Context::default();
        let problems = ProblemAggregator::new();
        let storage = Storage::Text(TextStorage::from_strs(
            &[Some("a"), None],
            TextType::VARIABLE_LENGTH,
        ));
        let column = Column::new("t", storage.clone());
        let out = cast(&column, StorageType::TEXT, &ctx, &problems).unwrap();
        assert_eq!(out.storage(), &storage);
        assert!(problems.is_empty());
    }

    #[test]
    fn test_null_source_casts_to_all_null_target() {
        let ctx = Context::default();
        let problems = ProblemAggregator::new();
        let column = Column::new("n", Storage::Null(NullStorage::new(3)));
        let out = cast(&column, StorageType::Date, &ctx, &problems).unwrap();
        assert_eq!(out.storage_type(), StorageType::Date);
        assert_eq!(out.storage().count_missing(), 3);
    }

    #[test]
    fn test_availability() {
        assert!(can_cast(&StorageType::Boolean, &StorageType::INT_64));
        assert!(can_cast(&StorageType::AnyObject, &StorageType::Date));
        assert!(!can_cast(&StorageType::Date, &StorageType::Boolean));
        assert!(can_cast(&StorageType::Date, &StorageType::TEXT));
    }
}
