//! Conversions between date, date-time and time-of-day.
//!
//! A date-time converts to the date and time it shows in its own offset. A
//! date widens to a date-time at the start of that day, in the offset the
//! context's configuration names.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};

use crate::builder::ObjectBuilder;
use crate::context::Context;
use crate::error::StoreError;
use crate::operation::cast::{convert_boxed, StorageConverter};
use crate::operation::iterators::build_over_items;
use crate::problems::CastProblemAggregator;
use crate::storage::Storage;
use crate::types::{StorageType, Value};

fn accepts_boxed(source: &StorageType) -> bool {
    matches!(source, StorageType::AnyObject | StorageType::Null)
}

//==================================================================================
// Date
//==================================================================================

pub struct ToDateConverter;

impl StorageConverter for ToDateConverter {
    fn target(&self) -> StorageType {
        StorageType::Date
    }

    fn can_apply(&self, source: &StorageType) -> bool {
        *source == StorageType::DateTime || accepts_boxed(source)
    }

    fn convert(
        &self,
        storage: &Storage,
        ctx: &Context,
        problems: &CastProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let builder = ObjectBuilder::<NaiveDate>::new(storage.size());
        match storage {
            Storage::DateTime(s) => build_over_items(s, builder, ctx, |b, _, dt| {
                b.append_item(dt.date_naive());
                Ok(())
            }),
            _ => convert_boxed(storage, builder, ctx, problems, |b, v| {
                match v {
                    Value::Date(d) => b.append_item(*d),
                    Value::DateTime(dt) => b.append_item(dt.date_naive()),
                    _ => return None,
                }
                Some(())
            }),
        }
    }
}

//==================================================================================
// DateTime
//==================================================================================

pub struct ToDateTimeConverter;

fn start_of_day(date: &NaiveDate, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    offset
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()
}

impl StorageConverter for ToDateTimeConverter {
    fn target(&self) -> StorageType {
        StorageType::DateTime
    }

    fn can_apply(&self, source: &StorageType) -> bool {
        *source == StorageType::Date || accepts_boxed(source)
    }

    fn convert(
        &self,
        storage: &Storage,
        ctx: &Context,
        problems: &CastProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let seconds = ctx.config().datetime_offset_seconds;
        let offset = FixedOffset::east_opt(seconds).ok_or_else(|| {
            StoreError::InvalidConfig(format!("datetime_offset_seconds {seconds} is out of range"))
        })?;
        let builder = ObjectBuilder::<DateTime<FixedOffset>>::new(storage.size());
        convert_boxed(storage, builder, ctx, problems, |b, v| {
            match v {
                Value::DateTime(dt) => b.append_item(*dt),
                Value::Date(d) => b.append_item(start_of_day(d, &offset)?),
                _ => return None,
            }
            Some(())
        })
    }
}

//==================================================================================
// TimeOfDay
//==================================================================================

pub struct ToTimeOfDayConverter;

impl StorageConverter for ToTimeOfDayConverter {
    fn target(&self) -> StorageType {
        StorageType::TimeOfDay
    }

    fn can_apply(&self, source: &StorageType) -> bool {
        *source == StorageType::DateTime || accepts_boxed(source)
    }

    fn convert(
        &self,
        storage: &Storage,
        ctx: &Context,
        problems: &CastProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let builder = ObjectBuilder::<NaiveTime>::new(storage.size());
        convert_boxed(storage, builder, ctx, problems, |b, v| {
            match v {
                Value::TimeOfDay(t) => b.append_item(*t),
                Value::DateTime(dt) => b.append_item(dt.time()),
                _ => return None,
            }
            Some(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::context::CancellationToken;
    use crate::operation::cast::cast_storage;
    use crate::problems::ProblemAggregator;
    use crate::storage::ObjectStorage;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_time_splits_in_its_own_offset() {
        let ctx = Context::default();
        let parent = ProblemAggregator::new();
        let offset = FixedOffset::east_opt(5 * 3600).unwrap();
        let dt = offset.with_ymd_and_hms(2024, 3, 1, 1, 30, 0).unwrap();
        let storage = Storage::DateTime(ObjectStorage::new(vec![Some(dt), None]));

        let problems = CastProblemAggregator::new(&parent, "ts", StorageType::Date);
        let dates = cast_storage(&storage, StorageType::Date, &ctx, &problems).unwrap();
        assert_eq!(dates.to_values(), vec![Value::Date(date(2024, 3, 1)), Value::Null]);

        let problems = CastProblemAggregator::new(&parent, "ts", StorageType::TimeOfDay);
        let times = cast_storage(&storage, StorageType::TimeOfDay, &ctx, &problems).unwrap();
        assert_eq!(
            times.to_values(),
            vec![Value::TimeOfDay(NaiveTime::from_hms_opt(1, 30, 0).unwrap()), Value::Null]
        );
    }

    #[test]
    fn test_date_widens_at_configured_offset() {
        let config = StoreConfig {
            datetime_offset_seconds: -3600,
            ..StoreConfig::default()
        };
        let ctx = Context::new(config, CancellationToken::new());
        let parent = ProblemAggregator::new();
        let problems = CastProblemAggregator::new(&parent, "d", StorageType::DateTime);
        let storage = Storage::Date(ObjectStorage::new(vec![Some(date(2020, 5, 17))]));
        let out = cast_storage(&storage, StorageType::DateTime, &ctx, &problems).unwrap();

        let expected = FixedOffset::west_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2020, 5, 17, 0, 0, 0)
            .unwrap();
        assert_eq!(out.to_values(), vec![Value::DateTime(expected)]);
    }

    #[test]
    fn test_mixed_non_temporal_fails() {
        let ctx = Context::default();
        let parent = ProblemAggregator::new();
        let problems = CastProblemAggregator::new(&parent, "m", StorageType::Date);
        let storage = Storage::Mixed(ObjectStorage::new(vec![
            Some(Value::Date(date(2001, 1, 1))),
            Some(Value::Long(20010101)),
        ]));
        let out = cast_storage(&storage, StorageType::Date, &ctx, &problems).unwrap();
        assert_eq!(out.to_values(), vec![Value::Date(date(2001, 1, 1)), Value::Null]);
        assert_eq!(parent.count("conversion_failure"), 1);
        assert!(!ToDateConverter.can_apply(&StorageType::INT_64));
    }
}
