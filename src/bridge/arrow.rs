//! Conversion between storages and Arrow arrays.
//!
//! Only storages with an Arrow counterpart convert: fixed-width integers,
//! floats, booleans, text, dates, date-times (millisecond timestamps),
//! times of day (microsecond `Time64`) and all-null storages. A mixed facade
//! converts through the storage it wraps.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Date32Array, Float64Array, Int16Array, Int32Array,
    Int64Array, Int8Array, NullArray, StringArray, Time64MicrosecondArray,
    TimestampMillisecondArray,
};
use arrow::datatypes::{
    DataType, Date32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, Schema,
    Time64MicrosecondType, TimeUnit, TimestampMillisecondType,
};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, Timelike, Utc};

use crate::error::StoreError;
use crate::storage::{
    BoolStorage, Column, DoubleStorage, LongStorage, NullStorage, ObjectStorage, Storage,
    TextStorage,
};
use crate::types::{IntegerType, StorageType, TextType};

/// Days between 0001-01-01 and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const MICROS_PER_SECOND: i64 = 1_000_000;

fn date_to_days(date: &NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

fn time_to_micros(time: &NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) * MICROS_PER_SECOND
        + i64::from(time.nanosecond() / 1_000)
}

fn micros_to_time(micros: i64) -> Option<NaiveTime> {
    let seconds = u32::try_from(micros.div_euclid(MICROS_PER_SECOND)).ok()?;
    let nanos = u32::try_from(micros.rem_euclid(MICROS_PER_SECOND) * 1_000).ok()?;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, nanos)
}

fn out_of_range(kind: &str, raw: i64) -> StoreError {
    StoreError::UnexpectedType(format!("a {kind} within the supported range, got {raw}"))
}

//==================================================================================
// 1. Storage -> Arrow
//==================================================================================

impl Storage {
    /// Exports this storage as an Arrow array of `storage_type().to_arrow_type()`.
    pub fn to_arrow(&self) -> Result<ArrayRef, StoreError> {
        let len = self.size();
        let array: ArrayRef = match self {
            Storage::Long(s) => long_to_arrow(s, len),
            Storage::Double(s) => Arc::new((0..len).map(|i| s.get(i)).collect::<Float64Array>()),
            Storage::Bool(s) => Arc::new((0..len).map(|i| s.get(i)).collect::<BooleanArray>()),
            Storage::Text(s) => Arc::new((0..len).map(|i| s.get(i)).collect::<StringArray>()),
            Storage::Date(s) => Arc::new(
                s.iter()
                    .map(|d| d.map(date_to_days))
                    .collect::<Date32Array>(),
            ),
            Storage::DateTime(s) => Arc::new(
                s.iter()
                    .map(|dt| dt.map(|dt| dt.timestamp_millis()))
                    .collect::<TimestampMillisecondArray>()
                    .with_timezone("+00:00"),
            ),
            Storage::TimeOfDay(s) => Arc::new(
                s.iter()
                    .map(|t| t.map(time_to_micros))
                    .collect::<Time64MicrosecondArray>(),
            ),
            Storage::Null(_) => Arc::new(NullArray::new(len)),
            Storage::Facade(f) => return f.inner().to_arrow(),
            other => {
                return Err(StoreError::UnsupportedType(format!(
                    "{} has no Arrow counterpart",
                    other.storage_type()
                )))
            }
        };
        log_metric!("event" = "to_arrow", "storage" = self.storage_type(), "rows" = len);
        Ok(array)
    }
}

fn long_to_arrow(s: &LongStorage, len: usize) -> ArrayRef {
    let values = (0..len).map(|i| s.get(i));
    match s.integer_type().bits() {
        8 => Arc::new(values.map(|v| v.map(|v| v as i8)).collect::<Int8Array>()),
        16 => Arc::new(values.map(|v| v.map(|v| v as i16)).collect::<Int16Array>()),
        32 => Arc::new(values.map(|v| v.map(|v| v as i32)).collect::<Int32Array>()),
        _ => Arc::new(values.collect::<Int64Array>()),
    }
}

//==================================================================================
// 2. Arrow -> Storage
//==================================================================================

impl Storage {
    /// Imports an Arrow array. Text arrives unbounded; temporal values keep
    /// the offset the timestamp column declares, or UTC when it has none.
    pub fn from_arrow(array: &dyn Array) -> Result<Storage, StoreError> {
        let storage_type = StorageType::from_arrow_type(array.data_type())?;
        let len = array.len();

        macro_rules! longs_from {
            ($arrow_type:ty, $integer_type:expr) => {{
                let typed = array.as_primitive::<$arrow_type>();
                Storage::Long(LongStorage::from_options(
                    typed.iter().map(|v| v.map(i64::from)).collect(),
                    $integer_type,
                ))
            }};
        }

        let storage = match array.data_type() {
            DataType::Int8 => longs_from!(Int8Type, IntegerType::INT_8),
            DataType::Int16 => longs_from!(Int16Type, IntegerType::INT_16),
            DataType::Int32 => longs_from!(Int32Type, IntegerType::INT_32),
            DataType::Int64 => longs_from!(Int64Type, IntegerType::INT_64),
            DataType::Float64 => Storage::Double(DoubleStorage::from_options(
                array.as_primitive::<Float64Type>().iter().collect(),
            )),
            DataType::Boolean => {
                Storage::Bool(BoolStorage::from_options(array.as_boolean().iter().collect()))
            }
            DataType::Utf8 => Storage::Text(TextStorage::new(
                array
                    .as_string::<i32>()
                    .iter()
                    .map(|s| s.map(str::to_string))
                    .collect(),
                TextType::VARIABLE_LENGTH,
            )),
            DataType::Date32 => {
                let dates = array
                    .as_primitive::<Date32Type>()
                    .iter()
                    .map(|d| match d {
                        Some(days) => days_to_date(days)
                            .map(Some)
                            .ok_or_else(|| out_of_range("date", i64::from(days))),
                        None => Ok(None),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Storage::Date(ObjectStorage::new(dates))
            }
            DataType::Timestamp(TimeUnit::Millisecond, tz) => {
                let offset = tz
                    .as_deref()
                    .and_then(|tz| tz.parse::<FixedOffset>().ok())
                    .unwrap_or_else(|| Utc.fix());
                let stamps = array
                    .as_primitive::<TimestampMillisecondType>()
                    .iter()
                    .map(|ms| match ms {
                        Some(ms) => DateTime::from_timestamp_millis(ms)
                            .map(|dt| Some(dt.with_timezone(&offset)))
                            .ok_or_else(|| out_of_range("timestamp", ms)),
                        None => Ok(None),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Storage::DateTime(ObjectStorage::new(stamps))
            }
            DataType::Time64(TimeUnit::Microsecond) => {
                let times = array
                    .as_primitive::<Time64MicrosecondType>()
                    .iter()
                    .map(|us| match us {
                        Some(us) => micros_to_time(us)
                            .map(Some)
                            .ok_or_else(|| out_of_range("time of day", us)),
                        None => Ok(None),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Storage::TimeOfDay(ObjectStorage::new(times))
            }
            DataType::Null => Storage::Null(NullStorage::new(len)),
            dt => {
                return Err(StoreError::InternalError(format!(
                    "{dt} maps to {storage_type} but has no import path"
                )))
            }
        };
        log_metric!("event" = "from_arrow", "storage" = storage_type, "rows" = len);
        Ok(storage)
    }
}

//==================================================================================
// 3. Columns <-> RecordBatch
//==================================================================================

/// Packs named columns of equal length into one record batch.
pub fn columns_to_record_batch(columns: &[Column]) -> Result<RecordBatch, StoreError> {
    if let Some(first) = columns.first() {
        if let Some(bad) = columns.iter().find(|c| c.size() != first.size()) {
            return Err(StoreError::LengthMismatch {
                expected: first.size(),
                found: bad.size(),
            });
        }
    }
    let arrays = columns
        .iter()
        .map(|c| c.storage().to_arrow())
        .collect::<Result<Vec<_>, _>>()?;
    let fields = columns
        .iter()
        .zip(&arrays)
        .map(|(c, a)| arrow::datatypes::Field::new(c.name(), a.data_type().clone(), true))
        .collect::<Vec<_>>();
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Unpacks every column of a record batch, named after its schema field.
pub fn record_batch_to_columns(batch: &RecordBatch) -> Result<Vec<Column>, StoreError> {
    batch
        .schema()
        .fields()
        .iter()
        .zip(batch.columns())
        .map(|(field, array)| Ok(Column::new(field.name().as_str(), Storage::from_arrow(array.as_ref())?)))
        .collect()
}
