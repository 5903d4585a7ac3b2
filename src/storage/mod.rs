//! Immutable, fixed-length, nullable typed columns.
//!
//! `Storage` is a closed sum type with one variant per storage type. Every
//! transforming method returns a new `Storage`; none mutates. Variants share
//! their buffers through `Arc`, so cloning a storage is cheap.

pub mod boolean;
pub mod column;
pub mod double;
pub mod index;
pub mod long;
pub mod null;
pub mod object;
pub mod text;

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::sync::Arc;

pub use boolean::BoolStorage;
pub use column::Column;
pub use double::DoubleStorage;
pub use index::{OrderMask, SliceRange};
pub use long::LongStorage;
pub use null::NullStorage;
pub use object::ObjectStorage;
pub use text::TextStorage;

use crate::builder;
use crate::config::StoreConfig;
use crate::context::Context;
use crate::error::StoreError;
use crate::null_handling::Bitmap;
use crate::operation::{map, unary};
use crate::problems::ProblemAggregator;
use crate::types::{IntegerType, StorageType, Value};

//==================================================================================
// 1. Variant Contract
//==================================================================================

/// Row-level primitives every variant provides. Indices are assumed to be in
/// bounds; `Storage` performs the checks.
pub(crate) trait StorageVariant: Sized {
    fn size(&self) -> usize;
    fn is_null_at(&self, index: usize) -> bool;
    fn item_at(&self, index: usize) -> Value;
    /// Rows by source index; `None` yields a null row.
    fn gather(&self, indices: &[Option<usize>]) -> Self;
    fn slice(&self, offset: usize, len: usize) -> Self;
    fn append_nulls(&self, count: usize) -> Self;
}

/// Re-types any storage as mixed without copying its data.
#[derive(Debug, Clone, PartialEq)]
pub struct MixedFacade {
    inner: Arc<Storage>,
}

impl MixedFacade {
    pub fn new(storage: Storage) -> Self {
        match storage {
            Storage::Facade(facade) => facade,
            other => Self {
                inner: Arc::new(other),
            },
        }
    }

    pub fn inner(&self) -> &Storage {
        &self.inner
    }
}

impl StorageVariant for MixedFacade {
    fn size(&self) -> usize {
        self.inner.size()
    }

    fn is_null_at(&self, index: usize) -> bool {
        self.inner.is_null_at(index)
    }

    fn item_at(&self, index: usize) -> Value {
        self.inner.item_at(index)
    }

    fn gather(&self, indices: &[Option<usize>]) -> Self {
        Self::new(self.inner.gather(indices))
    }

    fn slice(&self, offset: usize, len: usize) -> Self {
        Self::new(self.inner.slice_unchecked(offset, len))
    }

    fn append_nulls(&self, count: usize) -> Self {
        Self::new(self.inner.append_nulls(count))
    }
}

//==================================================================================
// 2. The Storage Sum Type
//==================================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    Long(LongStorage),
    Double(DoubleStorage),
    Bool(BoolStorage),
    Text(TextStorage),
    BigInteger(ObjectStorage<BigInt>),
    BigDecimal(ObjectStorage<BigDecimal>),
    Date(ObjectStorage<NaiveDate>),
    DateTime(ObjectStorage<DateTime<FixedOffset>>),
    TimeOfDay(ObjectStorage<NaiveTime>),
    Mixed(ObjectStorage<Value>),
    Null(NullStorage),
    Facade(MixedFacade),
}

macro_rules! with_variant {
    ($storage:expr, $s:ident => $body:expr) => {
        match $storage {
            Storage::Long($s) => $body,
            Storage::Double($s) => $body,
            Storage::Bool($s) => $body,
            Storage::Text($s) => $body,
            Storage::BigInteger($s) => $body,
            Storage::BigDecimal($s) => $body,
            Storage::Date($s) => $body,
            Storage::DateTime($s) => $body,
            Storage::TimeOfDay($s) => $body,
            Storage::Mixed($s) => $body,
            Storage::Null($s) => $body,
            Storage::Facade($s) => $body,
        }
    };
}

macro_rules! map_variant {
    ($storage:expr, $s:ident => $body:expr) => {
        match $storage {
            Storage::Long($s) => Storage::Long($body),
            Storage::Double($s) => Storage::Double($body),
            Storage::Bool($s) => Storage::Bool($body),
            Storage::Text($s) => Storage::Text($body),
            Storage::BigInteger($s) => Storage::BigInteger($body),
            Storage::BigDecimal($s) => Storage::BigDecimal($body),
            Storage::Date($s) => Storage::Date($body),
            Storage::DateTime($s) => Storage::DateTime($body),
            Storage::TimeOfDay($s) => Storage::TimeOfDay($body),
            Storage::Mixed($s) => Storage::Mixed($body),
            Storage::Null($s) => Storage::Null($body),
            Storage::Facade($s) => Storage::Facade($body),
        }
    };
}

impl Storage {
    //==============================================================================
    // Factories
    //==============================================================================

    /// An all-null storage of the given type.
    pub fn make_empty(storage_type: StorageType, size: usize) -> Storage {
        match storage_type {
            StorageType::Integer(t) => Storage::Long(LongStorage::make_empty(size, t)),
            StorageType::Float(_) => Storage::Double(DoubleStorage::make_empty(size)),
            StorageType::Boolean => Storage::Bool(BoolStorage::make_empty(size)),
            StorageType::Text(t) => Storage::Text(TextStorage::make_empty(size, t)),
            StorageType::Date => Storage::Date(ObjectStorage::make_empty(size)),
            StorageType::DateTime => Storage::DateTime(ObjectStorage::make_empty(size)),
            StorageType::TimeOfDay => Storage::TimeOfDay(ObjectStorage::make_empty(size)),
            StorageType::BigInteger => Storage::BigInteger(ObjectStorage::make_empty(size)),
            StorageType::BigDecimal => Storage::BigDecimal(ObjectStorage::make_empty(size)),
            StorageType::AnyObject => Storage::Mixed(ObjectStorage::make_empty(size)),
            StorageType::Null => Storage::Null(NullStorage::new(size)),
        }
    }

    /// `size` copies of `value`, in the storage its type calls for.
    pub fn from_repeated_item(
        value: &Value,
        size: usize,
        ctx: &Context,
        problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        match value {
            Value::Null => return Ok(Storage::Null(NullStorage::new(size))),
            Value::Boolean(b) => return Ok(Storage::Bool(BoolStorage::repeated(*b, size))),
            _ => {}
        }
        let mut builder = builder::for_type(StorageType::of_value(value), size, problems);
        for _ in 0..size {
            builder.append(value)?;
            ctx.safepoint()?;
        }
        Ok(builder.seal())
    }

    /// Collects values into the narrowest storage able to hold all of them.
    pub fn from_values(values: &[Value], problems: &ProblemAggregator) -> Result<Storage, StoreError> {
        let mut builder = builder::InferredBuilder::new(values.len(), problems);
        for value in values {
            builder::Builder::append(&mut builder, value)?;
        }
        Ok(builder.finish())
    }

    //==============================================================================
    // Shape & Type
    //==============================================================================

    pub fn storage_type(&self) -> StorageType {
        match self {
            Storage::Long(s) => StorageType::Integer(s.integer_type()),
            Storage::Double(_) => StorageType::FLOAT_64,
            Storage::Bool(_) => StorageType::Boolean,
            Storage::Text(s) => StorageType::Text(s.text_type()),
            Storage::BigInteger(_) => StorageType::BigInteger,
            Storage::BigDecimal(_) => StorageType::BigDecimal,
            Storage::Date(_) => StorageType::Date,
            Storage::DateTime(_) => StorageType::DateTime,
            Storage::TimeOfDay(_) => StorageType::TimeOfDay,
            Storage::Mixed(_) | Storage::Facade(_) => StorageType::AnyObject,
            Storage::Null(_) => StorageType::Null,
        }
    }

    pub fn size(&self) -> usize {
        with_variant!(self, s => s.size())
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn check_index(&self, index: usize) -> Result<(), StoreError> {
        let size = self.size();
        if index >= size {
            return Err(StoreError::IndexOutOfBounds { index, size });
        }
        Ok(())
    }

    //==============================================================================
    // Element Access
    //==============================================================================

    pub fn is_nothing(&self, index: usize) -> Result<bool, StoreError> {
        self.check_index(index)?;
        Ok(self.is_null_at(index))
    }

    pub fn get_item_boxed(&self, index: usize) -> Result<Value, StoreError> {
        self.check_index(index)?;
        Ok(self.item_at(index))
    }

    /// Unboxed access to an integer storage. Fails on a null slot.
    pub fn get_item_as_long(&self, index: usize) -> Result<i64, StoreError> {
        self.check_index(index)?;
        match self {
            Storage::Long(s) => s.get(index).ok_or(StoreError::ValueIsNothing(index)),
            other => Err(StoreError::unsupported_op("get_item_as_long", other.storage_type())),
        }
    }

    /// Unboxed access to a float storage. Fails on a null slot.
    pub fn get_item_as_double(&self, index: usize) -> Result<f64, StoreError> {
        self.check_index(index)?;
        match self {
            Storage::Double(s) => s.get(index).ok_or(StoreError::ValueIsNothing(index)),
            other => Err(StoreError::unsupported_op("get_item_as_double", other.storage_type())),
        }
    }

    /// Unboxed access to a boolean storage. Fails on a null slot.
    pub fn get_item_as_boolean(&self, index: usize) -> Result<bool, StoreError> {
        self.check_index(index)?;
        match self {
            Storage::Bool(s) => s.get(index).ok_or(StoreError::ValueIsNothing(index)),
            other => Err(StoreError::unsupported_op("get_item_as_boolean", other.storage_type())),
        }
    }

    #[inline]
    pub(crate) fn is_null_at(&self, index: usize) -> bool {
        with_variant!(self, s => s.is_null_at(index))
    }

    #[inline]
    pub(crate) fn item_at(&self, index: usize) -> Value {
        with_variant!(self, s => s.item_at(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.size()).map(move |i| self.item_at(i))
    }

    pub fn to_values(&self) -> Vec<Value> {
        self.iter().collect()
    }

    pub fn count_missing(&self) -> usize {
        (0..self.size()).filter(|&i| self.is_null_at(i)).count()
    }

    //==============================================================================
    // Remapping (all return new storages)
    //==============================================================================

    pub(crate) fn gather(&self, indices: &[Option<usize>]) -> Storage {
        map_variant!(self, s => s.gather(indices))
    }

    /// Keeps rows whose bit is set. `new_length` must equal the number of set bits.
    pub fn apply_filter(&self, mask: &Bitmap, new_length: usize) -> Result<Storage, StoreError> {
        if mask.len() != self.size() {
            return Err(StoreError::LengthMismatch {
                expected: self.size(),
                found: mask.len(),
            });
        }
        let indices: Vec<Option<usize>> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, keep)| keep.then_some(Some(i)))
            .collect();
        if indices.len() != new_length {
            return Err(StoreError::LengthMismatch {
                expected: new_length,
                found: indices.len(),
            });
        }
        Ok(self.gather(&indices))
    }

    pub fn apply_mask(&self, mask: &OrderMask) -> Result<Storage, StoreError> {
        mask.check_bounds(self.size())?;
        Ok(self.gather(mask.positions()))
    }

    /// At most `limit` rows starting at `offset`; clamped to the storage end.
    pub fn slice(&self, offset: usize, limit: usize) -> Storage {
        let offset = offset.min(self.size());
        let len = limit.min(self.size() - offset);
        self.slice_unchecked(offset, len)
    }

    fn slice_unchecked(&self, offset: usize, len: usize) -> Storage {
        map_variant!(self, s => s.slice(offset, len))
    }

    /// Concatenation of the given row ranges, in order.
    pub fn slice_ranges(&self, ranges: &[SliceRange]) -> Result<Storage, StoreError> {
        let size = self.size();
        if let Some(bad) = ranges.iter().find(|r| r.end > size || r.start > r.end) {
            return Err(StoreError::IndexOutOfBounds {
                index: bad.end.max(bad.start),
                size,
            });
        }
        if let [single] = ranges {
            return Ok(self.slice_unchecked(single.start, single.len()));
        }
        let mut indices = Vec::with_capacity(SliceRange::total_length(ranges));
        for range in ranges {
            indices.extend((range.start..range.end).map(Some));
        }
        Ok(self.gather(&indices))
    }

    pub fn append_nulls(&self, count: usize) -> Storage {
        map_variant!(self, s => s.append_nulls(count))
    }

    /// A type-erased view over this storage that shares its data.
    pub fn as_mixed(&self) -> Storage {
        match self {
            Storage::Mixed(_) | Storage::Facade(_) => self.clone(),
            other => Storage::Facade(MixedFacade::new(other.clone())),
        }
    }

    //==============================================================================
    // Type Inference
    //==============================================================================

    /// The most specific type describing the actual values.
    pub fn infer_precise_type(&self) -> StorageType {
        match self {
            Storage::BigInteger(s) => match big_integer_range(s) {
                Some(_) => StorageType::INT_64,
                None => StorageType::BigInteger,
            },
            Storage::Mixed(s) => infer_common_type(s.iter().flatten()),
            Storage::Facade(f) => f.inner().infer_precise_type(),
            other => other.storage_type(),
        }
    }

    /// Like `infer_precise_type`, but also narrows widths and lengths.
    pub fn infer_precise_type_shrunk(&self) -> StorageType {
        self.infer_precise_type_shrunk_with(&StoreConfig::default())
    }

    pub fn infer_precise_type_shrunk_with(&self, config: &StoreConfig) -> StorageType {
        match self {
            Storage::Long(s) => StorageType::Integer(s.infer_precise_type_shrunk()),
            Storage::BigInteger(s) => match big_integer_range(s) {
                Some((min, max)) => StorageType::Integer(long::shrink_range(min, max)),
                None => StorageType::BigInteger,
            },
            Storage::Text(s) => StorageType::Text(s.infer_precise_type_shrunk(config.short_text_limit)),
            Storage::Facade(f) => f.inner().infer_precise_type_shrunk_with(config),
            other => other.infer_precise_type(),
        }
    }

    //==============================================================================
    // Missing Values
    //==============================================================================

    /// Replaces every null with `fill`, widening the type when `fill` needs it.
    pub fn fill_missing(
        &self,
        fill: &Value,
        ctx: &Context,
        problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        if fill.is_nothing() {
            return Ok(self.clone());
        }
        if let (Storage::Bool(s), Value::Boolean(b)) = (self, fill) {
            return Ok(Storage::Bool(s.fill_missing(*b)));
        }

        let target = StorageType::common_type(&self.storage_type(), &StorageType::of_value(fill));
        let mut builder = builder::for_type(target, self.size(), problems);
        for i in 0..self.size() {
            if self.is_null_at(i) {
                builder.append(fill)?;
            } else {
                builder.append(&self.item_at(i))?;
            }
            ctx.safepoint()?;
        }
        Ok(builder.seal())
    }

    /// Forward-fills each null with the closest preceding non-null value.
    /// Leading nulls stay null.
    pub fn fill_missing_from_previous(&self, ctx: &Context) -> Result<Storage, StoreError> {
        let mut last = None;
        let mut indices = Vec::with_capacity(self.size());
        for i in 0..self.size() {
            if self.is_null_at(i) {
                indices.push(last);
            } else {
                last = Some(i);
                indices.push(Some(i));
            }
            ctx.safepoint()?;
        }
        Ok(self.gather(&indices))
    }

    //==============================================================================
    // Vectorized Operations
    //==============================================================================

    pub fn is_binary_op_vectorized(&self, name: &str) -> bool {
        map::registry_for(self).map_or(false, |r| r.is_supported(name))
    }

    /// Runs operation `name` with a scalar right-hand side.
    pub fn run_vectorized_binary_map(
        &self,
        name: &str,
        arg: &Value,
        ctx: &Context,
        problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        map::run_binary_map(self, name, arg, ctx, problems)
    }

    /// Runs operation `name` element-wise against `other`.
    pub fn run_vectorized_zip(
        &self,
        name: &str,
        other: &Storage,
        ctx: &Context,
        problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        map::run_zip(self, name, other, ctx, problems)
    }

    pub fn is_ternary_op_vectorized(&self, name: &str) -> bool {
        map::is_ternary_supported(self, name)
    }

    /// Runs ternary operation `name` (`round`) with two scalar arguments.
    pub fn run_vectorized_ternary_map(
        &self,
        name: &str,
        arg0: &Value,
        arg1: &Value,
        ctx: &Context,
        problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        map::run_ternary_map(self, name, arg0, arg1, ctx, problems)
    }

    pub fn is_unary_op_vectorized(&self, name: &str) -> bool {
        unary::lookup(name).map_or(false, |op| op.can_apply(self))
    }

    pub fn run_vectorized_unary_map(
        &self,
        name: &str,
        ctx: &Context,
        problems: &ProblemAggregator,
    ) -> Result<Storage, StoreError> {
        unary::apply(self, name, ctx, problems)
    }

    //==============================================================================
    // Typed Views
    //==============================================================================

    pub fn as_long(&self) -> Option<&LongStorage> {
        match self {
            Storage::Long(s) => Some(s),
            _ => None,
        }
    }

    /// Re-labels an integer storage as a wider integer type without copying.
    pub fn widen_integer(&self, target: IntegerType) -> Option<Storage> {
        self.as_long()?.widen(target).map(Storage::Long)
    }
}

/// The value range of a big-integer storage, if it has at least one value and
/// every value fits 64 bits.
fn big_integer_range(storage: &ObjectStorage<BigInt>) -> Option<(i64, i64)> {
    let mut range: Option<(i64, i64)> = None;
    for value in storage.iter().flatten() {
        let v = value.to_i64()?;
        range = Some(match range {
            None => (v, v),
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
        });
    }
    range
}

/// Folds the boxed-item types of `values`. No values infers the null type.
pub(crate) fn infer_common_type<'a>(values: impl Iterator<Item = &'a Value>) -> StorageType {
    let mut common = StorageType::Null;
    for value in values {
        common = StorageType::common_type(&common, &StorageType::for_boxed_item(value));
        if common == StorageType::AnyObject {
            break;
        }
    }
    common
}

//==================================================================================
// 3. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextType;

    fn longs(values: &[Option<i64>]) -> Storage {
        Storage::Long(LongStorage::from_options(values.to_vec(), IntegerType::INT_64))
    }

    #[test]
    fn test_is_nothing_is_bounds_checked() {
        let s = longs(&[Some(1), None]);
        assert!(!s.is_nothing(0).unwrap());
        assert!(s.is_nothing(1).unwrap());
        assert!(matches!(
            s.is_nothing(2),
            Err(StoreError::IndexOutOfBounds { index: 2, size: 2 })
        ));
    }

    #[test]
    fn test_unboxed_access_on_null_fails() {
        let s = longs(&[None]);
        assert!(matches!(s.get_item_as_long(0), Err(StoreError::ValueIsNothing(0))));
        assert!(s.get_item_as_double(0).is_err());
    }

    #[test]
    fn test_slice_and_ranges() {
        let s = longs(&[Some(0), Some(1), Some(2), Some(3), Some(4)]);
        assert_eq!(
            s.slice(3, 10).to_values(),
            vec![Value::Long(3), Value::Long(4)]
        );
        let ranged = s
            .slice_ranges(&[SliceRange::new(4, 5), SliceRange::new(0, 2)])
            .unwrap();
        assert_eq!(
            ranged.to_values(),
            vec![Value::Long(4), Value::Long(0), Value::Long(1)]
        );
        assert!(s.slice_ranges(&[SliceRange::new(2, 9)]).is_err());
    }

    #[test]
    fn test_apply_mask_with_not_found() {
        let s = longs(&[Some(10), Some(20)]);
        let masked = s.apply_mask(&OrderMask::new(vec![Some(1), None, Some(0)])).unwrap();
        assert_eq!(
            masked.to_values(),
            vec![Value::Long(20), Value::Null, Value::Long(10)]
        );
        assert!(s.apply_mask(&OrderMask::new(vec![Some(2)])).is_err());
    }

    #[test]
    fn test_apply_filter_checks_length() {
        let s = longs(&[Some(1), Some(2), Some(3)]);
        let mask: Bitmap = vec![true, false, true].into_iter().collect();
        let filtered = s.apply_filter(&mask, 2).unwrap();
        assert_eq!(filtered.to_values(), vec![Value::Long(1), Value::Long(3)]);
        assert!(s.apply_filter(&mask, 3).is_err());
    }

    #[test]
    fn test_append_nulls_marks_new_rows() {
        let s = longs(&[Some(1)]).append_nulls(2);
        assert_eq!(s.size(), 3);
        assert!(s.is_nothing(1).unwrap() && s.is_nothing(2).unwrap());
    }

    #[test]
    fn test_fill_missing_from_previous() {
        let ctx = Context::default();
        let s = longs(&[None, Some(1), None, None, Some(4), None]);
        let filled = s.fill_missing_from_previous(&ctx).unwrap();
        assert_eq!(
            filled.to_values(),
            vec![
                Value::Null,
                Value::Long(1),
                Value::Long(1),
                Value::Long(1),
                Value::Long(4),
                Value::Long(4)
            ]
        );
    }

    #[test]
    fn test_fill_missing_widens_to_float() {
        let ctx = Context::default();
        let problems = ProblemAggregator::new();
        let s = longs(&[Some(1), None]);
        let filled = s.fill_missing(&Value::Double(0.5), &ctx, &problems).unwrap();
        assert_eq!(filled.storage_type(), StorageType::FLOAT_64);
        assert_eq!(filled.to_values(), vec![Value::Double(1.0), Value::Double(0.5)]);
    }

    #[test]
    fn test_big_integer_infers_long_when_all_fit() {
        let s = Storage::BigInteger(ObjectStorage::new(vec![
            Some(BigInt::from(3)),
            None,
            Some(BigInt::from(-70_000)),
        ]));
        assert_eq!(s.infer_precise_type(), StorageType::INT_64);
        assert_eq!(
            s.infer_precise_type_shrunk(),
            StorageType::Integer(IntegerType::INT_32)
        );

        let empty = Storage::BigInteger(ObjectStorage::make_empty(2));
        assert_eq!(empty.infer_precise_type(), StorageType::BigInteger);
    }

    #[test]
    fn test_facade_shares_data_and_reports_mixed() {
        let text = Storage::Text(TextStorage::from_strs(&[Some("a"), None], TextType::VARIABLE_LENGTH));
        let facade = text.as_mixed();
        assert_eq!(facade.storage_type(), StorageType::AnyObject);
        assert_eq!(facade.to_values(), text.to_values());
        assert_eq!(facade.infer_precise_type(), StorageType::TEXT);
        assert_eq!(facade.slice(0, 1).storage_type(), StorageType::AnyObject);
    }

    #[test]
    fn test_mixed_infers_common_type() {
        let s = Storage::Mixed(ObjectStorage::new(vec![
            Some(Value::Long(1)),
            None,
            Some(Value::Double(2.5)),
        ]));
        assert_eq!(s.infer_precise_type(), StorageType::FLOAT_64);
    }

    #[test]
    fn test_vectorized_entry_points_dispatch_by_name() {
        let ctx = Context::default();
        let problems = ProblemAggregator::new();
        let s = longs(&[Some(1), None, Some(250)]);

        assert!(s.is_binary_op_vectorized(map::names::ADD));
        assert!(!s.is_binary_op_vectorized(map::names::LIKE));
        let sum = s
            .run_vectorized_binary_map(map::names::ADD, &Value::Long(1), &ctx, &problems)
            .unwrap();
        assert_eq!(sum.to_values(), vec![Value::Long(2), Value::Null, Value::Long(251)]);
        let zipped = s.run_vectorized_zip(map::names::MAX, &sum, &ctx, &problems).unwrap();
        assert_eq!(zipped.to_values(), sum.to_values());

        assert!(s.is_ternary_op_vectorized(map::names::ROUND));
        assert!(!s.is_ternary_op_vectorized(map::names::ADD));
        let rounded = s
            .run_vectorized_ternary_map(
                map::names::ROUND,
                &Value::Long(-2),
                &Value::Boolean(false),
                &ctx,
                &problems,
            )
            .unwrap();
        assert_eq!(rounded.to_values(), vec![Value::Long(0), Value::Null, Value::Long(300)]);

        assert!(s.is_unary_op_vectorized("is_nothing"));
        let nothing = s.run_vectorized_unary_map("is_nothing", &ctx, &problems).unwrap();
        assert_eq!(
            nothing.to_values(),
            vec![Value::Boolean(false), Value::Boolean(true), Value::Boolean(false)]
        );
        assert!(problems.is_empty());
    }

    #[test]
    fn test_widen_integer_and_from_values() {
        let narrow = Storage::Long(LongStorage::from_options(vec![Some(7)], IntegerType::INT_16));
        let wide = narrow.widen_integer(IntegerType::INT_64).unwrap();
        assert_eq!(wide.storage_type(), StorageType::INT_64);
        assert_eq!(wide.to_values(), narrow.to_values());
        assert!(wide.widen_integer(IntegerType::INT_16).is_none());
        assert!(longs(&[]).as_long().is_some());

        let problems = ProblemAggregator::new();
        let inferred = Storage::from_values(&[Value::Long(1), Value::Null, Value::Double(2.5)], &problems)
            .unwrap();
        assert_eq!(inferred.storage_type(), StorageType::FLOAT_64);
        assert_eq!(
            inferred.to_values(),
            vec![Value::Double(1.0), Value::Null, Value::Double(2.5)]
        );
    }
}
