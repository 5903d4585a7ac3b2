//! Integer builders: plain, bound-checked, and overflow-inferring.

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::builder::buffer::GrowableBuffer;
use crate::builder::object::ObjectBuilder;
use crate::builder::{append_boxed, value_mismatch, Builder};
use crate::error::StoreError;
use crate::null_handling::BitmapBuilder;
use crate::problems::ProblemAggregator;
use crate::storage::{LongStorage, Storage};
use crate::types::{IntegerType, StorageType, Value};

//==================================================================================
// 1. LongBuilder
//==================================================================================

#[derive(Debug, Clone)]
pub struct LongBuilder {
    data: GrowableBuffer<i64>,
    nulls: BitmapBuilder,
    ty: IntegerType,
    /// Set for bound-checked builders: where out-of-range values are reported.
    bound_check: Option<ProblemAggregator>,
}

impl LongBuilder {
    /// A builder for `ty`. The typed `append_long` path trusts its caller;
    /// the `Builder` methods reject values that do not fit.
    pub fn new(ty: IntegerType, capacity: usize) -> Self {
        Self {
            data: GrowableBuffer::with_capacity(capacity),
            nulls: BitmapBuilder::with_capacity(capacity),
            ty,
            bound_check: None,
        }
    }

    /// A builder that validates every value against `ty`; values outside the
    /// range are reported as out of range and stored as null.
    pub fn bound_checked(ty: IntegerType, capacity: usize, problems: &ProblemAggregator) -> Self {
        Self {
            bound_check: Some(problems.clone()),
            ..Self::new(ty, capacity)
        }
    }

    pub fn integer_type(&self) -> IntegerType {
        self.ty
    }

    #[inline]
    pub fn append_long(&mut self, value: i64) {
        if let Some(problems) = &self.bound_check {
            if !self.ty.fits(value) {
                problems.report_number_out_of_range(&Value::Long(value));
                self.append_nulls_inner(1);
                return;
            }
        }
        self.data.push(value);
    }

    /// A value outside `ty` is reported by a bound-checked builder and
    /// rejected by any other.
    fn append_checked(&mut self, value: i64) -> Result<(), StoreError> {
        if self.bound_check.is_none() && !self.ty.fits(value) {
            return Err(value_mismatch(StorageType::Integer(self.ty), &Value::Long(value)));
        }
        self.append_long(value);
        Ok(())
    }

    pub fn append_option(&mut self, value: Option<i64>) {
        match value {
            Some(v) => self.append_long(v),
            None => self.append_nulls_inner(1),
        }
    }

    fn append_nulls_inner(&mut self, count: usize) {
        self.nulls.set_range(self.data.len(), count);
        self.data.push_repeated(0, count);
    }

    fn append_big_integer(&mut self, value: &BigInt) -> Result<(), StoreError> {
        match (value.to_i64(), &self.bound_check) {
            (Some(v), _) => self.append_checked(v),
            (None, Some(problems)) => {
                problems.report_number_out_of_range(&Value::BigInteger(value.clone()));
                self.append_nulls_inner(1);
                Ok(())
            }
            (None, None) => Err(value_mismatch(
                StorageType::Integer(self.ty),
                &Value::BigInteger(value.clone()),
            )),
        }
    }

    pub fn finish(self) -> LongStorage {
        let len = self.data.len();
        LongStorage::new(self.data.into_vec(), self.nulls.finish(len), self.ty)
    }

    /// The rows appended so far, as optional values.
    pub(crate) fn drain_options(self) -> Vec<Option<i64>> {
        let nulls = self.nulls;
        self.data
            .into_vec()
            .into_iter()
            .enumerate()
            .map(|(i, v)| (!nulls.get(i)).then_some(v))
            .collect()
    }
}

impl Builder for LongBuilder {
    fn storage_type(&self) -> StorageType {
        StorageType::Integer(self.ty)
    }

    fn append(&mut self, value: &Value) -> Result<(), StoreError> {
        match value {
            Value::Null => self.append_nulls_inner(1),
            Value::Long(v) => self.append_checked(*v)?,
            Value::Double(d) if d.fract() == 0.0 && IntegerType::INT_64.fits_double(*d) => {
                self.append_checked(*d as i64)?
            }
            Value::BigInteger(b) => self.append_big_integer(b)?,
            other => return Err(value_mismatch(self.storage_type(), other)),
        }
        Ok(())
    }

    fn append_nulls(&mut self, count: usize) {
        self.append_nulls_inner(count);
    }

    fn append_bulk_storage(&mut self, storage: &Storage) -> Result<(), StoreError> {
        match storage {
            Storage::Null(_) => {
                self.append_nulls_inner(storage.size());
                Ok(())
            }
            Storage::Long(s) if self.ty.fits_type(&s.integer_type()) => {
                let start = self.data.len();
                self.data.extend_from_slice(s.raw_values());
                self.nulls.copy_from(start, s.null_bitmap());
                Ok(())
            }
            Storage::Long(s) => {
                for i in 0..s.raw_values().len() {
                    match s.get(i) {
                        Some(v) => self.append_checked(v)?,
                        None => self.append_nulls_inner(1),
                    }
                }
                Ok(())
            }
            other => append_boxed(self, other),
        }
    }

    fn current_size(&self) -> usize {
        self.data.len()
    }

    fn seal(self: Box<Self>) -> Storage {
        Storage::Long(self.finish())
    }
}

//==================================================================================
// 2. InferredIntegerBuilder
//==================================================================================

/// Accumulates 64-bit integers and switches to big integers the first time a
/// value does not fit.
#[derive(Debug, Clone)]
pub enum InferredIntegerBuilder {
    Long(LongBuilder),
    Big(ObjectBuilder<BigInt>),
}

impl InferredIntegerBuilder {
    pub fn new(capacity: usize) -> Self {
        InferredIntegerBuilder::Long(LongBuilder::new(IntegerType::INT_64, capacity))
    }

    #[inline]
    pub fn append_long(&mut self, value: i64) {
        match self {
            InferredIntegerBuilder::Long(b) => b.append_long(value),
            InferredIntegerBuilder::Big(b) => b.append_item(BigInt::from(value)),
        }
    }

    pub fn append_big_integer(&mut self, value: BigInt) {
        if let InferredIntegerBuilder::Long(b) = self {
            if let Some(v) = value.to_i64() {
                b.append_long(v);
                return;
            }
            self.retype_to_big_integer();
        }
        if let InferredIntegerBuilder::Big(b) = self {
            b.append_item(value);
        }
    }

    fn retype_to_big_integer(&mut self) {
        let placeholder = InferredIntegerBuilder::Big(ObjectBuilder::new(0));
        if let InferredIntegerBuilder::Long(longs) = std::mem::replace(self, placeholder) {
            let rows = longs.drain_options();
            log_metric!("event" = "builder_retype", "from" = "Long", "to" = "BigInteger", "rows" = rows.len());
            let mut big = ObjectBuilder::new(rows.len() + 1);
            for row in rows {
                big.append_option(row.map(BigInt::from));
            }
            *self = InferredIntegerBuilder::Big(big);
        }
    }

    pub fn finish(self) -> Storage {
        match self {
            InferredIntegerBuilder::Long(b) => Storage::Long(b.finish()),
            InferredIntegerBuilder::Big(b) => Storage::BigInteger(b.finish()),
        }
    }
}

impl Builder for InferredIntegerBuilder {
    fn storage_type(&self) -> StorageType {
        match self {
            InferredIntegerBuilder::Long(_) => StorageType::INT_64,
            InferredIntegerBuilder::Big(_) => StorageType::BigInteger,
        }
    }

    fn append(&mut self, value: &Value) -> Result<(), StoreError> {
        match value {
            Value::Null => self.append_nulls(1),
            Value::Long(v) => self.append_long(*v),
            Value::BigInteger(b) => self.append_big_integer(b.clone()),
            other => return Err(value_mismatch(self.storage_type(), other)),
        }
        Ok(())
    }

    fn append_nulls(&mut self, count: usize) {
        match self {
            InferredIntegerBuilder::Long(b) => b.append_nulls_inner(count),
            InferredIntegerBuilder::Big(b) => Builder::append_nulls(b, count),
        }
    }

    fn append_bulk_storage(&mut self, storage: &Storage) -> Result<(), StoreError> {
        if matches!(storage, Storage::BigInteger(_)) {
            if let InferredIntegerBuilder::Long(_) = self {
                self.retype_to_big_integer();
            }
        }
        match self {
            InferredIntegerBuilder::Long(b) => b.append_bulk_storage(storage),
            InferredIntegerBuilder::Big(b) => b.append_bulk_storage(storage),
        }
    }

    fn current_size(&self) -> usize {
        match self {
            InferredIntegerBuilder::Long(b) => b.current_size(),
            InferredIntegerBuilder::Big(b) => b.current_size(),
        }
    }

    fn seal(self: Box<Self>) -> Storage {
        (*self).finish()
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
