use num_traits::Zero;

use crate::builder::BoolBuilder;
use crate::context::Context;
use crate::error::StoreError;
use crate::operation::cast::{convert_boxed, StorageConverter};
use crate::operation::iterators::{build_over_doubles, build_over_longs};
use crate::problems::CastProblemAggregator;
use crate::storage::Storage;
use crate::types::{StorageType, Value};

/// Numbers are true when non-zero.
pub struct ToBooleanConverter;

fn boolean_of(value: &Value) -> Option<bool> {
    match value {
        Value::Boolean(b) => Some(*b),
        Value::Long(v) => Some(*v != 0),
        Value::Double(v) => Some(*v != 0.0),
        Value::BigInteger(v) => Some(!v.is_zero()),
        Value::BigDecimal(v) => Some(!v.is_zero()),
        _ => None,
    }
}

impl StorageConverter for ToBooleanConverter {
    fn target(&self) -> StorageType {
        StorageType::Boolean
    }

    fn can_apply(&self, source: &StorageType) -> bool {
        source.is_numeric() || matches!(source, StorageType::AnyObject | StorageType::Null)
    }

    fn convert(
        &self,
        storage: &Storage,
        ctx: &Context,
        problems: &CastProblemAggregator,
    ) -> Result<Storage, StoreError> {
        let len = storage.size();
        match storage {
            Storage::Long(s) => build_over_longs(s, BoolBuilder::new(len), ctx, |b, _, v| {
                b.append_boolean(v != 0);
                Ok(())
            }),
            Storage::Double(s) => build_over_doubles(s, BoolBuilder::new(len), ctx, |b, _, v| {
                b.append_boolean(v != 0.0);
                Ok(())
            }),
            _ => convert_boxed(storage, BoolBuilder::new(len), ctx, problems, |b, v| {
                b.append_boolean(boolean_of(v)?);
                Some(())
            }),
        }
    }
}
