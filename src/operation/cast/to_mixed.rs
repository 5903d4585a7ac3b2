use crate::context::Context;
use crate::error::StoreError;
use crate::operation::cast::{log_retype, StorageConverter};
use crate::problems::CastProblemAggregator;
use crate::storage::Storage;
use crate::types::StorageType;

/// Every storage is already a valid mixed storage; the result is a
/// type-erased view sharing the source's data.
pub struct ToMixedConverter;

impl StorageConverter for ToMixedConverter {
    fn target(&self) -> StorageType {
        StorageType::AnyObject
    }

    fn can_apply(&self, _source: &StorageType) -> bool {
        true
    }

    fn convert(
        &self,
        storage: &Storage,
        _ctx: &Context,
        _problems: &CastProblemAggregator,
    ) -> Result<Storage, StoreError> {
        log_retype(storage.storage_type(), StorageType::AnyObject);
        Ok(storage.as_mixed())
    }
}
