// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The bridge is the boundary between the storage engine and Arrow data. It is
// the only module that knows about Arrow arrays; the engine itself works on
// `Storage` values alone.
//
// Data Flow (Import):
//
//   [RecordBatch] -> record_batch_to_columns -> per array: Storage::from_arrow
//         |
//         `-> StorageType::from_arrow_type picks the variant, values are copied
//             into a fresh storage with nulls preserved.
//
// Data Flow (Export):
//
//   [Column]s -> columns_to_record_batch -> per storage: Storage::to_arrow
//         |
//         `-> facades export their inner storage; big numbers and mixed
//             storages have no Arrow counterpart and are rejected.
//
// ====================================================================================
pub mod arrow;

pub use self::arrow::{columns_to_record_batch, record_batch_to_columns};
