// crates/cld-ingest/src/lib.rs
//
// Core ingestion pipeline logic, storage-free:
//   decode (CSV / spreadsheet-binary) -> validate -> partition
//
// The orchestrator in cld-runtime owns the surrounding obligations (size and
// extension gates, temp-artifact release, agent snapshot, persistence).

pub mod decode;
pub mod error;
pub mod partition;
pub mod validate;

pub use decode::{decode_rows, FileFormat, RawRow};
pub use error::UploadError;
pub use partition::partition_records;
pub use validate::validate_rows;
