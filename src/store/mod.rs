//! Task record storage

pub mod manager;
pub mod record;

pub use manager::{sample_records, RecordStore};
pub use record::{NewRecord, Priority, Record, RecordPatch};
