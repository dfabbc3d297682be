pub mod file;

pub use file::{FileRecord, FileRecordResponse, FileSummary, OwnerId};
