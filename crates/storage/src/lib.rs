mod error;
mod jsonl;
mod memory;
mod record;
mod traits;

pub mod conformance;

pub use error::StorageError;
pub use jsonl::JsonlStore;
pub use memory::MemoryStore;
pub use record::{PeriodFetchLog, ProgressRecord};
pub use traits::ProgressStore;
