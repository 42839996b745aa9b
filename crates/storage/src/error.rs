/// All errors that can be returned by a ProgressStore implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Another writer appended a progress record since this one was read.
    /// The record's sequence is not the successor of the stored latest.
    #[error("concurrent conflict: expected sequence {expected}, record has {found}")]
    ConcurrentConflict { expected: u64, found: u64 },

    /// The record would break a progress invariant (negative area,
    /// country pointer moving backwards, ...).
    #[error("invalid progress record: {0}")]
    InvalidRecord(String),

    /// A backend-specific storage error (I/O, serialization, unavailable store).
    #[error("storage backend error: {0}")]
    Backend(String),
}
