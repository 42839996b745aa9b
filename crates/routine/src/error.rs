use deforest_core::AreaError;
use deforest_storage::StorageError;

use crate::adapter::AdapterError;

/// Why a routine cycle stopped in the `Fatal` state.
///
/// No variant is retried within a cycle. Only the state before `Commit`
/// matters for what persisted: the fetch log is written right after
/// measuring, progress only after a successful publish.
#[derive(Debug, thiserror::Error)]
pub enum RoutineError {
    /// The progress store could not be read or the fetch log not written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] StorageError),

    /// The measured day lies outside the supported date range.
    #[error("cannot measure {lag_days} days before {now}: date out of range")]
    PeriodOutOfRange { lag_days: i64, now: time::OffsetDateTime },

    /// The measurement source failed.
    #[error("measurement source error: {0}")]
    MeasurementSource(#[source] AdapterError),

    /// A country area made the pixel arithmetic impossible.
    #[error(transparent)]
    InvalidArea(#[from] AreaError),

    /// The country pointer is past the end of the country list.
    #[error("country index {index} is past the end of the {count}-country list")]
    CountriesExhausted { index: usize, count: usize },

    /// Country details or the base map could not be obtained.
    #[error("render error: {0}")]
    Render(#[source] AdapterError),

    /// The publisher rejected the render. Progress is left unchanged.
    #[error("publish error: {0}")]
    Publish(#[source] AdapterError),

    /// Publishing succeeded but the new progress record could not be appended.
    #[error("commit error: {0}")]
    Commit(#[source] StorageError),
}
