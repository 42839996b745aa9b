//! deforest-routine: one measurement-accumulation-render-publish cycle.
//!
//! [`Routine::run_cycle`] drives the explicit [`RoutineState`] machine:
//!
//! ```text
//! Init -> Measure -> Decide -> Compute -> Transition -> Render -> Publish -> Commit -> Done
//!                       \-> NoOp        any failing step -> Fatal
//! ```
//!
//! External systems (alert source, country data, base maps, publishing)
//! sit behind the traits in [`adapter`]; persistence is a
//! [`deforest_storage::ProgressStore`].

pub mod adapter;
pub mod error;
pub mod message;
pub mod render;
pub mod routine;
pub mod status;

pub use adapter::{
    AdapterError, BaseMapProvider, CountryCatalog, CountryDetails, CountryRecord, Measurement,
    MeasurementSource, Period, Publisher,
};
pub use error::RoutineError;
pub use render::{Palette, PixelBudgets};
pub use routine::{Collaborators, CycleOutcome, Plan, Routine, RoutineSettings, RoutineState};
pub use status::{StatusEntry, StatusLog, StatusSnapshot};
