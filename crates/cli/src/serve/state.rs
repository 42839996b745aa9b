//! Application state shared across request handlers.

use std::sync::Arc;

use deforest_routine::Routine;

pub(crate) struct AppState {
    /// The server's single routine; its status log backs `/status`.
    pub(crate) routine: Arc<Routine>,
}
