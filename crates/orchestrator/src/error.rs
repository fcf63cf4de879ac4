//! Orchestrator routing errors.

use model::{EventSource, SagaStatus};
use thiserror::Error;

/// A routing failure in the decision table.
///
/// Both variants indicate a logic or data bug, never an expected runtime
/// outcome under correct participant behavior: swallowing them would
/// silently drop the saga, so they propagate as hard errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// The event arrived without its `(source, status)` pair set.
    #[error("Source and status must be informed")]
    MissingSourceStatus,

    /// No decision-table row matches the pair.
    #[error("No route found for source {event_source} with status {status}")]
    NoMatchingRoute {
        event_source: EventSource,
        status: SagaStatus,
    },
}
