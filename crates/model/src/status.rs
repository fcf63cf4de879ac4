//! Saga status carried on every event.

use serde::{Deserialize, Serialize};

/// Outcome of the last step that touched an event.
///
/// Together with [`EventSource`](crate::EventSource), the status determines
/// the next transition in the orchestrator's decision table. Whichever
/// component last acted must always set both fields together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SagaStatus {
    /// The step completed its forward action.
    Success,

    /// The step did not complete its forward action: unwind everything
    /// upstream, but do not compensate the reporting participant.
    RollbackPending,

    /// The step's compensation ran (or the saga finished with errors).
    Failed,
}

impl SagaStatus {
    /// Returns the status name as serialized on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStatus::Success => "SUCCESS",
            SagaStatus::RollbackPending => "ROLLBACK_PENDING",
            SagaStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for SagaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
