//! The `(source, status) → next topic` decision table.

use std::collections::HashMap;

use model::{Event, EventSource, SagaStatus, Topic};

use crate::error::RouteError;

/// Immutable routing table over the fixed participant pipeline.
///
/// Built once at startup from [`EventSource::PIPELINE`] and queried
/// read-only, so no locking is ever needed. For each participant P two kinds
/// of rows exist: `(P, SUCCESS)` routes to the next participant's forward
/// topic (or finish-success when P is last), and `(P, FAILED)` /
/// `(P, ROLLBACK_PENDING)` route to the *previous* participant's
/// compensation topic (or finish-fail when P is first) — a participant that
/// did not complete its forward action is never compensated itself.
#[derive(Debug, Clone)]
pub struct DecisionTable {
    routes: HashMap<(EventSource, SagaStatus), Topic>,
}

impl DecisionTable {
    /// Builds the table for the fixed pipeline.
    pub fn new() -> Self {
        let pipeline = EventSource::PIPELINE;
        let mut routes = HashMap::new();

        for (position, participant) in pipeline.iter().enumerate() {
            let on_success = pipeline
                .get(position + 1)
                .and_then(EventSource::forward_topic)
                .unwrap_or(Topic::FinishSuccess);
            let on_failure = match position.checked_sub(1) {
                Some(previous) => pipeline[previous]
                    .compensation_topic()
                    .unwrap_or(Topic::FinishFail),
                None => Topic::FinishFail,
            };

            routes.insert((*participant, SagaStatus::Success), on_success);
            routes.insert((*participant, SagaStatus::Failed), on_failure);
            routes.insert((*participant, SagaStatus::RollbackPending), on_failure);
        }

        // The orchestrator's own rows: saga start and a failed start.
        if let Some(first) = pipeline.first().and_then(EventSource::forward_topic) {
            routes.insert((EventSource::Orchestrator, SagaStatus::Success), first);
        }
        routes.insert(
            (EventSource::Orchestrator, SagaStatus::Failed),
            Topic::FinishFail,
        );

        Self { routes }
    }

    /// Looks up the next topic for an event's `(source, status)` pair.
    ///
    /// Loud on bad input: a missing pair or an unmatched row is a hard
    /// error, never a silent default.
    pub fn next_topic(&self, event: &Event) -> Result<Topic, RouteError> {
        let (Some(source), Some(status)) = (event.source, event.status) else {
            return Err(RouteError::MissingSourceStatus);
        };

        let topic = self
            .routes
            .get(&(source, status))
            .copied()
            .ok_or(RouteError::NoMatchingRoute {
                event_source: source,
                status,
            })?;

        log_current_saga(event, source, status, topic);
        Ok(topic)
    }
}

impl Default for DecisionTable {
    fn default() -> Self {
        Self::new()
    }
}

fn log_current_saga(event: &Event, source: EventSource, status: SagaStatus, topic: Topic) {
    let saga = event.saga_log_id();
    match status {
        SagaStatus::Success => {
            tracing::info!(%source, next_topic = %topic, %saga, "current saga: success");
        }
        SagaStatus::RollbackPending => {
            tracing::info!(
                %source,
                next_topic = %topic,
                %saga,
                "current saga: sending to rollback previous service",
            );
        }
        SagaStatus::Failed => {
            tracing::info!(
                %source,
                next_topic = %topic,
                %saga,
                "current saga: rollback executed, unwinding",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{Money, Order, OrderLine, Product};

    fn event_with(source: EventSource, status: SagaStatus) -> Event {
        let mut event = Event::for_order(Order::new(vec![OrderLine::new(
            Product::new("WIDGET", Money::from_cents(100)),
            1,
        )]));
        event.mark(source, status);
        event
    }

    #[test]
    fn test_forward_routes() {
        let table = DecisionTable::new();

        let rows = [
            (
                EventSource::Orchestrator,
                SagaStatus::Success,
                Topic::ProductValidationSuccess,
            ),
            (
                EventSource::ProductValidation,
                SagaStatus::Success,
                Topic::PaymentSuccess,
            ),
            (
                EventSource::Payment,
                SagaStatus::Success,
                Topic::InventorySuccess,
            ),
            (
                EventSource::Inventory,
                SagaStatus::Success,
                Topic::FinishSuccess,
            ),
        ];

        for (source, status, expected) in rows {
            assert_eq!(
                table.next_topic(&event_with(source, status)).unwrap(),
                expected
            );
        }
    }

    #[test]
    fn test_compensation_routes_unwind_upstream() {
        let table = DecisionTable::new();

        let rows = [
            (EventSource::Payment, SagaStatus::RollbackPending, Topic::ProductValidationFail),
            (EventSource::Payment, SagaStatus::Failed, Topic::ProductValidationFail),
            (EventSource::Inventory, SagaStatus::RollbackPending, Topic::PaymentFail),
            (EventSource::Inventory, SagaStatus::Failed, Topic::PaymentFail),
            (EventSource::ProductValidation, SagaStatus::Failed, Topic::FinishFail),
            (EventSource::Orchestrator, SagaStatus::Failed, Topic::FinishFail),
        ];

        for (source, status, expected) in rows {
            assert_eq!(
                table.next_topic(&event_with(source, status)).unwrap(),
                expected
            );
        }
    }

    #[test]
    fn test_first_participant_rollback_pending_routes_to_finish_fail() {
        // The boundary row: no predecessor to compensate, so the saga ends.
        let table = DecisionTable::new();
        assert_eq!(
            table
                .next_topic(&event_with(
                    EventSource::ProductValidation,
                    SagaStatus::RollbackPending,
                ))
                .unwrap(),
            Topic::FinishFail
        );
    }

    #[test]
    fn test_missing_source_or_status_is_a_hard_error() {
        let table = DecisionTable::new();
        let mut event = event_with(EventSource::Payment, SagaStatus::Success);

        event.status = None;
        assert_eq!(
            table.next_topic(&event).unwrap_err(),
            RouteError::MissingSourceStatus
        );

        event.status = Some(SagaStatus::Success);
        event.source = None;
        assert_eq!(
            table.next_topic(&event).unwrap_err(),
            RouteError::MissingSourceStatus
        );
    }

    #[test]
    fn test_unmatched_row_is_a_hard_error() {
        let table = DecisionTable::new();
        // The orchestrator never reports ROLLBACK_PENDING; no row exists.
        let event = event_with(EventSource::Orchestrator, SagaStatus::RollbackPending);
        assert_eq!(
            table.next_topic(&event).unwrap_err(),
            RouteError::NoMatchingRoute {
                event_source: EventSource::Orchestrator,
                status: SagaStatus::RollbackPending,
            }
        );
    }

    #[test]
    fn test_lookup_is_deterministic() {
        let table = DecisionTable::new();
        let event = event_with(EventSource::Payment, SagaStatus::Success);
        let first = table.next_topic(&event).unwrap();
        for _ in 0..10 {
            assert_eq!(table.next_topic(&event).unwrap(), first);
        }
    }
}
