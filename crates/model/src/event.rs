//! The saga event message and its append-only history.

use chrono::{DateTime, Utc};
use common::{EventId, OrderId, TransactionId};
use serde::{Deserialize, Serialize};

use crate::order::Order;
use crate::source::EventSource;
use crate::status::SagaStatus;

/// One immutable record per step attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    /// The component that performed the step.
    pub source: EventSource,
    /// The event status after the step.
    pub status: SagaStatus,
    /// Free-text description of the outcome.
    pub message: String,
    /// When the entry was appended.
    pub created_at: DateTime<Utc>,
}

/// The unit of saga state exchanged on every topic.
///
/// Conceptually mutated in transit: each hop derives a new message from the
/// previous one, rewrites `source`/`status`, appends to `event_history`, and
/// re-emits. The `transaction_id` is stable for the life of one saga and
/// `event_history` only ever grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Identifier of this event message.
    pub id: EventId,
    /// The saga correlation key.
    pub transaction_id: TransactionId,
    /// The order this saga fulfills.
    pub order_id: OrderId,
    /// Order snapshot, enriched by participants along the way.
    pub payload: Order,
    /// The component that last acted; unset only on the start event.
    pub source: Option<EventSource>,
    /// Outcome of the last step; unset only on the start event.
    pub status: Option<SagaStatus>,
    /// Append-only audit trail of step attempts.
    #[serde(default)]
    pub event_history: Vec<History>,
    /// When the event was originated.
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Creates the saga origination event for an order.
    ///
    /// `source` and `status` stay unset; the orchestrator writes them when
    /// the saga starts.
    pub fn for_order(order: Order) -> Self {
        Self {
            id: EventId::new(),
            transaction_id: order.transaction_id,
            order_id: order.id,
            payload: order,
            source: None,
            status: None,
            event_history: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Sets the `(source, status)` pair in one step.
    ///
    /// The pair determines the next transition and must always change
    /// together.
    pub fn mark(&mut self, source: EventSource, status: SagaStatus) {
        self.source = Some(source);
        self.status = Some(status);
    }

    /// Appends a history entry with a fresh timestamp.
    ///
    /// Prior entries are never overwritten.
    pub fn add_history(
        &mut self,
        source: EventSource,
        status: SagaStatus,
        message: impl Into<String>,
    ) {
        self.event_history.push(History {
            source,
            status,
            message: message.into(),
            created_at: Utc::now(),
        });
    }

    /// Formats the correlation line used in saga logs.
    pub fn saga_log_id(&self) -> String {
        format!(
            "ORDER ID: {} | TRANSACTION ID: {} | EVENT ID: {}",
            self.order_id, self.transaction_id, self.id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::order::{OrderLine, Product};

    fn test_event() -> Event {
        Event::for_order(Order::new(vec![OrderLine::new(
            Product::new("WIDGET", Money::from_cents(100)),
            1,
        )]))
    }

    #[test]
    fn test_start_event_has_no_source_or_status() {
        let event = test_event();
        assert!(event.source.is_none());
        assert!(event.status.is_none());
        assert!(event.event_history.is_empty());
    }

    #[test]
    fn test_transaction_id_matches_payload() {
        let event = test_event();
        assert_eq!(event.transaction_id, event.payload.transaction_id);
        assert_eq!(event.order_id, event.payload.id);
    }

    #[test]
    fn test_history_is_append_only() {
        let mut event = test_event();
        event.add_history(
            EventSource::Orchestrator,
            SagaStatus::Success,
            "Saga started",
        );
        event.add_history(
            EventSource::ProductValidation,
            SagaStatus::Success,
            "Products validated",
        );

        assert_eq!(event.event_history.len(), 2);
        assert_eq!(event.event_history[0].message, "Saga started");
        assert_eq!(
            event.event_history[1].source,
            EventSource::ProductValidation
        );
    }

    #[test]
    fn test_mark_sets_both_fields() {
        let mut event = test_event();
        event.mark(EventSource::Payment, SagaStatus::RollbackPending);
        assert_eq!(event.source, Some(EventSource::Payment));
        assert_eq!(event.status, Some(SagaStatus::RollbackPending));
    }

    #[test]
    fn test_serialization_roundtrip_with_history() {
        let mut event = test_event();
        event.mark(EventSource::Inventory, SagaStatus::Failed);
        event.add_history(
            EventSource::Inventory,
            SagaStatus::Failed,
            "Rollback executed for inventory",
        );

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
