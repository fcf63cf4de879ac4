//! The saga lifecycle driver.

use model::{Event, EventSource, SagaStatus, Topic, codec};
use transport::MessageBus;

use crate::decision_table::DecisionTable;
use crate::error::RouteError;

/// Drives one saga instance through start, continuation and termination.
///
/// The driver holds no per-saga state: every decision is a pure function of
/// the inbound event's `(source, status)` pair, so any number of sagas can
/// flow through one driver concurrently.
pub struct Orchestrator<B> {
    bus: B,
    table: DecisionTable,
}

impl<B: MessageBus> Orchestrator<B> {
    /// Creates an orchestrator over a message bus.
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            table: DecisionTable::new(),
        }
    }

    pub(crate) fn bus(&self) -> &B {
        &self.bus
    }

    /// Starts a saga from an origination event.
    ///
    /// Forces `source = ORCHESTRATOR`, `status = SUCCESS`, appends the
    /// "Saga started" history entry, and publishes to the first
    /// participant's topic.
    pub async fn start_saga(&self, mut event: Event) -> Result<(), RouteError> {
        event.mark(EventSource::Orchestrator, SagaStatus::Success);
        let topic = self.table.next_topic(&event)?;

        metrics::counter!("saga_started_total").increment(1);
        tracing::info!(saga = %event.saga_log_id(), "saga started");
        event.add_history(
            EventSource::Orchestrator,
            SagaStatus::Success,
            "Saga started",
        );

        self.bus.publish(topic, codec::to_json(&event)).await;
        Ok(())
    }

    /// Continues a saga after a participant outcome.
    ///
    /// Trusts the inbound `(source, status)` as produced by whichever
    /// participant just ran; mutates nothing.
    pub async fn continue_saga(&self, event: Event) -> Result<(), RouteError> {
        let topic = self.table.next_topic(&event)?;

        tracing::info!(saga = %event.saga_log_id(), next_topic = %topic, "saga continuing");
        self.bus.publish(topic, codec::to_json(&event)).await;
        Ok(())
    }

    /// Terminates a saga successfully.
    ///
    /// Publishes the ending notification; terminal and non-retriable from
    /// the orchestrator's perspective.
    pub async fn finish_saga_success(&self, mut event: Event) {
        event.mark(EventSource::Orchestrator, SagaStatus::Success);

        metrics::counter!("saga_completed_total").increment(1);
        tracing::info!(saga = %event.saga_log_id(), "saga finished successfully");
        event.add_history(
            EventSource::Orchestrator,
            SagaStatus::Success,
            "Saga finished",
        );

        self.notify_finished_saga(&event).await;
    }

    /// Terminates a saga after the compensation chain completed.
    pub async fn finish_saga_failed(&self, mut event: Event) {
        event.mark(EventSource::Orchestrator, SagaStatus::Failed);

        metrics::counter!("saga_failed_total").increment(1);
        tracing::warn!(saga = %event.saga_log_id(), "saga finished with errors");
        event.add_history(
            EventSource::Orchestrator,
            SagaStatus::Failed,
            "Saga finished with errors",
        );

        self.notify_finished_saga(&event).await;
    }

    async fn notify_finished_saga(&self, event: &Event) {
        self.bus
            .publish(Topic::NotifyEnding, codec::to_json(event))
            .await;
    }
}
