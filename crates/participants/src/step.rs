//! The recurring saga-step pattern shared by every participant.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use model::{Event, SagaStatus, Topic, codec};
use transport::MessageBus;

use crate::error::StepError;

/// One participant's local action and its compensation.
///
/// The surrounding pattern (idempotency guard via the store insert, the
/// success/compensation branch, history annotation, re-emit) is supplied by
/// [`StepHandler`]; implementations only perform the local transactional
/// work.
#[async_trait]
pub trait SagaStep: Send + Sync {
    /// The participant identity written into `source`.
    fn source(&self) -> model::EventSource;

    /// A short verb phrase for log and history messages, e.g.
    /// "validate products".
    fn description(&self) -> &'static str;

    /// Performs the forward action, persisting the local record.
    ///
    /// Returns the success history message. Any error routes the event into
    /// the compensation branch; the error text becomes part of the history
    /// entry.
    async fn execute(&self, event: &mut Event) -> Result<String, StepError>;

    /// Undoes the forward action, best effort.
    ///
    /// Never fails: when compensation cannot run, the returned message says
    /// so and the saga proceeds. Must tolerate never having run forward.
    async fn compensate(&self, event: &mut Event) -> String;
}

/// Drives a [`SagaStep`] through the participant message pattern.
///
/// Consumes forward-step events from the participant's success topic and
/// compensation-step events from its fail topic; every handled event is
/// re-emitted to the orchestrator's inbound topic exactly once.
pub struct StepHandler<S, B> {
    step: S,
    bus: B,
}

impl<S, B> StepHandler<S, B>
where
    S: SagaStep,
    B: MessageBus,
{
    /// Creates a handler for one participant.
    pub fn new(step: S, bus: B) -> Self {
        Self { step, bus }
    }

    /// Handles a forward-step event.
    ///
    /// On success the event is marked `SUCCESS`; on any failure it is marked
    /// `ROLLBACK_PENDING`, signalling "I did not complete my forward action;
    /// do not compensate me, but unwind everything upstream of me". Either
    /// way the event goes back to the orchestrator.
    pub async fn handle_forward(&self, mut event: Event) {
        let source = self.step.source();

        match self.step.execute(&mut event).await {
            Ok(message) => {
                metrics::counter!("saga_step_success_total", "source" => source.as_str())
                    .increment(1);
                event.mark(source, SagaStatus::Success);
                event.add_history(source, SagaStatus::Success, message);
            }
            Err(error) => {
                tracing::error!(
                    %source,
                    %error,
                    saga = %event.saga_log_id(),
                    "error trying to {}",
                    self.step.description(),
                );
                metrics::counter!("saga_step_failed_total", "source" => source.as_str())
                    .increment(1);
                event.mark(source, SagaStatus::RollbackPending);
                event.add_history(
                    source,
                    SagaStatus::RollbackPending,
                    format!("Fail to {}: {}", self.step.description(), error),
                );
            }
        }

        self.bus
            .publish(Topic::Orchestrator, codec::to_json(&event))
            .await;
    }

    /// Handles a compensation-step event.
    ///
    /// Compensation is total: it always marks the event `FAILED`, records
    /// whether the rollback actually ran, and re-emits. A failure to
    /// compensate is a history entry, never an escalated error.
    pub async fn handle_rollback(&self, mut event: Event) {
        let source = self.step.source();

        let message = self.step.compensate(&mut event).await;
        metrics::counter!("saga_step_compensated_total", "source" => source.as_str()).increment(1);

        event.mark(source, SagaStatus::Failed);
        event.add_history(source, SagaStatus::Failed, message);

        self.bus
            .publish(Topic::Orchestrator, codec::to_json(&event))
            .await;
    }
}

impl<S, B> StepHandler<S, B>
where
    S: SagaStep + 'static,
    B: MessageBus + 'static,
{
    /// Spawns the participant's consumer loops.
    ///
    /// One loop per topic: the forward topic feeds [`Self::handle_forward`],
    /// the compensation topic feeds [`Self::handle_rollback`]. Undecodable
    /// payloads are dropped with a warning.
    pub async fn spawn(self) -> Vec<tokio::task::JoinHandle<()>> {
        let source = self.step.source();
        let (Some(forward), Some(compensation)) =
            (source.forward_topic(), source.compensation_topic())
        else {
            tracing::error!(%source, "saga step source has no participant topics");
            return Vec::new();
        };

        let handler = Arc::new(self);
        let mut handles = Vec::with_capacity(2);

        let forward_stream = handler.bus.subscribe(forward).await;
        let forward_handler = handler.clone();
        handles.push(tokio::spawn(async move {
            let mut stream = forward_stream;
            while let Some(payload) = stream.next().await {
                tracing::info!(topic = %forward, "receiving forward event");
                if let Some(event) = codec::from_json(&payload) {
                    forward_handler.handle_forward(event).await;
                }
            }
        }));

        let rollback_stream = handler.bus.subscribe(compensation).await;
        let rollback_handler = handler.clone();
        handles.push(tokio::spawn(async move {
            let mut stream = rollback_stream;
            while let Some(payload) = stream.next().await {
                tracing::info!(topic = %compensation, "receiving rollback event");
                if let Some(event) = codec::from_json(&payload) {
                    rollback_handler.handle_rollback(event).await;
                }
            }
        }));

        handles
    }
}
