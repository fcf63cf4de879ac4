//! Saga ending notification consumer.
//!
//! The orchestrator publishes every terminal event to the ending topic; this
//! consumer checkpoints it so event queries reflect the final outcome.

use std::sync::Arc;

use futures_util::StreamExt;
use model::{Topic, codec};
use transport::MessageBus;

use crate::repository::EventRepository;

/// Spawns the consumer that persists saga ending notifications.
pub async fn spawn<R, B>(repository: Arc<R>, bus: B) -> tokio::task::JoinHandle<()>
where
    R: EventRepository + 'static,
    B: MessageBus + 'static,
{
    let mut stream = bus.subscribe(Topic::NotifyEnding).await;
    tokio::spawn(async move {
        while let Some(payload) = stream.next().await {
            let Some(mut event) = codec::from_json(&payload) else {
                continue;
            };
            event.created_at = chrono::Utc::now();
            tracing::info!(saga = %event.saga_log_id(), "saga notified ending");
            repository.save(event).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{Event, Money, Order, OrderLine, Product};
    use transport::InMemoryBroker;

    use crate::repository::InMemoryEventRepository;

    #[tokio::test]
    async fn test_ending_notification_is_persisted() {
        let repository = Arc::new(InMemoryEventRepository::new());
        let broker = InMemoryBroker::new();
        let handle = spawn(repository.clone(), broker.clone()).await;

        let event = Event::for_order(Order::new(vec![OrderLine::new(
            Product::new("WIDGET", Money::from_cents(100)),
            1,
        )]));
        broker
            .publish(Topic::NotifyEnding, codec::to_json(&event))
            .await;

        tokio::time::timeout(std::time::Duration::from_secs(1), async {
            while repository.event_count() == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        let saved = repository
            .find_latest_by_transaction_id(event.transaction_id)
            .await
            .unwrap();
        assert_eq!(saved.id, event.id);
        handle.abort();
    }

    #[tokio::test]
    async fn test_bad_payload_is_skipped() {
        let repository = Arc::new(InMemoryEventRepository::new());
        let broker = InMemoryBroker::new();
        let handle = spawn(repository.clone(), broker.clone()).await;

        broker
            .publish(Topic::NotifyEnding, "not json".to_string())
            .await;
        tokio::task::yield_now().await;

        assert_eq!(repository.event_count(), 0);
        handle.abort();
    }
}
