use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use model::Topic;
use tokio::sync::RwLock;
use tokio::sync::mpsc;

use crate::bus::{MessageBus, MessageStream};

#[derive(Default)]
struct BrokerState {
    subscribers: HashMap<Topic, Vec<mpsc::UnboundedSender<String>>>,
    published: Vec<(Topic, String)>,
    fail_on_publish: bool,
}

/// In-process broker used for tests and the single-process deployment mode.
///
/// Each subscription gets its own unbounded channel; a publish fans out to
/// every live subscriber of the topic. Delivery order follows publish order
/// per topic, matching the one-partition case of a real broker.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<RwLock<BrokerState>>,
}

impl InMemoryBroker {
    /// Creates a new broker with no subscriptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the broker to fail every publish call.
    pub async fn set_fail_on_publish(&self, fail: bool) {
        self.state.write().await.fail_on_publish = fail;
    }

    /// Returns every message published so far, in publish order.
    pub async fn published(&self) -> Vec<(Topic, String)> {
        self.state.read().await.published.clone()
    }

    /// Returns the number of messages published to one topic.
    pub async fn published_count(&self, topic: Topic) -> usize {
        self.state
            .read()
            .await
            .published
            .iter()
            .filter(|(t, _)| *t == topic)
            .count()
    }
}

#[async_trait]
impl MessageBus for InMemoryBroker {
    async fn publish(&self, topic: Topic, payload: String) {
        let mut state = self.state.write().await;

        if state.fail_on_publish {
            metrics::counter!("saga_publish_failures_total", "topic" => topic.name()).increment(1);
            tracing::error!(%topic, "failed to publish event");
            return;
        }

        tracing::debug!(%topic, payload = %payload, "publishing event");
        metrics::counter!("saga_messages_published_total", "topic" => topic.name()).increment(1);

        if let Some(senders) = state.subscribers.get_mut(&topic) {
            // Drop subscribers whose receivers are gone.
            senders.retain(|tx| tx.send(payload.clone()).is_ok());
        }
        state.published.push((topic, payload));
    }

    async fn subscribe(&self, topic: Topic) -> MessageStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state
            .write()
            .await
            .subscribers
            .entry(topic)
            .or_default()
            .push(tx);

        Box::pin(futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|payload| (payload, rx))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let broker = InMemoryBroker::new();
        let mut stream = broker.subscribe(Topic::StartSaga).await;

        broker.publish(Topic::StartSaga, "one".to_string()).await;
        broker.publish(Topic::StartSaga, "two".to_string()).await;

        assert_eq!(stream.next().await.as_deref(), Some("one"));
        assert_eq!(stream.next().await.as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let broker = InMemoryBroker::new();
        let mut payment = broker.subscribe(Topic::PaymentSuccess).await;

        broker
            .publish(Topic::InventorySuccess, "inventory".to_string())
            .await;
        broker
            .publish(Topic::PaymentSuccess, "payment".to_string())
            .await;

        assert_eq!(payment.next().await.as_deref(), Some("payment"));
        assert_eq!(broker.published_count(Topic::InventorySuccess).await, 1);
    }

    #[tokio::test]
    async fn test_publish_failure_is_swallowed() {
        let broker = InMemoryBroker::new();
        broker.set_fail_on_publish(true).await;

        // Must not panic or error; the message is simply lost.
        broker.publish(Topic::Orchestrator, "lost".to_string()).await;
        assert_eq!(broker.published_count(Topic::Orchestrator).await, 0);
    }

    #[tokio::test]
    async fn test_fanout_to_multiple_subscribers() {
        let broker = InMemoryBroker::new();
        let mut a = broker.subscribe(Topic::NotifyEnding).await;
        let mut b = broker.subscribe(Topic::NotifyEnding).await;

        broker
            .publish(Topic::NotifyEnding, "done".to_string())
            .await;

        assert_eq!(a.next().await.as_deref(), Some("done"));
        assert_eq!(b.next().await.as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_pruned() {
        let broker = InMemoryBroker::new();
        let stream = broker.subscribe(Topic::StartSaga).await;
        drop(stream);

        // Publishing to a topic with only dead subscribers must not fail.
        broker.publish(Topic::StartSaga, "late".to_string()).await;
        assert_eq!(broker.published_count(Topic::StartSaga).await, 1);
    }
}
