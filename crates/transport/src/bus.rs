use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use model::Topic;

/// A stream of raw message payloads from one topic subscription.
pub type MessageStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Abstract publish/subscribe over named topics.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publishes a serialized event to a topic.
    ///
    /// Fire-and-forget: a broker failure is logged by the adapter and
    /// recorded on the `saga_publish_failures_total` counter, but never
    /// returned to the caller. Consumers must not crash on transient broker
    /// errors; a silently stuck saga surfaces through that metric.
    async fn publish(&self, topic: Topic, payload: String);

    /// Subscribes to a topic, returning the stream of inbound payloads.
    ///
    /// Each subscription receives every message published to the topic after
    /// the subscription was created.
    async fn subscribe(&self, topic: Topic) -> MessageStream;
}
