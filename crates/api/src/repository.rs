//! Event persistence collaborator.
//!
//! The core calls this only to checkpoint events — at saga origination and
//! at the ending notification — never to make routing decisions. Clients
//! poll the latest event for an order or transaction to learn the saga's
//! outcome.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{OrderId, TransactionId};
use model::Event;

/// Store for saga event checkpoints.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Saves an event checkpoint.
    async fn save(&self, event: Event);

    /// Returns all saved events, newest first.
    async fn find_all(&self) -> Vec<Event>;

    /// Returns the most recent event for an order.
    async fn find_latest_by_order_id(&self, order_id: OrderId) -> Option<Event>;

    /// Returns the most recent event for a saga instance.
    async fn find_latest_by_transaction_id(
        &self,
        transaction_id: TransactionId,
    ) -> Option<Event>;
}

/// In-memory event repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventRepository {
    events: Arc<RwLock<Vec<Event>>>,
}

impl InMemoryEventRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of saved checkpoints.
    pub fn event_count(&self) -> usize {
        self.events.read().unwrap().len()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn save(&self, event: Event) {
        self.events.write().unwrap().push(event);
    }

    async fn find_all(&self) -> Vec<Event> {
        let mut events = self.events.read().unwrap().clone();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        events
    }

    async fn find_latest_by_order_id(&self, order_id: OrderId) -> Option<Event> {
        self.events
            .read()
            .unwrap()
            .iter()
            .filter(|event| event.order_id == order_id)
            .max_by_key(|event| event.created_at)
            .cloned()
    }

    async fn find_latest_by_transaction_id(
        &self,
        transaction_id: TransactionId,
    ) -> Option<Event> {
        self.events
            .read()
            .unwrap()
            .iter()
            .filter(|event| event.transaction_id == transaction_id)
            .max_by_key(|event| event.created_at)
            .cloned()
    }
}
