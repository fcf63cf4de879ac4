//! Order creation and event lookup behind the HTTP handlers.

use std::sync::Arc;

use model::{Event, Order, OrderLine, Topic, codec};
use serde::Deserialize;
use transport::MessageBus;

use crate::error::ApiError;
use crate::repository::EventRepository;

/// Request body for order creation.
#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub products: Vec<OrderLine>,
}

/// Creates orders and originates their sagas.
///
/// Creation is fire-and-forget from the client's point of view: the order is
/// returned immediately and the saga outcome is observed later through the
/// event queries.
pub struct OrderService<R, B> {
    repository: Arc<R>,
    bus: B,
}

impl<R, B> OrderService<R, B>
where
    R: EventRepository,
    B: MessageBus,
{
    /// Creates the service over its persistence and transport collaborators.
    pub fn new(repository: Arc<R>, bus: B) -> Self {
        Self { repository, bus }
    }

    /// Creates an order, checkpoints its origination event, and publishes it
    /// to the saga start topic.
    pub async fn create_order(&self, request: OrderRequest) -> Result<Order, ApiError> {
        if request.products.is_empty() {
            return Err(ApiError::BadRequest(
                "Product list is empty".to_string(),
            ));
        }

        let order = Order::new(request.products);
        let event = Event::for_order(order.clone());

        tracing::info!(saga = %event.saga_log_id(), "order created");
        self.repository.save(event.clone()).await;
        self.bus
            .publish(Topic::StartSaga, codec::to_json(&event))
            .await;

        Ok(order)
    }
}
