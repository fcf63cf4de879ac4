//! Saga event query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use common::{OrderId, TransactionId};
use model::Event;
use serde::Deserialize;
use transport::MessageBus;

use crate::AppState;
use crate::error::ApiError;
use crate::repository::EventRepository;

/// Query filter for the single-event lookup. Exactly one key is required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    pub order_id: Option<OrderId>,
    pub transaction_id: Option<TransactionId>,
}

/// GET /api/event — latest event for one order or one saga instance.
#[tracing::instrument(skip(state))]
pub async fn find<R, B>(
    State(state): State<Arc<AppState<R, B>>>,
    Query(filter): Query<EventFilter>,
) -> Result<Json<Event>, ApiError>
where
    R: EventRepository + 'static,
    B: MessageBus + 'static,
{
    let event = match (filter.order_id, filter.transaction_id) {
        (Some(order_id), None) => {
            state
                .repository
                .find_latest_by_order_id(order_id)
                .await
                .ok_or_else(|| {
                    ApiError::NotFound(format!("Event not found by orderId: {order_id}"))
                })?
        }
        (None, Some(transaction_id)) => state
            .repository
            .find_latest_by_transaction_id(transaction_id)
            .await
            .ok_or_else(|| {
                ApiError::NotFound(format!(
                    "Event not found by transactionId: {transaction_id}"
                ))
            })?,
        _ => {
            return Err(ApiError::BadRequest(
                "Provide exactly one of orderId or transactionId".to_string(),
            ));
        }
    };

    Ok(Json(event))
}

/// GET /api/events — all saved events, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<R, B>(
    State(state): State<Arc<AppState<R, B>>>,
) -> Result<Json<Vec<Event>>, ApiError>
where
    R: EventRepository + 'static,
    B: MessageBus + 'static,
{
    Ok(Json(state.repository.find_all().await))
}
