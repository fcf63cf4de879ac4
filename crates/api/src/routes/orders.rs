//! Order creation endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use model::Order;
use transport::MessageBus;

use crate::AppState;
use crate::error::ApiError;
use crate::order_service::OrderRequest;
use crate::repository::EventRepository;

/// POST /api/order — create an order and start its saga.
#[tracing::instrument(skip(state, request))]
pub async fn create<R, B>(
    State(state): State<Arc<AppState<R, B>>>,
    Json(request): Json<OrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError>
where
    R: EventRepository + 'static,
    B: MessageBus + 'static,
{
    let order = state.order_service.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
