//! HTTP API server and process bootstrap for the order saga system.
//!
//! Provides REST endpoints for order creation and saga event queries, wires
//! the in-process saga pipeline (orchestrator plus participants), with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod notify;
pub mod order_service;
pub mod repository;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use orchestrator::Orchestrator;
use participants::{
    InMemoryPaymentStore, InMemoryReservationStore, InMemoryValidationStore, InventoryStep,
    PaymentStep, ProductCatalog, ProductValidationStep, StepHandler, StockLedger,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use transport::{InMemoryBroker, MessageBus};

use order_service::OrderService;
use repository::{EventRepository, InMemoryEventRepository};

/// Shared application state accessible from all handlers.
pub struct AppState<R, B> {
    pub order_service: OrderService<R, B>,
    pub repository: Arc<R>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<R, B>(state: Arc<AppState<R, B>>, metrics_handle: PrometheusHandle) -> Router
where
    R: EventRepository + 'static,
    B: MessageBus + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/order", post(routes::orders::create::<R, B>))
        .route("/api/event", get(routes::events::find::<R, B>))
        .route("/api/events", get(routes::events::list::<R, B>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// The full in-process saga pipeline: broker, orchestrator, participants,
/// and the event checkpoint store.
///
/// Every collaborator shares state through `Arc` interiors, so the handles
/// kept here observe the same world the spawned consumers mutate.
pub struct Pipeline {
    pub broker: InMemoryBroker,
    pub repository: Arc<InMemoryEventRepository>,
    pub catalog: ProductCatalog,
    pub ledger: StockLedger,
    pub validations: InMemoryValidationStore,
    pub payments: InMemoryPaymentStore,
    pub reservations: InMemoryReservationStore,
}

impl Pipeline {
    /// Creates a pipeline over a seeded catalog and stock ledger.
    pub fn new(catalog: ProductCatalog, ledger: StockLedger) -> Self {
        Self {
            broker: InMemoryBroker::new(),
            repository: Arc::new(InMemoryEventRepository::new()),
            catalog,
            ledger,
            validations: InMemoryValidationStore::new(),
            payments: InMemoryPaymentStore::new(),
            reservations: InMemoryReservationStore::new(),
        }
    }

    /// Spawns every consumer loop: the orchestrator, the three saga
    /// participants, and the ending notification checkpoint.
    pub async fn spawn(&self) -> Vec<tokio::task::JoinHandle<()>> {
        let mut handles = Vec::new();

        let driver = Arc::new(Orchestrator::new(self.broker.clone()));
        handles.extend(orchestrator::consumer::spawn(driver).await);

        let validation = StepHandler::new(
            ProductValidationStep::new(self.catalog.clone(), self.validations.clone()),
            self.broker.clone(),
        );
        handles.extend(validation.spawn().await);

        let payment = StepHandler::new(PaymentStep::new(self.payments.clone()), self.broker.clone());
        handles.extend(payment.spawn().await);

        let inventory = StepHandler::new(
            InventoryStep::new(self.ledger.clone(), self.reservations.clone()),
            self.broker.clone(),
        );
        handles.extend(inventory.spawn().await);

        handles.push(notify::spawn(self.repository.clone(), self.broker.clone()).await);

        handles
    }

    /// Creates the application state backed by this pipeline.
    pub fn app_state(&self) -> Arc<AppState<InMemoryEventRepository, InMemoryBroker>> {
        Arc::new(AppState {
            order_service: OrderService::new(self.repository.clone(), self.broker.clone()),
            repository: self.repository.clone(),
        })
    }
}
