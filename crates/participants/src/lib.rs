//! Saga participants.
//!
//! Every participant service implements the same step shape: an idempotency
//! guard, a local transactional action, a success/compensation branch, a
//! history annotation, and a re-emit to the orchestrator's inbound topic.
//! The shape lives once in [`StepHandler`]; the three concrete steps
//! (product validation, payment, inventory) only provide the local action
//! and its compensation.

pub mod error;
pub mod inventory;
pub mod payment;
pub mod product_validation;
pub mod step;

pub use error::StepError;
pub use inventory::{
    InMemoryReservationStore, InventoryStep, Reservation, ReservationLine, ReservationStore,
    ReversalOutcome, StockLedger,
};
pub use payment::{
    InMemoryPaymentStore, PaymentRecord, PaymentStatus, PaymentStep, PaymentStore,
};
pub use product_validation::{
    InMemoryValidationStore, ProductCatalog, ProductValidationStep, ValidationRecord,
    ValidationStore,
};
pub use step::{SagaStep, StepHandler};
