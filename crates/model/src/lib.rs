//! Shared data model for the order saga.
//!
//! Every topic in the system carries the same message shape: an [`Event`]
//! holding the order payload, the `(source, status)` pair written by
//! whichever component last acted, and an append-only [`History`] log.
//! Participants and the orchestrator depend on this crate and on the
//! transport, never on each other.

pub mod codec;
pub mod event;
pub mod money;
pub mod order;
pub mod source;
pub mod status;
pub mod topic;

pub use common::{EventId, OrderId, TransactionId};
pub use event::{Event, History};
pub use money::Money;
pub use order::{Order, OrderLine, Product};
pub use source::EventSource;
pub use status::SagaStatus;
pub use topic::Topic;
