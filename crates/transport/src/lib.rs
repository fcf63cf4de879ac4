//! Transport adapter for the order saga.
//!
//! Participants and the orchestrator never call each other directly: every
//! hop is a message published to a named topic through a [`MessageBus`].
//! Delivery is at-least-once per the underlying broker; ordering holds only
//! within one topic partition. Publishing is fire-and-forget — failures are
//! logged and counted, never surfaced to the caller.

pub mod bus;
pub mod memory;

pub use bus::{MessageBus, MessageStream};
pub use memory::InMemoryBroker;
