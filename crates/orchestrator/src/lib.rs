//! Saga orchestrator.
//!
//! After every step's outcome the orchestrator decides which topic the event
//! travels to next. The [`DecisionTable`] holds the total `(source, status)
//! → topic` mapping, built once at startup and queried read-only; the
//! [`Orchestrator`] drives saga start, continuation and termination over a
//! message bus.

pub mod consumer;
pub mod decision_table;
pub mod driver;
pub mod error;

pub use decision_table::DecisionTable;
pub use driver::Orchestrator;
pub use error::RouteError;
