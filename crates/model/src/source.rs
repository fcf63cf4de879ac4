//! Identifies which component last touched an event.

use serde::{Deserialize, Serialize};

use crate::topic::Topic;

/// The component that last wrote an event's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventSource {
    /// The saga orchestrator itself.
    #[serde(rename = "ORCHESTRATOR")]
    Orchestrator,

    /// The product validation participant.
    #[serde(rename = "PRODUCT_VALIDATION_SERVICE")]
    ProductValidation,

    /// The payment participant.
    #[serde(rename = "PAYMENT_SERVICE")]
    Payment,

    /// The inventory participant.
    #[serde(rename = "INVENTORY_SERVICE")]
    Inventory,
}

impl EventSource {
    /// The fixed pipeline order of the participants.
    pub const PIPELINE: [EventSource; 3] = [
        EventSource::ProductValidation,
        EventSource::Payment,
        EventSource::Inventory,
    ];

    /// Returns the source name as serialized on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Orchestrator => "ORCHESTRATOR",
            EventSource::ProductValidation => "PRODUCT_VALIDATION_SERVICE",
            EventSource::Payment => "PAYMENT_SERVICE",
            EventSource::Inventory => "INVENTORY_SERVICE",
        }
    }

    /// The topic this participant consumes forward-step events from.
    ///
    /// Only participants have topics; the orchestrator has none.
    pub fn forward_topic(&self) -> Option<Topic> {
        match self {
            EventSource::Orchestrator => None,
            EventSource::ProductValidation => Some(Topic::ProductValidationSuccess),
            EventSource::Payment => Some(Topic::PaymentSuccess),
            EventSource::Inventory => Some(Topic::InventorySuccess),
        }
    }

    /// The topic this participant consumes compensation-step events from.
    pub fn compensation_topic(&self) -> Option<Topic> {
        match self {
            EventSource::Orchestrator => None,
            EventSource::ProductValidation => Some(Topic::ProductValidationFail),
            EventSource::Payment => Some(Topic::PaymentFail),
            EventSource::Inventory => Some(Topic::InventoryFail),
        }
    }
}

impl std::fmt::Display for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
