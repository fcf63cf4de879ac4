//! Named topics connecting the orchestrator and the participants.

use serde::{Deserialize, Serialize};

/// Every topic in the saga pipeline.
///
/// Forward-step events flow through the participants' success topics;
/// compensation-step events through their fail topics. The orchestrator
/// consumes `StartSaga`, `Orchestrator`, `FinishSuccess` and `FinishFail`;
/// the order record collaborator consumes `NotifyEnding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    /// Saga origination events from the order service.
    StartSaga,
    /// The orchestrator's inbound topic for participant outcomes.
    Orchestrator,
    /// Forward step for product validation.
    ProductValidationSuccess,
    /// Compensation step for product validation.
    ProductValidationFail,
    /// Forward step for payment.
    PaymentSuccess,
    /// Compensation step for payment.
    PaymentFail,
    /// Forward step for inventory.
    InventorySuccess,
    /// Compensation step for inventory.
    InventoryFail,
    /// Terminal success route back into the orchestrator.
    FinishSuccess,
    /// Terminal failure route back into the orchestrator.
    FinishFail,
    /// Ending notification consumed by the order record collaborator.
    NotifyEnding,
}

impl Topic {
    /// All topics, in pipeline order.
    pub const ALL: [Topic; 11] = [
        Topic::StartSaga,
        Topic::Orchestrator,
        Topic::ProductValidationSuccess,
        Topic::ProductValidationFail,
        Topic::PaymentSuccess,
        Topic::PaymentFail,
        Topic::InventorySuccess,
        Topic::InventoryFail,
        Topic::FinishSuccess,
        Topic::FinishFail,
        Topic::NotifyEnding,
    ];

    /// Returns the wire name of the topic.
    pub fn name(&self) -> &'static str {
        match self {
            Topic::StartSaga => "start-saga",
            Topic::Orchestrator => "orchestrator",
            Topic::ProductValidationSuccess => "product-validation-success",
            Topic::ProductValidationFail => "product-validation-fail",
            Topic::PaymentSuccess => "payment-success",
            Topic::PaymentFail => "payment-fail",
            Topic::InventorySuccess => "inventory-success",
            Topic::InventoryFail => "inventory-fail",
            Topic::FinishSuccess => "finish-success",
            Topic::FinishFail => "finish-fail",
            Topic::NotifyEnding => "notify-ending",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
