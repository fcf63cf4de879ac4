//! The business payload carried inside every saga event.

use chrono::{DateTime, Utc};
use common::{OrderId, TransactionId};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// A product reference with its unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog code for the product.
    pub code: String,
    /// Price per unit.
    pub unit_value: Money,
}

impl Product {
    /// Creates a product reference.
    pub fn new(code: impl Into<String>, unit_value: Money) -> Self {
        Self {
            code: code.into(),
            unit_value,
        }
    }
}

/// One line of an order: a product and a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// The ordered product.
    pub product: Product,
    /// How many units were ordered.
    pub quantity: u32,
}

impl OrderLine {
    /// Creates an order line.
    pub fn new(product: Product, quantity: u32) -> Self {
        Self { product, quantity }
    }

    /// The line total: quantity times unit price.
    pub fn amount(&self) -> Money {
        self.product.unit_value.times(self.quantity)
    }
}

/// The order being fulfilled by a saga.
///
/// Owned by the order-creation collaborator; downstream participants enrich
/// it in place (payment writes the computed totals).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// The order's own identifier, distinct from the saga correlation key.
    pub id: OrderId,
    /// The saga correlation key assigned at creation.
    pub transaction_id: TransactionId,
    /// Ordered products.
    pub products: Vec<OrderLine>,
    /// Total unit count, computed by the payment participant.
    pub total_items: u32,
    /// Total amount, computed by the payment participant.
    pub total_amount: Money,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new order with fresh identifiers and zeroed totals.
    pub fn new(products: Vec<OrderLine>) -> Self {
        Self {
            id: OrderId::new(),
            transaction_id: TransactionId::new(),
            products,
            total_items: 0,
            total_amount: Money::zero(),
            created_at: Utc::now(),
        }
    }
}
