//! Payment participant.
//!
//! Second step of the pipeline: computes the order totals, writes them into
//! the event payload, charges the amount, and enforces the minimum-amount
//! business rule. Compensation refunds the charge.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, TransactionId};
use model::{Event, EventSource, Money, Order};

use crate::error::StepError;
use crate::step::SagaStep;

/// The smallest amount this service will charge.
pub const MINIMUM_AMOUNT: Money = Money::from_cents(10);

/// State of one payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    /// Charge recorded but not yet confirmed.
    Pending,
    /// Charge confirmed.
    Success,
    /// Charge reversed by compensation.
    Refunded,
}

/// This participant's local record: one row per (order, transaction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRecord {
    pub order_id: OrderId,
    pub transaction_id: TransactionId,
    pub total_items: u32,
    pub total_amount: Money,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRecord {
    fn new(
        order_id: OrderId,
        transaction_id: TransactionId,
        total_items: u32,
        total_amount: Money,
        status: PaymentStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            order_id,
            transaction_id,
            total_items,
            total_amount,
            status,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Store for payment records, unique per (order, transaction).
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts a record, failing with [`StepError::DuplicateTransaction`]
    /// when one already exists for the pair.
    async fn insert(&self, record: PaymentRecord) -> Result<(), StepError>;

    /// Looks up the record for a pair.
    async fn find(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
    ) -> Option<PaymentRecord>;

    /// Confirms a pending charge. Returns false when no record exists.
    async fn mark_succeeded(&self, order_id: OrderId, transaction_id: TransactionId) -> bool;

    /// Refunds the charge for a pair.
    ///
    /// When a record exists it is set to [`PaymentStatus::Refunded`] and the
    /// updated record is returned; otherwise the given placeholder is
    /// inserted as refunded and `None` is returned.
    async fn mark_refunded(&self, placeholder: PaymentRecord) -> Option<PaymentRecord>;
}

/// In-memory payment store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentStore {
    records: Arc<RwLock<HashMap<(OrderId, TransactionId), PaymentRecord>>>,
}

impl InMemoryPaymentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    pub fn record_count(&self) -> usize {
        self.records.read().unwrap().len()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, record: PaymentRecord) -> Result<(), StepError> {
        let mut records = self.records.write().unwrap();
        let key = (record.order_id, record.transaction_id);
        if records.contains_key(&key) {
            return Err(StepError::DuplicateTransaction);
        }
        records.insert(key, record);
        Ok(())
    }

    async fn find(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
    ) -> Option<PaymentRecord> {
        self.records
            .read()
            .unwrap()
            .get(&(order_id, transaction_id))
            .cloned()
    }

    async fn mark_succeeded(&self, order_id: OrderId, transaction_id: TransactionId) -> bool {
        let mut records = self.records.write().unwrap();
        match records.get_mut(&(order_id, transaction_id)) {
            Some(record) => {
                record.status = PaymentStatus::Success;
                record.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    async fn mark_refunded(&self, placeholder: PaymentRecord) -> Option<PaymentRecord> {
        let mut records = self.records.write().unwrap();
        let key = (placeholder.order_id, placeholder.transaction_id);
        match records.get_mut(&key) {
            Some(record) => {
                record.status = PaymentStatus::Refunded;
                record.updated_at = Utc::now();
                Some(record.clone())
            }
            None => {
                let mut record = placeholder;
                record.status = PaymentStatus::Refunded;
                records.insert(key, record);
                None
            }
        }
    }
}

/// The payment saga step.
pub struct PaymentStep<P> {
    store: P,
}

impl<P> PaymentStep<P> {
    /// Creates the step over a record store.
    pub fn new(store: P) -> Self {
        Self { store }
    }
}

fn calculate_total_amount(order: &Order) -> Money {
    order.products.iter().map(|line| line.amount()).sum()
}

fn calculate_total_items(order: &Order) -> u32 {
    order.products.iter().map(|line| line.quantity).sum()
}

#[async_trait]
impl<P: PaymentStore> SagaStep for PaymentStep<P> {
    fn source(&self) -> EventSource {
        EventSource::Payment
    }

    fn description(&self) -> &'static str {
        "realize payment"
    }

    async fn execute(&self, event: &mut Event) -> Result<String, StepError> {
        if event.payload.products.is_empty() {
            return Err(StepError::EmptyProductList);
        }

        let total_amount = calculate_total_amount(&event.payload);
        let total_items = calculate_total_items(&event.payload);

        // The pending record doubles as the duplicate guard.
        self.store
            .insert(PaymentRecord::new(
                event.order_id,
                event.transaction_id,
                total_items,
                total_amount,
                PaymentStatus::Pending,
            ))
            .await?;

        event.payload.total_amount = total_amount;
        event.payload.total_items = total_items;

        if total_amount < MINIMUM_AMOUNT {
            return Err(StepError::AmountBelowMinimum {
                amount: total_amount,
                minimum: MINIMUM_AMOUNT,
            });
        }

        self.store
            .mark_succeeded(event.order_id, event.transaction_id)
            .await;

        Ok("Payment realized with success".to_string())
    }

    async fn compensate(&self, event: &mut Event) -> String {
        let placeholder = PaymentRecord::new(
            event.order_id,
            event.transaction_id,
            calculate_total_items(&event.payload),
            calculate_total_amount(&event.payload),
            PaymentStatus::Refunded,
        );

        match self.store.mark_refunded(placeholder).await {
            Some(record) => {
                event.payload.total_amount = record.total_amount;
                event.payload.total_items = record.total_items;
                "Rollback executed for payment".to_string()
            }
            None => "Rollback recorded for payment with no previous charge".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{OrderLine, Product};

    fn step() -> PaymentStep<InMemoryPaymentStore> {
        PaymentStep::new(InMemoryPaymentStore::new())
    }

    fn event_with_lines(lines: Vec<(i64, u32)>) -> Event {
        let products = lines
            .into_iter()
            .map(|(unit_cents, quantity)| {
                OrderLine::new(
                    Product::new("WIDGET", Money::from_cents(unit_cents)),
                    quantity,
                )
            })
            .collect();
        Event::for_order(Order::new(products))
    }

    #[tokio::test]
    async fn test_payment_computes_totals_into_payload() {
        let step = step();
        let mut event = event_with_lines(vec![(1000, 2), (2500, 1)]);

        let message = step.execute(&mut event).await.unwrap();
        assert_eq!(message, "Payment realized with success");
        assert_eq!(event.payload.total_amount, Money::from_cents(4500));
        assert_eq!(event.payload.total_items, 3);

        let record = step
            .store
            .find(event.order_id, event.transaction_id)
            .await
            .unwrap();
        assert_eq!(record.status, PaymentStatus::Success);
        assert_eq!(record.total_amount, Money::from_cents(4500));
    }

    #[tokio::test]
    async fn test_amount_below_minimum_is_rejected_not_clamped() {
        let step = step();
        // 0.05 against a 0.10 minimum.
        let mut event = event_with_lines(vec![(5, 1)]);

        let error = step.execute(&mut event).await.unwrap_err();
        assert_eq!(
            error,
            StepError::AmountBelowMinimum {
                amount: Money::from_cents(5),
                minimum: MINIMUM_AMOUNT,
            }
        );

        // The pending record remains as the compensation target.
        let record = step
            .store
            .find(event.order_id, event.transaction_id)
            .await
            .unwrap();
        assert_eq!(record.status, PaymentStatus::Pending);
        // Totals are still written back for the history trail.
        assert_eq!(event.payload.total_amount, Money::from_cents(5));
    }

    #[tokio::test]
    async fn test_duplicate_delivery_conflicts() {
        let step = step();
        let mut event = event_with_lines(vec![(1000, 1)]);

        step.execute(&mut event).await.unwrap();
        let mut duplicate = event.clone();
        assert_eq!(
            step.execute(&mut duplicate).await.unwrap_err(),
            StepError::DuplicateTransaction
        );
        assert_eq!(step.store.record_count(), 1);
    }

    #[tokio::test]
    async fn test_compensation_refunds_existing_charge() {
        let step = step();
        let mut event = event_with_lines(vec![(1000, 2)]);
        step.execute(&mut event).await.unwrap();

        let message = step.compensate(&mut event).await;
        assert_eq!(message, "Rollback executed for payment");

        let record = step
            .store
            .find(event.order_id, event.transaction_id)
            .await
            .unwrap();
        assert_eq!(record.status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn test_compensation_without_charge_creates_refunded_placeholder() {
        let step = step();
        let mut event = event_with_lines(vec![(1000, 2)]);

        let message = step.compensate(&mut event).await;
        assert_eq!(message, "Rollback recorded for payment with no previous charge");

        let record = step
            .store
            .find(event.order_id, event.transaction_id)
            .await
            .unwrap();
        assert_eq!(record.status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn test_minimum_boundary_is_accepted() {
        let step = step();
        let mut event = event_with_lines(vec![(10, 1)]);
        assert!(step.execute(&mut event).await.is_ok());
    }
}
