//! Inventory participant.
//!
//! Last step of the pipeline: reserves stock for every order line.
//! Compensation returns the reserved quantities to the ledger.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, TransactionId};
use model::{Event, EventSource};

use crate::error::StepError;
use crate::step::SagaStep;

/// A reserved quantity of one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationLine {
    pub code: String,
    pub quantity: u32,
}

/// This participant's local record: one reservation per (order, transaction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub order_id: OrderId,
    pub transaction_id: TransactionId,
    pub lines: Vec<ReservationLine>,
    pub reversed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    fn new(
        order_id: OrderId,
        transaction_id: TransactionId,
        lines: Vec<ReservationLine>,
        reversed: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            order_id,
            transaction_id,
            lines,
            reversed,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outcome of reversing a reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReversalOutcome {
    /// A live reservation was reversed; these lines must be restocked.
    Reversed(Vec<ReservationLine>),
    /// The reservation was already reversed; nothing to restock.
    AlreadyReversed,
    /// No reservation existed; a reversed placeholder was recorded.
    NoReservation,
}

/// Store for reservations, unique per (order, transaction).
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Inserts a reservation, failing with
    /// [`StepError::DuplicateTransaction`] when one already exists.
    async fn insert(&self, reservation: Reservation) -> Result<(), StepError>;

    /// Looks up the reservation for a pair.
    async fn find(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
    ) -> Option<Reservation>;

    /// Reverses the reservation for a pair.
    ///
    /// Reversal is recorded exactly once: a second call reports
    /// [`ReversalOutcome::AlreadyReversed`] so the caller never restocks the
    /// same lines twice under at-least-once delivery.
    async fn reverse(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
    ) -> ReversalOutcome;
}

/// In-memory reservation store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReservationStore {
    records: Arc<RwLock<HashMap<(OrderId, TransactionId), Reservation>>>,
}

impl InMemoryReservationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored reservations.
    pub fn record_count(&self) -> usize {
        self.records.read().unwrap().len()
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn insert(&self, reservation: Reservation) -> Result<(), StepError> {
        let mut records = self.records.write().unwrap();
        let key = (reservation.order_id, reservation.transaction_id);
        if records.contains_key(&key) {
            return Err(StepError::DuplicateTransaction);
        }
        records.insert(key, reservation);
        Ok(())
    }

    async fn find(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
    ) -> Option<Reservation> {
        self.records
            .read()
            .unwrap()
            .get(&(order_id, transaction_id))
            .cloned()
    }

    async fn reverse(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
    ) -> ReversalOutcome {
        let mut records = self.records.write().unwrap();
        match records.get_mut(&(order_id, transaction_id)) {
            Some(reservation) if reservation.reversed => ReversalOutcome::AlreadyReversed,
            Some(reservation) => {
                reservation.reversed = true;
                reservation.updated_at = Utc::now();
                ReversalOutcome::Reversed(reservation.lines.clone())
            }
            None => {
                records.insert(
                    (order_id, transaction_id),
                    Reservation::new(order_id, transaction_id, Vec::new(), true),
                );
                ReversalOutcome::NoReservation
            }
        }
    }
}

/// Available stock per product code.
#[derive(Debug, Clone, Default)]
pub struct StockLedger {
    levels: Arc<RwLock<HashMap<String, u32>>>,
}

impl StockLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger seeded with (code, quantity) pairs.
    pub fn with_stock<I, S>(stock: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        Self {
            levels: Arc::new(RwLock::new(
                stock.into_iter().map(|(code, qty)| (code.into(), qty)).collect(),
            )),
        }
    }

    /// Returns the available quantity for a code.
    pub fn available(&self, code: &str) -> u32 {
        self.levels.read().unwrap().get(code).copied().unwrap_or(0)
    }

    /// Takes all requested quantities under one lock, or none of them.
    ///
    /// A code can repeat across lines, so availability is judged on the
    /// combined total per code.
    fn take(&self, lines: &[ReservationLine]) -> Result<(), StepError> {
        let mut levels = self.levels.write().unwrap();

        let mut requested: HashMap<&str, u32> = HashMap::new();
        for line in lines {
            *requested.entry(line.code.as_str()).or_insert(0) += line.quantity;
        }

        for (code, quantity) in &requested {
            let available = levels.get(*code).copied().unwrap_or(0);
            if available < *quantity {
                return Err(StepError::InsufficientStock {
                    code: (*code).to_string(),
                    requested: *quantity,
                    available,
                });
            }
        }
        for (code, quantity) in requested {
            if let Some(level) = levels.get_mut(code) {
                *level -= quantity;
            }
        }
        Ok(())
    }

    /// Returns quantities to the ledger.
    fn restore(&self, lines: &[ReservationLine]) {
        let mut levels = self.levels.write().unwrap();
        for line in lines {
            *levels.entry(line.code.clone()).or_insert(0) += line.quantity;
        }
    }
}

/// The inventory saga step.
pub struct InventoryStep<R> {
    ledger: StockLedger,
    store: R,
}

impl<R> InventoryStep<R> {
    /// Creates the step over a stock ledger and a reservation store.
    pub fn new(ledger: StockLedger, store: R) -> Self {
        Self { ledger, store }
    }
}

#[async_trait]
impl<R: ReservationStore> SagaStep for InventoryStep<R> {
    fn source(&self) -> EventSource {
        EventSource::Inventory
    }

    fn description(&self) -> &'static str {
        "update inventory"
    }

    async fn execute(&self, event: &mut Event) -> Result<String, StepError> {
        if event.payload.products.is_empty() {
            return Err(StepError::EmptyProductList);
        }

        let lines: Vec<ReservationLine> = event
            .payload
            .products
            .iter()
            .map(|line| ReservationLine {
                code: line.product.code.clone(),
                quantity: line.quantity,
            })
            .collect();

        self.ledger.take(&lines)?;

        let reservation = Reservation::new(
            event.order_id,
            event.transaction_id,
            lines.clone(),
            false,
        );
        if let Err(error) = self.store.insert(reservation).await {
            // Duplicate delivery detected after the stock was taken: put the
            // quantities back before reporting the conflict.
            self.ledger.restore(&lines);
            return Err(error);
        }

        Ok("Inventory updated with success".to_string())
    }

    async fn compensate(&self, event: &mut Event) -> String {
        match self
            .store
            .reverse(event.order_id, event.transaction_id)
            .await
        {
            ReversalOutcome::Reversed(lines) => {
                self.ledger.restore(&lines);
                "Rollback executed for inventory".to_string()
            }
            ReversalOutcome::AlreadyReversed => {
                "Rollback already executed for inventory".to_string()
            }
            ReversalOutcome::NoReservation => {
                "Rollback recorded for inventory with no previous reservation".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{Money, Order, OrderLine, Product};

    fn step() -> InventoryStep<InMemoryReservationStore> {
        InventoryStep::new(
            StockLedger::with_stock([("WIDGET", 10), ("GADGET", 2)]),
            InMemoryReservationStore::new(),
        )
    }

    fn event_for(lines: &[(&str, u32)]) -> Event {
        let products = lines
            .iter()
            .map(|(code, quantity)| {
                OrderLine::new(Product::new(*code, Money::from_cents(100)), *quantity)
            })
            .collect();
        Event::for_order(Order::new(products))
    }

    #[tokio::test]
    async fn test_reservation_decrements_stock() {
        let step = step();
        let mut event = event_for(&[("WIDGET", 3)]);

        step.execute(&mut event).await.unwrap();
        assert_eq!(step.ledger.available("WIDGET"), 7);

        let reservation = step
            .store
            .find(event.order_id, event.transaction_id)
            .await
            .unwrap();
        assert!(!reservation.reversed);
    }

    #[tokio::test]
    async fn test_insufficient_stock_takes_nothing() {
        let step = step();
        let mut event = event_for(&[("WIDGET", 1), ("GADGET", 5)]);

        let error = step.execute(&mut event).await.unwrap_err();
        assert_eq!(
            error,
            StepError::InsufficientStock {
                code: "GADGET".to_string(),
                requested: 5,
                available: 2,
            }
        );
        // The all-or-nothing take left both levels untouched.
        assert_eq!(step.ledger.available("WIDGET"), 10);
        assert_eq!(step.ledger.available("GADGET"), 2);
    }

    #[tokio::test]
    async fn test_repeated_code_is_judged_on_combined_total() {
        let step = step();
        // 6 + 6 WIDGET against a stock of 10: each line alone fits, the
        // combined total does not.
        let mut event = event_for(&[("WIDGET", 6), ("WIDGET", 6)]);

        let error = step.execute(&mut event).await.unwrap_err();
        assert_eq!(
            error,
            StepError::InsufficientStock {
                code: "WIDGET".to_string(),
                requested: 12,
                available: 10,
            }
        );
        assert_eq!(step.ledger.available("WIDGET"), 10);
        assert_eq!(step.store.record_count(), 0);
    }

    #[tokio::test]
    async fn test_repeated_code_within_stock_reserves_all_lines() {
        let step = step();
        let mut event = event_for(&[("GADGET", 1), ("GADGET", 1)]);

        step.execute(&mut event).await.unwrap();
        assert_eq!(step.ledger.available("GADGET"), 0);

        step.compensate(&mut event).await;
        assert_eq!(step.ledger.available("GADGET"), 2);
    }

    #[tokio::test]
    async fn test_duplicate_delivery_restores_stock() {
        let step = step();
        let mut event = event_for(&[("WIDGET", 4)]);

        step.execute(&mut event).await.unwrap();
        let mut duplicate = event.clone();
        assert_eq!(
            step.execute(&mut duplicate).await.unwrap_err(),
            StepError::DuplicateTransaction
        );
        assert_eq!(step.ledger.available("WIDGET"), 6);
        assert_eq!(step.store.record_count(), 1);
    }

    #[tokio::test]
    async fn test_compensation_restocks_once() {
        let step = step();
        let mut event = event_for(&[("WIDGET", 4)]);
        step.execute(&mut event).await.unwrap();

        let message = step.compensate(&mut event).await;
        assert_eq!(message, "Rollback executed for inventory");
        assert_eq!(step.ledger.available("WIDGET"), 10);

        // A redelivered compensation must not restock again.
        let message = step.compensate(&mut event).await;
        assert_eq!(message, "Rollback already executed for inventory");
        assert_eq!(step.ledger.available("WIDGET"), 10);
    }

    #[tokio::test]
    async fn test_compensation_without_reservation_creates_placeholder() {
        let step = step();
        let mut event = event_for(&[("WIDGET", 4)]);

        let message = step.compensate(&mut event).await;
        assert_eq!(
            message,
            "Rollback recorded for inventory with no previous reservation"
        );

        let reservation = step
            .store
            .find(event.order_id, event.transaction_id)
            .await
            .unwrap();
        assert!(reservation.reversed);
        assert!(reservation.lines.is_empty());
    }
}
