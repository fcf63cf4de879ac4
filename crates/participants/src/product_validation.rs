//! Product validation participant.
//!
//! First step of the pipeline: checks that every ordered product is
//! well-formed and exists in the catalog, recording one validation row per
//! (order, transaction) pair.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, TransactionId};
use model::{Event, EventSource, Order};

use crate::error::StepError;
use crate::step::SagaStep;

/// This participant's local record: one row per (order, transaction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRecord {
    pub order_id: OrderId,
    pub transaction_id: TransactionId,
    pub success: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ValidationRecord {
    fn new(order_id: OrderId, transaction_id: TransactionId, success: bool) -> Self {
        let now = Utc::now();
        Self {
            order_id,
            transaction_id,
            success,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Store for validation records.
///
/// The (order, transaction) pair is unique: `insert` is the idempotency
/// guard, and a conflict is the duplicate-delivery signal.
#[async_trait]
pub trait ValidationStore: Send + Sync {
    /// Inserts a record, failing with [`StepError::DuplicateTransaction`]
    /// when one already exists for the pair.
    async fn insert(&self, record: ValidationRecord) -> Result<(), StepError>;

    /// Looks up the record for a pair.
    async fn find(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
    ) -> Option<ValidationRecord>;

    /// Marks the record failed, inserting a failed placeholder when none
    /// exists. Returns true when a record was already present.
    async fn mark_failed(&self, order_id: OrderId, transaction_id: TransactionId) -> bool;
}

/// In-memory validation store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryValidationStore {
    records: Arc<RwLock<HashMap<(OrderId, TransactionId), ValidationRecord>>>,
}

impl InMemoryValidationStore {
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
impl ValidationStore for InMemoryValidationStore {
    async fn insert(&self, record: ValidationRecord) -> Result<(), StepError> {
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
    ) -> Option<ValidationRecord> {
        self.records
            .read()
            .unwrap()
            .get(&(order_id, transaction_id))
            .cloned()
    }

    async fn mark_failed(&self, order_id: OrderId, transaction_id: TransactionId) -> bool {
        let mut records = self.records.write().unwrap();
        match records.entry((order_id, transaction_id)) {
            std::collections::hash_map::Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                record.success = false;
                record.updated_at = Utc::now();
                true
            }
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(ValidationRecord::new(order_id, transaction_id, false));
                false
            }
        }
    }
}

/// The product catalog this participant validates against.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    codes: Arc<RwLock<HashSet<String>>>,
}

impl ProductCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog seeded with product codes.
    pub fn with_products<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: Arc::new(RwLock::new(codes.into_iter().map(Into::into).collect())),
        }
    }

    /// Adds a product code to the catalog.
    pub fn add(&self, code: impl Into<String>) {
        self.codes.write().unwrap().insert(code.into());
    }

    /// Returns true when the code exists.
    pub fn exists(&self, code: &str) -> bool {
        self.codes.read().unwrap().contains(code)
    }
}

/// The product validation saga step.
pub struct ProductValidationStep<V> {
    catalog: ProductCatalog,
    store: V,
}

impl<V> ProductValidationStep<V> {
    /// Creates the step over a catalog and a record store.
    pub fn new(catalog: ProductCatalog, store: V) -> Self {
        Self { catalog, store }
    }
}

fn validate_products_informed(order: &Order) -> Result<(), StepError> {
    if order.products.is_empty() {
        return Err(StepError::EmptyProductList);
    }
    for line in &order.products {
        if line.product.code.trim().is_empty() {
            return Err(StepError::ProductNotInformed);
        }
    }
    Ok(())
}

#[async_trait]
impl<V: ValidationStore> SagaStep for ProductValidationStep<V> {
    fn source(&self) -> EventSource {
        EventSource::ProductValidation
    }

    fn description(&self) -> &'static str {
        "validate products"
    }

    async fn execute(&self, event: &mut Event) -> Result<String, StepError> {
        validate_products_informed(&event.payload)?;

        for line in &event.payload.products {
            if !self.catalog.exists(&line.product.code) {
                return Err(StepError::UnknownProduct {
                    code: line.product.code.clone(),
                });
            }
        }

        // The insert is the sole duplicate-delivery defense: a second event
        // for the same (order, transaction) conflicts here.
        self.store
            .insert(ValidationRecord::new(
                event.order_id,
                event.transaction_id,
                true,
            ))
            .await?;

        Ok("Products are validated with success".to_string())
    }

    async fn compensate(&self, event: &mut Event) -> String {
        let existed = self
            .store
            .mark_failed(event.order_id, event.transaction_id)
            .await;

        if existed {
            "Rollback executed for product validation".to_string()
        } else {
            "Rollback recorded for product validation with no previous attempt".to_string()
        }
    }
}
