//! Stock ledger engine.
//!
//! One logical adjustment is two physical writes (product row, ledger entry)
//! in separate collections. The engine keeps them consistent without an
//! ambient transaction:
//!
//! 1. validate the request; every deterministic failure aborts before any
//!    write;
//! 2. read the product and compute `previous_stock -> new_stock`;
//! 3. write the product **first**, conditioned on the observed previous
//!    stock (compare-and-swap, retried on contention by re-reading);
//! 4. append the movement **second**. If that append fails the stock update
//!    is kept and the failure is surfaced distinctly: the ledger is an
//!    at-least-once audit trail, never a reason to lose an adjustment.
//!
//! Because every movement's `previous_stock` is the value the conditional
//! product write was keyed on, concurrent adjustments to one product
//! serialize into a contiguous `previous_stock -> new_stock` chain.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use stocky_catalog::Product;
use stocky_core::{DomainError, ProductId};
use stocky_ledger::{apply_movement, Movement, MovementDraft, MovementKind};

use crate::store::{CategoryStore, MovementStore, ProductStore, StoreError};

/// Bounded internal retry budget for conditional stock writes.
const DEFAULT_MAX_RETRIES: u32 = 3;
/// Per-store-call deadline.
const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(5);

/// Reason recorded for adjustments made through the direct stock path.
pub const DIRECT_ADJUSTMENT_REASON: &str = "ajuste directo";

/// Ledger operation error.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The referenced product does not exist.
    #[error("product not found")]
    NotFound,

    /// Deterministic request validation failure.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Outward movement larger than the available stock.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },

    /// Conditional writes kept losing to concurrent adjustments.
    #[error("stock contention: {0}")]
    Conflict(String),

    /// A storage call exceeded the configured deadline.
    #[error("storage call exceeded deadline")]
    Timeout,

    /// The stock update was applied but the ledger entry was not persisted.
    ///
    /// Reported distinctly from a validation failure so callers can tell
    /// "rejected" apart from "applied but not fully recorded".
    #[error("stock updated but movement not recorded: {0}")]
    MovementNotRecorded(String),

    /// Unexpected persistence failure before any state changed.
    #[error("storage failure: {0}")]
    Storage(StoreError),
}

impl From<DomainError> for LedgerError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg)
            | DomainError::InvariantViolation(msg)
            | DomainError::InvalidId(msg) => LedgerError::Validation(msg),
            DomainError::NotFound => LedgerError::NotFound,
            DomainError::InsufficientStock {
                requested,
                available,
            } => LedgerError::InsufficientStock {
                requested,
                available,
            },
            DomainError::Conflict(msg) => LedgerError::Conflict(msg),
            DomainError::Unauthorized => LedgerError::Validation("unauthorized".to_string()),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::StockConflict { expected, found } => LedgerError::Conflict(format!(
                "expected stock {expected}, found {found}"
            )),
            other => LedgerError::Storage(other),
        }
    }
}

/// Result of a direct stock adjustment: the updated product plus the ledger
/// entry that recorded it.
#[derive(Debug, Clone)]
pub struct StockAdjustment {
    pub product: Product,
    pub movement: Movement,
    pub previous_stock: u32,
    pub new_stock: u32,
}

/// The stock ledger engine.
///
/// Sole mediator of product stock mutation. Generic over the store seams so
/// tests can wire in-memory or failing backends.
pub struct StockLedger<P, M, C> {
    products: P,
    movements: M,
    categories: C,
    max_retries: u32,
    op_timeout: Duration,
}

impl<P, M, C> StockLedger<P, M, C>
where
    P: ProductStore,
    M: MovementStore,
    C: CategoryStore,
{
    pub fn new(products: P, movements: M, categories: C) -> Self {
        Self {
            products,
            movements,
            categories,
            max_retries: DEFAULT_MAX_RETRIES,
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_op_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    /// Record a stock movement and return the created ledger entry.
    pub async fn record_movement(
        &self,
        draft: MovementDraft,
        now: DateTime<Utc>,
    ) -> Result<Movement, LedgerError> {
        let (_, movement) = self.apply(draft, now).await?;
        Ok(movement)
    }

    /// Adjust a product's stock directly.
    ///
    /// Shares the validation and arithmetic core with [`record_movement`] and
    /// writes the same ledger entry; only the return shape differs.
    ///
    /// [`record_movement`]: StockLedger::record_movement
    pub async fn adjust_stock(
        &self,
        product_id: ProductId,
        kind: MovementKind,
        quantity: u32,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<StockAdjustment, LedgerError> {
        let draft = MovementDraft {
            product_id,
            kind,
            quantity,
            reason: DIRECT_ADJUSTMENT_REASON.to_string(),
            user: actor.to_string(),
            cost: None,
            notes: None,
        };
        let (product, movement) = self.apply(draft, now).await?;
        Ok(StockAdjustment {
            previous_stock: movement.previous_stock,
            new_stock: movement.new_stock,
            product,
            movement,
        })
    }

    /// Shared core: validate, CAS the product, then append the movement.
    async fn apply(
        &self,
        draft: MovementDraft,
        now: DateTime<Utc>,
    ) -> Result<(Product, Movement), LedgerError> {
        draft.validate()?;

        let mut attempt = 0u32;
        let (updated, previous_stock, new_stock) = loop {
            let product = self
                .deadline(self.products.get(draft.product_id))
                .await??
                .ok_or(LedgerError::NotFound)?;

            let previous_stock = product.stock;
            let new_stock = apply_movement(previous_stock, draft.kind, draft.quantity)?;

            let outcome = self
                .deadline(self.products.update_stock(
                    draft.product_id,
                    previous_stock,
                    new_stock,
                    now,
                ))
                .await?;
            match outcome {
                Ok(Some(updated)) => break (updated, previous_stock, new_stock),
                Ok(None) => return Err(LedgerError::NotFound),
                Err(StoreError::StockConflict { .. }) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(
                        product_id = %draft.product_id,
                        attempt,
                        "stock write lost the race, re-reading"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        };

        let category = self.resolve_category_name(&updated).await;
        let movement = draft.into_movement(
            updated.name.clone(),
            category,
            previous_stock,
            new_stock,
            now,
        );

        match tokio::time::timeout(self.op_timeout, self.movements.append(movement)).await {
            Ok(Ok(movement)) => Ok((updated, movement)),
            Ok(Err(e)) => {
                tracing::error!(
                    product_id = %updated.id,
                    error = %e,
                    "stock updated but movement append failed"
                );
                Err(LedgerError::MovementNotRecorded(e.to_string()))
            }
            Err(_) => {
                tracing::error!(
                    product_id = %updated.id,
                    "stock updated but movement append timed out"
                );
                Err(LedgerError::MovementNotRecorded(
                    "storage call exceeded deadline".to_string(),
                ))
            }
        }
    }

    /// Resolve the category reference to a display name for the snapshot.
    ///
    /// Falls back to the raw reference on any failure; resolution never
    /// blocks the write.
    async fn resolve_category_name(&self, product: &Product) -> String {
        match tokio::time::timeout(self.op_timeout, self.categories.get(product.category_id)).await
        {
            Ok(Ok(Some(category))) => category.name,
            Ok(Ok(None)) => {
                tracing::warn!(
                    category_id = %product.category_id,
                    "category reference did not resolve, snapshotting raw id"
                );
                product.category_id.to_string()
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    category_id = %product.category_id,
                    error = %e,
                    "category lookup failed, snapshotting raw id"
                );
                product.category_id.to_string()
            }
            Err(_) => {
                tracing::warn!(
                    category_id = %product.category_id,
                    "category lookup timed out, snapshotting raw id"
                );
                product.category_id.to_string()
            }
        }
    }

    /// Wrap a store call in the per-operation deadline.
    async fn deadline<T>(
        &self,
        fut: impl core::future::Future<Output = Result<T, StoreError>>,
    ) -> Result<Result<T, StoreError>, LedgerError> {
        tokio::time::timeout(self.op_timeout, fut)
            .await
            .map_err(|_| LedgerError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use stocky_catalog::{Category, NewCategory, NewProduct, ProductStatus};
    use stocky_core::CategoryId;

    use crate::store::{
        InMemoryCategoryStore, InMemoryMovementStore, InMemoryProductStore, MovementFilter,
    };

    use super::*;

    type TestLedger = StockLedger<
        Arc<InMemoryProductStore>,
        Arc<InMemoryMovementStore>,
        Arc<InMemoryCategoryStore>,
    >;

    struct Fixture {
        engine: TestLedger,
        products: Arc<InMemoryProductStore>,
        movements: Arc<InMemoryMovementStore>,
        product: Product,
        category: Category,
    }

    async fn fixture(stock: u32, min_stock: u32) -> Fixture {
        let products = Arc::new(InMemoryProductStore::new());
        let movements = Arc::new(InMemoryMovementStore::new());
        let categories = Arc::new(InMemoryCategoryStore::new());

        let category = categories
            .insert(
                Category::create(
                    NewCategory {
                        name: "Bebidas".to_string(),
                        description: None,
                        color: None,
                    },
                    Utc::now(),
                )
                .unwrap(),
            )
            .await
            .unwrap();

        let product = products
            .insert(
                Product::create(
                    NewProduct {
                        name: "Cola 1L".to_string(),
                        category_id: category.id,
                        price: 250,
                        stock,
                        min_stock,
                        max_stock: 1_000,
                        supplier_id: None,
                        sku: "COLA-1L".to_string(),
                        description: None,
                    },
                    Utc::now(),
                )
                .unwrap(),
            )
            .await
            .unwrap();

        let engine = StockLedger::new(products.clone(), movements.clone(), categories.clone());
        Fixture {
            engine,
            products,
            movements,
            product,
            category,
        }
    }

    fn draft(fx: &Fixture, kind: MovementKind, quantity: u32) -> MovementDraft {
        MovementDraft {
            product_id: fx.product.id,
            kind,
            quantity,
            reason: "conteo".to_string(),
            user: "ana".to_string(),
            cost: Some(250),
            notes: None,
        }
    }

    #[tokio::test]
    async fn entrada_increases_stock_and_records_movement() {
        let fx = fixture(20, 5).await;
        let movement = fx
            .engine
            .record_movement(draft(&fx, MovementKind::Entrada, 5), Utc::now())
            .await
            .unwrap();

        assert_eq!(movement.previous_stock, 20);
        assert_eq!(movement.new_stock, 25);
        assert_eq!(movement.product_name, "Cola 1L");
        assert_eq!(movement.category, "Bebidas");

        let product = fx.products.get(fx.product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 25);
        assert_eq!(product.status, ProductStatus::Active);
    }

    #[tokio::test]
    async fn salida_keeps_active_above_threshold() {
        // Product{stock:20,minStock:5}, salida 5 -> 15, still active.
        let fx = fixture(20, 5).await;
        let movement = fx
            .engine
            .record_movement(draft(&fx, MovementKind::Salida, 5), Utc::now())
            .await
            .unwrap();

        assert_eq!(movement.kind, MovementKind::Salida);
        assert_eq!(movement.previous_stock, 20);
        assert_eq!(movement.new_stock, 15);

        let product = fx.products.get(fx.product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 15);
        assert_eq!(product.status, ProductStatus::Active);
    }

    #[tokio::test]
    async fn salida_crossing_threshold_flags_low_stock() {
        // Product{stock:6,minStock:5}, salida 2 -> 4, low-stock.
        let fx = fixture(6, 5).await;
        fx.engine
            .record_movement(draft(&fx, MovementKind::Salida, 2), Utc::now())
            .await
            .unwrap();

        let product = fx.products.get(fx.product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 4);
        assert_eq!(product.status, ProductStatus::LowStock);
    }

    #[tokio::test]
    async fn insufficient_stock_rejects_without_side_effects_twice() {
        let fx = fixture(3, 1).await;

        for _ in 0..2 {
            let err = fx
                .engine
                .record_movement(draft(&fx, MovementKind::Salida, 4), Utc::now())
                .await
                .unwrap_err();
            match err {
                LedgerError::InsufficientStock {
                    requested,
                    available,
                } => {
                    assert_eq!(requested, 4);
                    assert_eq!(available, 3);
                }
                other => panic!("expected InsufficientStock, got {other:?}"),
            }
        }

        let product = fx.products.get(fx.product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 3);
        let recorded = fx.movements.list(&MovementFilter::default()).await.unwrap();
        assert!(recorded.is_empty());
    }

    #[tokio::test]
    async fn invalid_quantity_rejected_before_any_write() {
        let fx = fixture(10, 1).await;
        let err = fx
            .engine
            .record_movement(draft(&fx, MovementKind::Entrada, 0), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let product = fx.products.get(fx.product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 10);
        assert!(fx
            .movements
            .list(&MovementFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let fx = fixture(10, 1).await;
        let mut d = draft(&fx, MovementKind::Entrada, 1);
        d.product_id = ProductId::new();
        let err = fx.engine.record_movement(d, Utc::now()).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound));
    }

    #[tokio::test]
    async fn unresolvable_category_snapshots_raw_reference() {
        let fx = fixture(10, 1).await;

        // Repoint the product at a category that does not exist.
        let missing = CategoryId::new();
        let mut product = fx.product.clone();
        product.category_id = missing;
        fx.products.replace(product).await.unwrap().unwrap();

        let movement = fx
            .engine
            .record_movement(draft(&fx, MovementKind::Entrada, 1), Utc::now())
            .await
            .unwrap();
        assert_eq!(movement.category, missing.to_string());
        assert_ne!(movement.category, fx.category.name);
    }

    #[tokio::test]
    async fn adjust_stock_writes_the_same_ledger_entry() {
        let fx = fixture(20, 5).await;
        let adjustment = fx
            .engine
            .adjust_stock(fx.product.id, MovementKind::Salida, 5, "ana", Utc::now())
            .await
            .unwrap();

        assert_eq!(adjustment.previous_stock, 20);
        assert_eq!(adjustment.new_stock, 15);
        assert_eq!(adjustment.product.stock, 15);
        assert_eq!(adjustment.movement.reason, DIRECT_ADJUSTMENT_REASON);

        let recorded = fx.movements.list(&MovementFilter::default()).await.unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].id, adjustment.movement.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_entradas_form_a_contiguous_chain() {
        let fx = fixture(0, 0).await;
        let engine = Arc::new(
            StockLedger::new(
                fx.products.clone(),
                fx.movements.clone(),
                Arc::new(InMemoryCategoryStore::new()),
            )
            // Contention between all writers is expected here; give the CAS
            // loop room to win eventually.
            .with_max_retries(32),
        );

        const WRITERS: u32 = 16;
        let mut handles = Vec::new();
        for _ in 0..WRITERS {
            let engine = engine.clone();
            let product_id = fx.product.id;
            handles.push(tokio::spawn(async move {
                engine
                    .adjust_stock(product_id, MovementKind::Entrada, 1, "ana", Utc::now())
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let product = fx.products.get(fx.product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, WRITERS);

        let mut recorded = fx.movements.list(&MovementFilter::default()).await.unwrap();
        assert_eq!(recorded.len(), WRITERS as usize);
        recorded.sort_by_key(|m| m.previous_stock);
        for (i, movement) in recorded.iter().enumerate() {
            assert_eq!(movement.previous_stock, i as u32);
            assert_eq!(movement.new_stock, i as u32 + 1);
        }
    }

    /// Product store whose conditional write always loses.
    struct ContentiousProductStore {
        product: Product,
    }

    #[async_trait]
    impl ProductStore for ContentiousProductStore {
        async fn insert(&self, product: Product) -> Result<Product, StoreError> {
            Ok(product)
        }

        async fn get(&self, _id: ProductId) -> Result<Option<Product>, StoreError> {
            Ok(Some(self.product.clone()))
        }

        async fn list(&self) -> Result<Vec<Product>, StoreError> {
            Ok(vec![self.product.clone()])
        }

        async fn replace(&self, product: Product) -> Result<Option<Product>, StoreError> {
            Ok(Some(product))
        }

        async fn delete(&self, _id: ProductId) -> Result<Option<Product>, StoreError> {
            Ok(None)
        }

        async fn update_stock(
            &self,
            _id: ProductId,
            expected_stock: u32,
            _new_stock: u32,
            _at: DateTime<Utc>,
        ) -> Result<Option<Product>, StoreError> {
            Err(StoreError::StockConflict {
                expected: expected_stock,
                found: expected_stock + 1,
            })
        }
    }

    #[tokio::test]
    async fn exhausted_retries_surface_conflict() {
        let fx = fixture(10, 1).await;
        let engine = StockLedger::new(
            ContentiousProductStore {
                product: fx.product.clone(),
            },
            Arc::new(InMemoryMovementStore::new()),
            Arc::new(InMemoryCategoryStore::new()),
        )
        .with_max_retries(2);

        let err = engine
            .record_movement(draft(&fx, MovementKind::Entrada, 1), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));
    }

    /// Movement store that refuses every append.
    struct FailingMovementStore;

    #[async_trait]
    impl MovementStore for FailingMovementStore {
        async fn append(&self, _movement: Movement) -> Result<Movement, StoreError> {
            Err(StoreError::Backend("disk full".to_string()))
        }

        async fn get(&self, _id: stocky_core::MovementId) -> Result<Option<Movement>, StoreError> {
            Ok(None)
        }

        async fn list(&self, _filter: &MovementFilter) -> Result<Vec<Movement>, StoreError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn movement_append_failure_keeps_stock_update() {
        let fx = fixture(10, 1).await;
        let engine = StockLedger::new(
            fx.products.clone(),
            FailingMovementStore,
            Arc::new(InMemoryCategoryStore::new()),
        );

        let err = engine
            .record_movement(draft(&fx, MovementKind::Entrada, 5), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::MovementNotRecorded(_)));

        // The quantity adjustment is not lost; only the audit entry is.
        let product = fx.products.get(fx.product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 15);
    }
}
