//! Document-store abstraction.
//!
//! One trait per collection, async so callers can await real storage I/O and
//! the ledger engine can put a deadline on every call. The in-memory
//! implementations in [`in_memory`] are the default backend; a document
//! database plugs in behind the same traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stocky_auth::UserAccount;
use stocky_catalog::{Category, Product, Supplier};
use stocky_core::{CategoryId, MovementId, ProductId, SupplierId, TaskId, UserId};
use stocky_ledger::{Movement, MovementKind};
use stocky_tasks::Task;

pub mod in_memory;

pub use in_memory::{
    InMemoryCategoryStore, InMemoryMovementStore, InMemoryProductStore, InMemorySupplierStore,
    InMemoryTaskStore, InMemoryUserStore,
};

/// Storage operation error.
///
/// Infrastructure failures only; domain validation never reaches this layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique-key violation (SKU, category name, username/email).
    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// Conditional stock write lost the race: the stored value moved on.
    #[error("stale stock write: expected {expected}, found {found}")]
    StockConflict { expected: u32, found: u32 },

    /// Unexpected persistence failure.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Pagination parameters for listings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number.
    pub page: u32,
    /// Maximum number of records per page.
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl Pagination {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(10).clamp(1, 1000),
        }
    }

    pub fn offset(&self) -> usize {
        ((self.page - 1) as usize) * self.limit as usize
    }

    /// Total page count for `total` records.
    pub fn pages(&self, total: usize) -> u32 {
        (total as u32).div_ceil(self.limit)
    }

    /// Apply this window to an already-sorted vector.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(self.offset())
            .take(self.limit as usize)
            .cloned()
            .collect()
    }
}

/// Filter for movement listings. All criteria are conjunctive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementFilter {
    pub kind: Option<MovementKind>,
    pub category: Option<String>,
    pub product_id: Option<ProductId>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl MovementFilter {
    pub fn matches(&self, movement: &Movement) -> bool {
        if let Some(kind) = self.kind {
            if movement.kind != kind {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &movement.category != category {
                return false;
            }
        }
        if let Some(product_id) = self.product_id {
            if movement.product_id != product_id {
                return false;
            }
        }
        if let Some(from) = self.from {
            if movement.created_at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if movement.created_at > to {
                return false;
            }
        }
        true
    }
}

/// Product collection.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert a new product; fails with `Duplicate` when the SKU is taken.
    async fn insert(&self, product: Product) -> Result<Product, StoreError>;

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn list(&self) -> Result<Vec<Product>, StoreError>;

    /// Replace the stored document. Returns `None` when the product no longer
    /// exists; fails with `Duplicate` when the new SKU collides.
    async fn replace(&self, product: Product) -> Result<Option<Product>, StoreError>;

    async fn delete(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Conditionally set the stock level: the write only succeeds when the
    /// stored stock still equals `expected_stock` (compare-and-swap). The
    /// derived status is recomputed from the stored document in the same
    /// atomic step. Returns `None` when the product no longer exists.
    async fn update_stock(
        &self,
        id: ProductId,
        expected_stock: u32,
        new_stock: u32,
        at: DateTime<Utc>,
    ) -> Result<Option<Product>, StoreError>;
}

/// Movement collection. Append-only: there is deliberately no update or
/// delete, since a movement is a historical fact.
#[async_trait]
pub trait MovementStore: Send + Sync {
    async fn append(&self, movement: Movement) -> Result<Movement, StoreError>;

    async fn get(&self, id: MovementId) -> Result<Option<Movement>, StoreError>;

    /// Matching movements, newest first.
    async fn list(&self, filter: &MovementFilter) -> Result<Vec<Movement>, StoreError>;
}

/// Category collection.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Insert a new category; fails with `Duplicate` when the name is taken.
    async fn insert(&self, category: Category) -> Result<Category, StoreError>;

    async fn get(&self, id: CategoryId) -> Result<Option<Category>, StoreError>;

    async fn list(&self) -> Result<Vec<Category>, StoreError>;

    async fn replace(&self, category: Category) -> Result<Option<Category>, StoreError>;
}

/// Supplier collection.
#[async_trait]
pub trait SupplierStore: Send + Sync {
    async fn insert(&self, supplier: Supplier) -> Result<Supplier, StoreError>;

    async fn get(&self, id: SupplierId) -> Result<Option<Supplier>, StoreError>;

    async fn list(&self) -> Result<Vec<Supplier>, StoreError>;

    async fn replace(&self, supplier: Supplier) -> Result<Option<Supplier>, StoreError>;
}

/// User collection.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account; fails with `Duplicate` when the username or
    /// email is taken.
    async fn insert(&self, user: UserAccount) -> Result<UserAccount, StoreError>;

    async fn get(&self, id: UserId) -> Result<Option<UserAccount>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, StoreError>;

    async fn list(&self) -> Result<Vec<UserAccount>, StoreError>;

    async fn replace(&self, user: UserAccount) -> Result<Option<UserAccount>, StoreError>;

    async fn delete(&self, id: UserId) -> Result<Option<UserAccount>, StoreError>;
}

/// Task collection. All lookups are owner-scoped by the caller.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, task: Task) -> Result<Task, StoreError>;

    async fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    /// Tasks owned by `user_id`, newest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Task>, StoreError>;

    async fn replace(&self, task: Task) -> Result<Option<Task>, StoreError>;

    async fn delete(&self, id: TaskId) -> Result<Option<Task>, StoreError>;
}

// Blanket impls so `Arc<S>` satisfies the traits (handlers and the engine
// share stores by reference counting).
#[async_trait]
impl<S> ProductStore for std::sync::Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn insert(&self, product: Product) -> Result<Product, StoreError> {
        (**self).insert(product).await
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        (**self).list().await
    }

    async fn replace(&self, product: Product) -> Result<Option<Product>, StoreError> {
        (**self).replace(product).await
    }

    async fn delete(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).delete(id).await
    }

    async fn update_stock(
        &self,
        id: ProductId,
        expected_stock: u32,
        new_stock: u32,
        at: DateTime<Utc>,
    ) -> Result<Option<Product>, StoreError> {
        (**self).update_stock(id, expected_stock, new_stock, at).await
    }
}

#[async_trait]
impl<S> MovementStore for std::sync::Arc<S>
where
    S: MovementStore + ?Sized,
{
    async fn append(&self, movement: Movement) -> Result<Movement, StoreError> {
        (**self).append(movement).await
    }

    async fn get(&self, id: MovementId) -> Result<Option<Movement>, StoreError> {
        (**self).get(id).await
    }

    async fn list(&self, filter: &MovementFilter) -> Result<Vec<Movement>, StoreError> {
        (**self).list(filter).await
    }
}

#[async_trait]
impl<S> CategoryStore for std::sync::Arc<S>
where
    S: CategoryStore + ?Sized,
{
    async fn insert(&self, category: Category) -> Result<Category, StoreError> {
        (**self).insert(category).await
    }

    async fn get(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<Category>, StoreError> {
        (**self).list().await
    }

    async fn replace(&self, category: Category) -> Result<Option<Category>, StoreError> {
        (**self).replace(category).await
    }
}

#[async_trait]
impl<S> SupplierStore for std::sync::Arc<S>
where
    S: SupplierStore + ?Sized,
{
    async fn insert(&self, supplier: Supplier) -> Result<Supplier, StoreError> {
        (**self).insert(supplier).await
    }

    async fn get(&self, id: SupplierId) -> Result<Option<Supplier>, StoreError> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<Supplier>, StoreError> {
        (**self).list().await
    }

    async fn replace(&self, supplier: Supplier) -> Result<Option<Supplier>, StoreError> {
        (**self).replace(supplier).await
    }
}

#[async_trait]
impl<S> UserStore for std::sync::Arc<S>
where
    S: UserStore + ?Sized,
{
    async fn insert(&self, user: UserAccount) -> Result<UserAccount, StoreError> {
        (**self).insert(user).await
    }

    async fn get(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        (**self).get(id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, StoreError> {
        (**self).find_by_username(username).await
    }

    async fn list(&self) -> Result<Vec<UserAccount>, StoreError> {
        (**self).list().await
    }

    async fn replace(&self, user: UserAccount) -> Result<Option<UserAccount>, StoreError> {
        (**self).replace(user).await
    }

    async fn delete(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        (**self).delete(id).await
    }
}

#[async_trait]
impl<S> TaskStore for std::sync::Arc<S>
where
    S: TaskStore + ?Sized,
{
    async fn insert(&self, task: Task) -> Result<Task, StoreError> {
        (**self).insert(task).await
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        (**self).get(id).await
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Task>, StoreError> {
        (**self).list_for_user(user_id).await
    }

    async fn replace(&self, task: Task) -> Result<Option<Task>, StoreError> {
        (**self).replace(task).await
    }

    async fn delete(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        (**self).delete(id).await
    }
}
