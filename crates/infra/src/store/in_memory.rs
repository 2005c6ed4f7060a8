//! In-memory store implementations.
//!
//! Default backend for dev/test. Uniqueness checks and the conditional stock
//! write all happen under the collection's write lock, which is what makes
//! `update_stock` a true compare-and-swap.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stocky_auth::UserAccount;
use stocky_catalog::{Category, Product, Supplier};
use stocky_core::{CategoryId, MovementId, ProductId, SupplierId, TaskId, UserId};
use stocky_ledger::Movement;
use stocky_tasks::Task;

use super::{
    CategoryStore, MovementFilter, MovementStore, ProductStore, StoreError, SupplierStore,
    TaskStore, UserStore,
};

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

/// In-memory product collection with a unique SKU index.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    inner: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn insert(&self, product: Product) -> Result<Product, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.values().any(|p| p.sku == product.sku) {
            return Err(StoreError::Duplicate(format!("sku '{}'", product.sku)));
        }
        map.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().cloned().collect())
    }

    async fn replace(&self, product: Product) -> Result<Option<Product>, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if !map.contains_key(&product.id) {
            return Ok(None);
        }
        if map
            .values()
            .any(|p| p.id != product.id && p.sku == product.sku)
        {
            return Err(StoreError::Duplicate(format!("sku '{}'", product.sku)));
        }
        map.insert(product.id, product.clone());
        Ok(Some(product))
    }

    async fn delete(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(&id))
    }

    async fn update_stock(
        &self,
        id: ProductId,
        expected_stock: u32,
        new_stock: u32,
        at: DateTime<Utc>,
    ) -> Result<Option<Product>, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let Some(product) = map.get_mut(&id) else {
            return Ok(None);
        };
        if product.stock != expected_stock {
            return Err(StoreError::StockConflict {
                expected: expected_stock,
                found: product.stock,
            });
        }
        product.apply_stock(new_stock, at);
        Ok(Some(product.clone()))
    }
}

/// In-memory movement collection (append-only).
#[derive(Debug, Default)]
pub struct InMemoryMovementStore {
    inner: RwLock<Vec<Movement>>,
}

impl InMemoryMovementStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MovementStore for InMemoryMovementStore {
    async fn append(&self, movement: Movement) -> Result<Movement, StoreError> {
        let mut list = self.inner.write().map_err(|_| poisoned())?;
        list.push(movement.clone());
        Ok(movement)
    }

    async fn get(&self, id: MovementId) -> Result<Option<Movement>, StoreError> {
        let list = self.inner.read().map_err(|_| poisoned())?;
        Ok(list.iter().find(|m| m.id == id).cloned())
    }

    async fn list(&self, filter: &MovementFilter) -> Result<Vec<Movement>, StoreError> {
        let list = self.inner.read().map_err(|_| poisoned())?;
        let mut matching: Vec<Movement> = list.iter().filter(|m| filter.matches(m)).cloned().collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }
}

/// In-memory category collection with a unique name index.
#[derive(Debug, Default)]
pub struct InMemoryCategoryStore {
    inner: RwLock<HashMap<CategoryId, Category>>,
}

impl InMemoryCategoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryStore for InMemoryCategoryStore {
    async fn insert(&self, category: Category) -> Result<Category, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.values().any(|c| c.name == category.name) {
            return Err(StoreError::Duplicate(format!("category '{}'", category.name)));
        }
        map.insert(category.id, category.clone());
        Ok(category)
    }

    async fn get(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Category>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().cloned().collect())
    }

    async fn replace(&self, category: Category) -> Result<Option<Category>, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if !map.contains_key(&category.id) {
            return Ok(None);
        }
        if map
            .values()
            .any(|c| c.id != category.id && c.name == category.name)
        {
            return Err(StoreError::Duplicate(format!("category '{}'", category.name)));
        }
        map.insert(category.id, category.clone());
        Ok(Some(category))
    }
}

/// In-memory supplier collection.
#[derive(Debug, Default)]
pub struct InMemorySupplierStore {
    inner: RwLock<HashMap<SupplierId, Supplier>>,
}

impl InMemorySupplierStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SupplierStore for InMemorySupplierStore {
    async fn insert(&self, supplier: Supplier) -> Result<Supplier, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.insert(supplier.id, supplier.clone());
        Ok(supplier)
    }

    async fn get(&self, id: SupplierId) -> Result<Option<Supplier>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Supplier>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().cloned().collect())
    }

    async fn replace(&self, supplier: Supplier) -> Result<Option<Supplier>, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if !map.contains_key(&supplier.id) {
            return Ok(None);
        }
        map.insert(supplier.id, supplier.clone());
        Ok(Some(supplier))
    }
}

/// In-memory user collection with unique username/email indexes.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<HashMap<UserId, UserAccount>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: UserAccount) -> Result<UserAccount, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(StoreError::Duplicate(format!("user '{}'", user.username)));
        }
        map.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().find(|u| u.username == username).cloned())
    }

    async fn list(&self) -> Result<Vec<UserAccount>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().cloned().collect())
    }

    async fn replace(&self, user: UserAccount) -> Result<Option<UserAccount>, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if !map.contains_key(&user.id) {
            return Ok(None);
        }
        if map
            .values()
            .any(|u| u.id != user.id && (u.username == user.username || u.email == user.email))
        {
            return Err(StoreError::Duplicate(format!("user '{}'", user.username)));
        }
        map.insert(user.id, user.clone());
        Ok(Some(user))
    }

    async fn delete(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(&id))
    }
}

/// In-memory task collection.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    inner: RwLock<HashMap<TaskId, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: Task) -> Result<Task, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.insert(task.id, task.clone());
        Ok(task)
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Task>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut tasks: Vec<Task> = map.values().filter(|t| t.user_id == user_id).cloned().collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn replace(&self, task: Task) -> Result<Option<Task>, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if !map.contains_key(&task.id) {
            return Ok(None);
        }
        map.insert(task.id, task.clone());
        Ok(Some(task))
    }

    async fn delete(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(&id))
    }
}
