use std::sync::Arc;

use stocky_infra::store::{
    CategoryStore, InMemoryCategoryStore, InMemoryMovementStore, InMemoryProductStore,
    InMemorySupplierStore, InMemoryTaskStore, InMemoryUserStore, MovementStore, ProductStore,
    SupplierStore, TaskStore, UserStore,
};
use stocky_infra::StockLedger;

/// Ledger engine type used by the API: trait-object stores behind `Arc` so a
/// persistent backend can be wired in without touching the handlers.
pub type ApiLedger =
    StockLedger<Arc<dyn ProductStore>, Arc<dyn MovementStore>, Arc<dyn CategoryStore>>;

/// Shared application services: one store per collection plus the ledger
/// engine that mediates every stock mutation.
pub struct AppServices {
    pub products: Arc<dyn ProductStore>,
    pub movements: Arc<dyn MovementStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub suppliers: Arc<dyn SupplierStore>,
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub ledger: ApiLedger,
}

/// Wire the default (in-memory) backend.
pub fn build_services() -> AppServices {
    let products: Arc<dyn ProductStore> = Arc::new(InMemoryProductStore::new());
    let movements: Arc<dyn MovementStore> = Arc::new(InMemoryMovementStore::new());
    let categories: Arc<dyn CategoryStore> = Arc::new(InMemoryCategoryStore::new());
    let suppliers: Arc<dyn SupplierStore> = Arc::new(InMemorySupplierStore::new());
    let users: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
    let tasks: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new());

    let ledger = StockLedger::new(products.clone(), movements.clone(), categories.clone());

    AppServices {
        products,
        movements,
        categories,
        suppliers,
        users,
        tasks,
        ledger,
    }
}
