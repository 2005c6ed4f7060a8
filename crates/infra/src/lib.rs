//! `stocky-infra` — storage seams, the stock ledger engine, and reporting.
//!
//! Domain crates stay pure; everything that touches a store lives here. The
//! [`ledger::StockLedger`] engine is the only writer of product stock and the
//! only producer of ledger entries.

pub mod ledger;
pub mod reports;
pub mod store;

pub use ledger::{LedgerError, StockAdjustment, StockLedger};
pub use store::{
    CategoryStore, MovementFilter, MovementStore, Pagination, ProductStore, StoreError,
    SupplierStore, TaskStore, UserStore,
};
