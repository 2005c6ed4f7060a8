//! `stocky-catalog` — products, categories and suppliers.
//!
//! Catalog entities are plain documents; the only derived state is the
//! product `status`, which is a pure function of stock vs. threshold.

pub mod category;
pub mod product;
pub mod supplier;

pub use category::{Category, CategoryPatch, NewCategory};
pub use product::{ExplicitStatus, NewProduct, Product, ProductPatch, ProductStatus};
pub use supplier::{NewSupplier, Supplier, SupplierPatch};
