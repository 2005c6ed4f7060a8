use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocky_core::{CategoryId, DomainError, Entity, ProductId, SupplierId};

/// Product status lifecycle.
///
/// `Active` and `LowStock` are flipped automatically by the stock/threshold
/// comparison on every stock-affecting write. `Inactive` is only ever set or
/// cleared by explicit operator action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductStatus {
    Active,
    Inactive,
    LowStock,
}

impl ProductStatus {
    /// Derive the status that follows a stock-affecting write.
    ///
    /// `low-stock` when `stock <= min_stock`; back to `active` when the stock
    /// climbed above threshold and the previous status was `low-stock`;
    /// otherwise the previous status is preserved (so an explicit `inactive`
    /// survives stock changes).
    pub fn derive(stock: u32, min_stock: u32, current: ProductStatus) -> ProductStatus {
        if stock <= min_stock {
            ProductStatus::LowStock
        } else if current == ProductStatus::LowStock {
            ProductStatus::Active
        } else {
            current
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
            ProductStatus::LowStock => "low-stock",
        }
    }
}

impl core::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ProductStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProductStatus::Active),
            "inactive" => Ok(ProductStatus::Inactive),
            "low-stock" => Ok(ProductStatus::LowStock),
            other => Err(DomainError::validation(format!(
                "unknown product status '{other}'"
            ))),
        }
    }
}

/// Statuses an operator may set directly.
///
/// `low-stock` is derived state and is rejected as caller input; write
/// payloads may only toggle active/inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplicitStatus {
    Active,
    Inactive,
}

impl From<ExplicitStatus> for ProductStatus {
    fn from(value: ExplicitStatus) -> Self {
        match value {
            ExplicitStatus::Active => ProductStatus::Active,
            ExplicitStatus::Inactive => ProductStatus::Inactive,
        }
    }
}

/// Product document.
///
/// `stock` is only mutated through the ledger engine or an explicit field
/// edit; `status` is recomputed on every such write and never trusted as
/// caller input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category_id: CategoryId,
    /// Unit price in minor currency units.
    pub price: u64,
    pub stock: u32,
    pub min_stock: u32,
    pub max_stock: u32,
    pub supplier_id: Option<SupplierId>,
    pub sku: String,
    pub description: Option<String>,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category_id: CategoryId,
    pub price: u64,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub min_stock: u32,
    pub max_stock: u32,
    pub supplier_id: Option<SupplierId>,
    pub sku: String,
    pub description: Option<String>,
}

/// Partial update for a product. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category_id: Option<CategoryId>,
    pub price: Option<u64>,
    pub stock: Option<u32>,
    pub min_stock: Option<u32>,
    pub max_stock: Option<u32>,
    pub supplier_id: Option<SupplierId>,
    pub sku: Option<String>,
    pub description: Option<String>,
    /// Explicit operator toggle; derived `low-stock` cannot be requested.
    pub status: Option<ExplicitStatus>,
}

impl Product {
    /// Validate and build a new product document.
    pub fn create(new: NewProduct, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        let sku = new.sku.trim().to_string();
        if sku.is_empty() {
            return Err(DomainError::validation("SKU cannot be empty"));
        }
        if new.max_stock < new.min_stock {
            return Err(DomainError::invariant(
                "max_stock cannot be below min_stock",
            ));
        }

        let status = ProductStatus::derive(new.stock, new.min_stock, ProductStatus::Active);
        Ok(Self {
            id: ProductId::new(),
            name,
            category_id: new.category_id,
            price: new.price,
            stock: new.stock,
            min_stock: new.min_stock,
            max_stock: new.max_stock,
            supplier_id: new.supplier_id,
            sku,
            description: new.description,
            status,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a field edit, then recompute the derived status.
    pub fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) -> Result<(), DomainError> {
        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
            self.name = name;
        }
        if let Some(sku) = patch.sku {
            let sku = sku.trim().to_string();
            if sku.is_empty() {
                return Err(DomainError::validation("SKU cannot be empty"));
            }
            self.sku = sku;
        }
        if let Some(category_id) = patch.category_id {
            self.category_id = category_id;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if let Some(min_stock) = patch.min_stock {
            self.min_stock = min_stock;
        }
        if let Some(max_stock) = patch.max_stock {
            self.max_stock = max_stock;
        }
        if let Some(supplier_id) = patch.supplier_id {
            self.supplier_id = Some(supplier_id);
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if self.max_stock < self.min_stock {
            return Err(DomainError::invariant(
                "max_stock cannot be below min_stock",
            ));
        }

        // Explicit toggle first, then the threshold comparison wins.
        if let Some(explicit) = patch.status {
            self.status = explicit.into();
        }
        self.status = ProductStatus::derive(self.stock, self.min_stock, self.status);
        self.updated_at = now;
        Ok(())
    }

    /// Set the stock level and recompute the derived status.
    ///
    /// This is the single mutation point used by the ledger engine.
    pub fn apply_stock(&mut self, new_stock: u32, now: DateTime<Utc>) {
        self.stock = new_stock;
        self.status = ProductStatus::derive(self.stock, self.min_stock, self.status);
        self.updated_at = now;
    }

    pub fn is_low_stock(&self) -> bool {
        self.status == ProductStatus::LowStock
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
