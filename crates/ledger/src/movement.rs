use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocky_core::{DomainError, Entity, MovementId, ProductId};

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Inward movement: stock increases.
    Entrada,
    /// Outward movement: stock decreases.
    Salida,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Entrada => "entrada",
            MovementKind::Salida => "salida",
        }
    }
}

impl core::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for MovementKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entrada" => Ok(MovementKind::Entrada),
            "salida" => Ok(MovementKind::Salida),
            other => Err(DomainError::validation(format!(
                "invalid movement type '{other}' (expected 'entrada' or 'salida')"
            ))),
        }
    }
}

/// Compute the stock level that follows a movement.
///
/// Pure: no side effects, shared by every adjustment path.
///
/// Rules:
/// - quantity must be >= 1;
/// - `salida` with `quantity > previous_stock` fails with `InsufficientStock`;
/// - `entrada` is overflow-checked.
pub fn apply_movement(
    previous_stock: u32,
    kind: MovementKind,
    quantity: u32,
) -> Result<u32, DomainError> {
    if quantity == 0 {
        return Err(DomainError::validation("quantity must be at least 1"));
    }
    match kind {
        MovementKind::Entrada => previous_stock
            .checked_add(quantity)
            .ok_or_else(|| DomainError::invariant("stock overflow")),
        MovementKind::Salida => {
            if quantity > previous_stock {
                Err(DomainError::insufficient_stock(quantity, previous_stock))
            } else {
                Ok(previous_stock - quantity)
            }
        }
    }
}

/// Immutable ledger entry recording one stock change.
///
/// `product_name` and `category` are snapshots taken at creation time so the
/// audit trail stays accurate even if the product is later renamed, recategorized
/// or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub product_name: String,
    pub category: String,
    pub kind: MovementKind,
    pub quantity: u32,
    pub previous_stock: u32,
    pub new_stock: u32,
    pub reason: String,
    /// Actor attribution; opaque to the ledger.
    pub user: String,
    /// Unit cost in minor currency units, when known.
    pub cost: Option<u64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Movement {
    type Id = MovementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A requested adjustment, before the ledger engine has resolved the product.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MovementDraft {
    pub product_id: ProductId,
    pub kind: MovementKind,
    pub quantity: u32,
    pub reason: String,
    pub user: String,
    pub cost: Option<u64>,
    pub notes: Option<String>,
}

impl MovementDraft {
    /// Deterministic validation; runs before any store access.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.quantity == 0 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        if self.reason.trim().is_empty() {
            return Err(DomainError::validation("reason cannot be empty"));
        }
        if self.user.trim().is_empty() {
            return Err(DomainError::validation("user cannot be empty"));
        }
        Ok(())
    }

    /// Seal the draft into an immutable ledger entry.
    ///
    /// `previous_stock`/`new_stock` must already satisfy [`apply_movement`];
    /// the engine is the only caller.
    pub fn into_movement(
        self,
        product_name: String,
        category: String,
        previous_stock: u32,
        new_stock: u32,
        now: DateTime<Utc>,
    ) -> Movement {
        Movement {
            id: MovementId::new(),
            product_id: self.product_id,
            product_name,
            category,
            kind: self.kind,
            quantity: self.quantity,
            previous_stock,
            new_stock,
            reason: self.reason,
            user: self.user,
            cost: self.cost,
            notes: self.notes,
            created_at: now,
        }
    }
}
