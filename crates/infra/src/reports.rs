//! Read-only aggregation helpers.
//!
//! Statistics are derived by scanning the stores; nothing here mutates
//! state and nothing here participates in the ledger's consistency rules.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use stocky_catalog::ProductStatus;
use stocky_core::ProductId;
use stocky_ledger::{Movement, MovementKind};

use crate::store::{MovementFilter, MovementStore, ProductStore, StoreError};

/// Aggregate movement statistics over an optional date range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MovementStats {
    pub total_movements: u64,
    pub entradas: u64,
    pub salidas: u64,
    /// Summed quantity over inward movements.
    pub total_entradas: u64,
    /// Summed quantity over outward movements.
    pub total_salidas: u64,
    /// Σ quantity × cost over movements that carry a cost.
    pub valor_total: u64,
}

/// One row of the top-sellers report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub product_name: String,
    pub category: String,
    pub total_sales: u64,
}

/// Aggregate product/catalog statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductStats {
    pub total_products: u64,
    pub active_products: u64,
    pub low_stock_products: u64,
    /// Σ stock × price (inventory value, minor currency units).
    pub total_value: u64,
    pub average_price: f64,
    pub total_stock: u64,
}

/// Compute movement statistics for movements inside `[from, to]`.
pub async fn movement_stats(
    store: &dyn MovementStore,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<MovementStats, StoreError> {
    let filter = MovementFilter {
        from,
        to,
        ..Default::default()
    };
    let movements = store.list(&filter).await?;

    let mut stats = MovementStats::default();
    for movement in &movements {
        stats.total_movements += 1;
        match movement.kind {
            MovementKind::Entrada => {
                stats.entradas += 1;
                stats.total_entradas += u64::from(movement.quantity);
            }
            MovementKind::Salida => {
                stats.salidas += 1;
                stats.total_salidas += u64::from(movement.quantity);
            }
        }
        if let Some(cost) = movement.cost {
            stats.valor_total += u64::from(movement.quantity) * cost;
        }
    }
    Ok(stats)
}

/// Products with the highest outward volume, descending, at most `limit`.
pub async fn top_selling(
    store: &dyn MovementStore,
    limit: usize,
) -> Result<Vec<TopProduct>, StoreError> {
    let filter = MovementFilter {
        kind: Some(MovementKind::Salida),
        ..Default::default()
    };
    let movements = store.list(&filter).await?;

    let mut by_product: HashMap<ProductId, TopProduct> = HashMap::new();
    for movement in &movements {
        by_product
            .entry(movement.product_id)
            .and_modify(|row| row.total_sales += u64::from(movement.quantity))
            .or_insert_with(|| TopProduct {
                product_id: movement.product_id,
                product_name: movement.product_name.clone(),
                category: movement.category.clone(),
                total_sales: u64::from(movement.quantity),
            });
    }

    let mut rows: Vec<TopProduct> = by_product.into_values().collect();
    rows.sort_by(|a, b| b.total_sales.cmp(&a.total_sales));
    rows.truncate(limit);
    Ok(rows)
}

/// The most recent movements, newest first, at most `limit`.
pub async fn recent_movements(
    store: &dyn MovementStore,
    limit: usize,
) -> Result<Vec<Movement>, StoreError> {
    let mut movements = store.list(&MovementFilter::default()).await?;
    movements.truncate(limit);
    Ok(movements)
}

/// Compute catalog-wide product statistics.
pub async fn product_stats(store: &dyn ProductStore) -> Result<ProductStats, StoreError> {
    let products = store.list().await?;

    let mut stats = ProductStats {
        total_products: products.len() as u64,
        ..Default::default()
    };
    let mut price_sum: u64 = 0;
    for product in &products {
        match product.status {
            ProductStatus::Active => stats.active_products += 1,
            ProductStatus::LowStock => stats.low_stock_products += 1,
            ProductStatus::Inactive => {}
        }
        stats.total_value += u64::from(product.stock) * product.price;
        stats.total_stock += u64::from(product.stock);
        price_sum += product.price;
    }
    if !products.is_empty() {
        stats.average_price = price_sum as f64 / products.len() as f64;
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use stocky_catalog::{NewProduct, Product};
    use stocky_core::{CategoryId, MovementId};
    use stocky_ledger::MovementDraft;

    use crate::store::{InMemoryMovementStore, InMemoryProductStore};

    use super::*;

    fn movement(kind: MovementKind, quantity: u32, cost: Option<u64>, name: &str) -> Movement {
        let draft = MovementDraft {
            product_id: ProductId::new(),
            kind,
            quantity,
            reason: "conteo".to_string(),
            user: "ana".to_string(),
            cost,
            notes: None,
        };
        draft.into_movement(name.to_string(), "General".to_string(), 100, 100, Utc::now())
    }

    #[tokio::test]
    async fn movement_stats_totals_by_kind_and_value() {
        let store = Arc::new(InMemoryMovementStore::new());
        store
            .append(movement(MovementKind::Entrada, 10, Some(5), "A"))
            .await
            .unwrap();
        store
            .append(movement(MovementKind::Salida, 4, None, "A"))
            .await
            .unwrap();
        store
            .append(movement(MovementKind::Salida, 6, Some(3), "B"))
            .await
            .unwrap();

        let stats = movement_stats(store.as_ref(), None, None).await.unwrap();
        assert_eq!(stats.total_movements, 3);
        assert_eq!(stats.entradas, 1);
        assert_eq!(stats.salidas, 2);
        assert_eq!(stats.total_entradas, 10);
        assert_eq!(stats.total_salidas, 10);
        assert_eq!(stats.valor_total, 10 * 5 + 6 * 3);
    }

    #[tokio::test]
    async fn movement_stats_honors_date_range() {
        let store = Arc::new(InMemoryMovementStore::new());
        let mut old = movement(MovementKind::Entrada, 1, None, "A");
        old.created_at = Utc::now() - Duration::days(30);
        store.append(old).await.unwrap();
        store
            .append(movement(MovementKind::Entrada, 2, None, "A"))
            .await
            .unwrap();

        let from = Utc::now() - Duration::days(1);
        let stats = movement_stats(store.as_ref(), Some(from), None).await.unwrap();
        assert_eq!(stats.total_movements, 1);
        assert_eq!(stats.total_entradas, 2);
    }

    #[tokio::test]
    async fn top_selling_groups_and_orders_salidas() {
        let store = Arc::new(InMemoryMovementStore::new());
        let hot = ProductId::new();
        let cold = ProductId::new();
        for quantity in [5u32, 7] {
            let mut m = movement(MovementKind::Salida, quantity, None, "Hot");
            m.product_id = hot;
            m.id = MovementId::new();
            store.append(m).await.unwrap();
        }
        let mut m = movement(MovementKind::Salida, 3, None, "Cold");
        m.product_id = cold;
        store.append(m).await.unwrap();
        // Entradas never count as sales.
        store
            .append(movement(MovementKind::Entrada, 100, None, "Hot"))
            .await
            .unwrap();

        let rows = top_selling(store.as_ref(), 5).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].product_id, hot);
        assert_eq!(rows[0].total_sales, 12);
        assert_eq!(rows[1].total_sales, 3);

        let rows = top_selling(store.as_ref(), 1).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn product_stats_sums_value_and_counts_statuses() {
        let store = Arc::new(InMemoryProductStore::new());
        let mk = |sku: &str, stock: u32, min_stock: u32, price: u64| {
            Product::create(
                NewProduct {
                    name: sku.to_string(),
                    category_id: CategoryId::new(),
                    price,
                    stock,
                    min_stock,
                    max_stock: 1_000,
                    supplier_id: None,
                    sku: sku.to_string(),
                    description: None,
                },
                Utc::now(),
            )
            .unwrap()
        };
        store.insert(mk("A", 10, 2, 100)).await.unwrap();
        store.insert(mk("B", 1, 5, 50)).await.unwrap();

        let stats = product_stats(store.as_ref()).await.unwrap();
        assert_eq!(stats.total_products, 2);
        assert_eq!(stats.active_products, 1);
        assert_eq!(stats.low_stock_products, 1);
        assert_eq!(stats.total_value, 10 * 100 + 50);
        assert_eq!(stats.total_stock, 11);
        assert!((stats.average_price - 75.0).abs() < f64::EPSILON);
    }
}
