use chrono::{DateTime, Utc};
use serde::Deserialize;

use stocky_auth::{Role, UserAccount};
use stocky_catalog::{Category, Product, Supplier};
use stocky_core::ProductId;
use stocky_infra::reports::{MovementStats, ProductStats, TopProduct};
use stocky_infra::Pagination;
use stocky_ledger::{Movement, MovementKind};
use stocky_tasks::Task;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMovementRequest {
    pub product_id: ProductId,
    /// Parsed with `MovementKind::from_str` so an unknown direction is a 400,
    /// not a body-shape rejection.
    #[serde(rename = "type")]
    pub kind: String,
    pub quantity: u32,
    pub reason: String,
    /// Actor attribution; defaults to the authenticated username.
    pub user: Option<String>,
    pub cost: Option<u64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStockRequest {
    pub quantity: u32,
    #[serde(rename = "type")]
    pub kind: String,
}

// -------------------------
// Query DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MovementListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(rename = "type")]
    pub kind: Option<MovementKind>,
    pub category: Option<String>,
    pub product_id: Option<ProductId>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn product_to_json(product: &Product) -> serde_json::Value {
    serde_json::json!({
        "id": product.id.to_string(),
        "name": product.name,
        "category_id": product.category_id.to_string(),
        "price": product.price,
        "stock": product.stock,
        "min_stock": product.min_stock,
        "max_stock": product.max_stock,
        "supplier_id": product.supplier_id.map(|s| s.to_string()),
        "sku": product.sku,
        "description": product.description,
        "status": product.status.as_str(),
        "created_at": product.created_at.to_rfc3339(),
        "last_updated": product.updated_at.to_rfc3339(),
    })
}

/// Movement JSON, with the product reference resolved when it still exists.
pub fn movement_to_json(movement: &Movement, product: Option<&Product>) -> serde_json::Value {
    serde_json::json!({
        "id": movement.id.to_string(),
        "product_id": movement.product_id.to_string(),
        "product": product.map(|p| serde_json::json!({
            "id": p.id.to_string(),
            "name": p.name,
            "sku": p.sku,
        })),
        "product_name": movement.product_name,
        "category": movement.category,
        "type": movement.kind.as_str(),
        "quantity": movement.quantity,
        "previous_stock": movement.previous_stock,
        "new_stock": movement.new_stock,
        "reason": movement.reason,
        "user": movement.user,
        "cost": movement.cost,
        "notes": movement.notes,
        "date": movement.created_at.to_rfc3339(),
    })
}

pub fn category_to_json(category: &Category) -> serde_json::Value {
    serde_json::json!({
        "id": category.id.to_string(),
        "name": category.name,
        "description": category.description,
        "color": category.color,
        "is_active": category.is_active,
        "created_at": category.created_at.to_rfc3339(),
        "updated_at": category.updated_at.to_rfc3339(),
    })
}

pub fn supplier_to_json(supplier: &Supplier) -> serde_json::Value {
    serde_json::json!({
        "id": supplier.id.to_string(),
        "name": supplier.name,
        "email": supplier.email,
        "phone": supplier.phone,
        "address": supplier.address,
        "contact_person": supplier.contact_person,
        "notes": supplier.notes,
        "active": supplier.active,
        "created_at": supplier.created_at.to_rfc3339(),
        "updated_at": supplier.updated_at.to_rfc3339(),
    })
}

/// User JSON; the password hash never leaves the store layer.
pub fn user_to_json(user: &UserAccount) -> serde_json::Value {
    serde_json::json!({
        "id": user.id.to_string(),
        "username": user.username,
        "email": user.email,
        "role": user.role.as_str(),
        "created_at": user.created_at.to_rfc3339(),
    })
}

pub fn task_to_json(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "id": task.id.to_string(),
        "user_id": task.user_id.to_string(),
        "description": task.description,
        "completed": task.completed,
        "priority": task.priority,
        "color": task.color,
        "created_at": task.created_at.to_rfc3339(),
    })
}

pub fn pagination_to_json(pagination: Pagination, total: usize) -> serde_json::Value {
    serde_json::json!({
        "page": pagination.page,
        "limit": pagination.limit,
        "total": total,
        "pages": pagination.pages(total),
    })
}

pub fn movement_stats_to_json(stats: &MovementStats) -> serde_json::Value {
    serde_json::json!({
        "total_movements": stats.total_movements,
        "entradas": stats.entradas,
        "salidas": stats.salidas,
        "total_entradas": stats.total_entradas,
        "total_salidas": stats.total_salidas,
        "valor_total": stats.valor_total,
    })
}

pub fn product_stats_to_json(stats: &ProductStats) -> serde_json::Value {
    serde_json::json!({
        "total_products": stats.total_products,
        "active_products": stats.active_products,
        "low_stock_products": stats.low_stock_products,
        "total_value": stats.total_value,
        "average_price": stats.average_price,
        "total_stock": stats.total_stock,
    })
}

pub fn top_product_to_json(row: &TopProduct) -> serde_json::Value {
    serde_json::json!({
        "product_id": row.product_id.to_string(),
        "product_name": row.product_name,
        "category": row.category,
        "total_sales": row.total_sales,
    })
}
