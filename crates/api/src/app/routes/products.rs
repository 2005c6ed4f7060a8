use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;

use stocky_catalog::{NewProduct, Product, ProductPatch, ProductStatus};
use stocky_core::ProductId;
use stocky_infra::{reports, Pagination, StoreError};
use stocky_ledger::MovementKind;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/stats", get(product_stats))
        .route("/low-stock", get(low_stock_products))
        .route("/:id", get(get_product).put(update_product).delete(delete_product))
        .route("/:id/stock", patch(update_stock))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ProductListQuery>,
) -> axum::response::Response {
    let mut products = match services.products.list().await {
        Ok(p) => p,
        Err(e) => return errors::store_error_to_response(e),
    };

    if let Some(search) = query.search.as_deref().map(str::to_lowercase) {
        products.retain(|p| {
            p.name.to_lowercase().contains(&search)
                || p.sku.to_lowercase().contains(&search)
                || p.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&search))
        });
    }
    if let Some(category) = query.category.as_deref() {
        products.retain(|p| p.category_id.to_string() == category);
    }
    if let Some(status) = query.status.as_deref() {
        let status: ProductStatus = match status.parse() {
            Ok(s) => s,
            Err(e) => return errors::domain_error_to_response(e),
        };
        products.retain(|p| p.status == status);
    }

    sort_products(&mut products, query.sort_by.as_deref(), query.sort_order.as_deref());

    let pagination = Pagination::new(query.page, query.limit);
    let total = products.len();
    let page = pagination.slice(&products);

    Json(serde_json::json!({
        "products": page.iter().map(dto::product_to_json).collect::<Vec<_>>(),
        "pagination": dto::pagination_to_json(pagination, total),
    }))
    .into_response()
}

fn sort_products(products: &mut [Product], sort_by: Option<&str>, sort_order: Option<&str>) {
    let descending = sort_order == Some("desc");
    match sort_by.unwrap_or("name") {
        "price" => products.sort_by_key(|p| p.price),
        "stock" => products.sort_by_key(|p| p.stock),
        "sku" => products.sort_by(|a, b| a.sku.cmp(&b.sku)),
        "created_at" => products.sort_by_key(|p| p.created_at),
        _ => products.sort_by(|a, b| a.name.cmp(&b.name)),
    }
    if descending {
        products.reverse();
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };
    match services.products.get(id).await {
        Ok(Some(product)) => Json(dto::product_to_json(&product)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewProduct>,
) -> axum::response::Response {
    // A supplier reference must point at a live supplier.
    if let Some(supplier_id) = body.supplier_id {
        match services.suppliers.get(supplier_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_supplier",
                    "supplier does not exist",
                );
            }
            Err(e) => return errors::store_error_to_response(e),
        }
    }

    let product = match Product::create(body, Utc::now()) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.products.insert(product).await {
        Ok(product) => (StatusCode::CREATED, Json(dto::product_to_json(&product))).into_response(),
        Err(StoreError::Duplicate(_)) => {
            errors::json_error(StatusCode::BAD_REQUEST, "duplicate_key", "SKU already exists")
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(patch): Json<ProductPatch>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    if let Some(supplier_id) = patch.supplier_id {
        match services.suppliers.get(supplier_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_supplier",
                    "supplier does not exist",
                );
            }
            Err(e) => return errors::store_error_to_response(e),
        }
    }

    let mut product = match services.products.get(id).await {
        Ok(Some(p)) => p,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        Err(e) => return errors::store_error_to_response(e),
    };

    if let Err(e) = product.apply_patch(patch, Utc::now()) {
        return errors::domain_error_to_response(e);
    }

    match services.products.replace(product).await {
        Ok(Some(product)) => Json(dto::product_to_json(&product)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        Err(StoreError::Duplicate(_)) => {
            errors::json_error(StatusCode::BAD_REQUEST, "duplicate_key", "SKU already exists")
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };
    match services.products.delete(id).await {
        Ok(Some(_)) => Json(serde_json::json!({ "message": "product deleted" })).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn product_stats(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match reports::product_stats(services.products.as_ref()).await {
        Ok(stats) => Json(dto::product_stats_to_json(&stats)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn low_stock_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let mut products = match services.products.list().await {
        Ok(p) => p,
        Err(e) => return errors::store_error_to_response(e),
    };
    products.retain(|p| p.status == ProductStatus::LowStock);
    products.sort_by_key(|p| p.stock);

    Json(products.iter().map(dto::product_to_json).collect::<Vec<_>>()).into_response()
}

/// Direct stock adjustment. Goes through the ledger engine, so it shares the
/// validation/arithmetic core with movement creation and records the same
/// ledger entry.
pub async fn update_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<crate::context::AuthContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateStockRequest>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    let kind: MovementKind = match body.kind.parse() {
        Ok(k) => k,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let adjustment = match services
        .ledger
        .adjust_stock(id, kind, body.quantity, ctx.username(), Utc::now())
        .await
    {
        Ok(a) => a,
        Err(e) => return errors::ledger_error_to_response(e),
    };

    Json(serde_json::json!({
        "product": dto::product_to_json(&adjustment.product),
        "previous_stock": adjustment.previous_stock,
        "new_stock": adjustment.new_stock,
        "movement": {
            "id": adjustment.movement.id.to_string(),
            "type": adjustment.movement.kind.as_str(),
            "quantity": adjustment.movement.quantity,
        },
    }))
    .into_response()
}
