use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use stocky_catalog::{NewSupplier, Supplier, SupplierPatch};
use stocky_core::SupplierId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_supplier).get(list_suppliers))
        .route("/:id", get(get_supplier).put(update_supplier).delete(delete_supplier))
}

pub async fn list_suppliers(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let suppliers = match services.suppliers.list().await {
        Ok(s) => s,
        Err(e) => return errors::store_error_to_response(e),
    };
    Json(serde_json::json!({
        "suppliers": suppliers.iter().map(dto::supplier_to_json).collect::<Vec<_>>(),
    }))
    .into_response()
}

pub async fn get_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: SupplierId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid supplier id"),
    };
    match services.suppliers.get(id).await {
        Ok(Some(supplier)) => Json(dto::supplier_to_json(&supplier)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "supplier not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewSupplier>,
) -> axum::response::Response {
    let supplier = match Supplier::create(body, Utc::now()) {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.suppliers.insert(supplier).await {
        Ok(supplier) => (StatusCode::CREATED, Json(dto::supplier_to_json(&supplier))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(patch): Json<SupplierPatch>,
) -> axum::response::Response {
    let id: SupplierId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid supplier id"),
    };

    let mut supplier = match services.suppliers.get(id).await {
        Ok(Some(s)) => s,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "supplier not found"),
        Err(e) => return errors::store_error_to_response(e),
    };

    if let Err(e) = supplier.apply_patch(patch, Utc::now()) {
        return errors::domain_error_to_response(e);
    }

    match services.suppliers.replace(supplier).await {
        Ok(Some(supplier)) => Json(dto::supplier_to_json(&supplier)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "supplier not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Soft delete.
pub async fn delete_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: SupplierId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid supplier id"),
    };

    let mut supplier = match services.suppliers.get(id).await {
        Ok(Some(s)) => s,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "supplier not found"),
        Err(e) => return errors::store_error_to_response(e),
    };

    supplier.deactivate(Utc::now());
    match services.suppliers.replace(supplier).await {
        Ok(Some(supplier)) => Json(serde_json::json!({
            "message": "supplier deleted",
            "supplier": dto::supplier_to_json(&supplier),
        }))
        .into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "supplier not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}
