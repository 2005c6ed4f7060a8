use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use stocky_catalog::{Category, CategoryPatch, NewCategory};
use stocky_core::CategoryId;
use stocky_infra::StoreError;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_category).get(list_categories))
        .route("/:id", get(get_category).put(update_category).delete(delete_category))
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let mut categories = match services.categories.list().await {
        Ok(c) => c,
        Err(e) => return errors::store_error_to_response(e),
    };
    categories.retain(|c| c.is_active);
    categories.sort_by(|a, b| a.name.cmp(&b.name));

    Json(categories.iter().map(dto::category_to_json).collect::<Vec<_>>()).into_response()
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CategoryId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid category id"),
    };
    match services.categories.get(id).await {
        Ok(Some(category)) => Json(dto::category_to_json(&category)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "category not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewCategory>,
) -> axum::response::Response {
    let category = match Category::create(body, Utc::now()) {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.categories.insert(category).await {
        Ok(category) => (StatusCode::CREATED, Json(dto::category_to_json(&category))).into_response(),
        Err(StoreError::Duplicate(_)) => {
            errors::json_error(StatusCode::BAD_REQUEST, "duplicate_key", "category already exists")
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(patch): Json<CategoryPatch>,
) -> axum::response::Response {
    let id: CategoryId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid category id"),
    };

    let mut category = match services.categories.get(id).await {
        Ok(Some(c)) => c,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "category not found"),
        Err(e) => return errors::store_error_to_response(e),
    };

    if let Err(e) = category.apply_patch(patch, Utc::now()) {
        return errors::domain_error_to_response(e);
    }

    match services.categories.replace(category).await {
        Ok(Some(category)) => Json(dto::category_to_json(&category)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "category not found"),
        Err(StoreError::Duplicate(_)) => {
            errors::json_error(StatusCode::BAD_REQUEST, "duplicate_key", "category already exists")
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Soft delete: the category is deactivated, not removed, so products and
/// movement snapshots keep resolving.
pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CategoryId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid category id"),
    };

    let mut category = match services.categories.get(id).await {
        Ok(Some(c)) => c,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "category not found"),
        Err(e) => return errors::store_error_to_response(e),
    };

    category.deactivate(Utc::now());
    match services.categories.replace(category).await {
        Ok(Some(_)) => Json(serde_json::json!({ "message": "category deleted" })).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "category not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}
