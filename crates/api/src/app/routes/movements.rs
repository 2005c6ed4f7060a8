use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use stocky_core::{MovementId, ProductId};
use stocky_infra::{reports, MovementFilter, Pagination};
use stocky_ledger::{Movement, MovementDraft, MovementKind};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_movements).post(create_movement))
        .route("/top-selling", get(top_selling))
        .route("/stats", get(movement_stats))
        .route("/recent", get(recent_movements))
        .route("/product/:product_id", get(movements_by_product))
        .route("/:id", get(get_movement))
}

/// Resolve the live product for each movement in a response page.
async fn movements_with_products(
    services: &AppServices,
    movements: &[Movement],
) -> Vec<serde_json::Value> {
    let mut out = Vec::with_capacity(movements.len());
    for movement in movements {
        let product = services
            .products
            .get(movement.product_id)
            .await
            .unwrap_or(None);
        out.push(dto::movement_to_json(movement, product.as_ref()));
    }
    out
}

pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::MovementListQuery>,
) -> axum::response::Response {
    let filter = MovementFilter {
        kind: query.kind,
        category: query.category,
        product_id: query.product_id,
        from: query.start_date,
        to: query.end_date,
    };

    let mut movements = match services.movements.list(&filter).await {
        Ok(m) => m,
        Err(e) => return errors::store_error_to_response(e),
    };

    // Store order is newest-first; re-sort only when the caller asks.
    match query.sort_by.as_deref() {
        Some("quantity") => movements.sort_by_key(|m| m.quantity),
        _ => movements.sort_by_key(|m| m.created_at),
    }
    if query.sort_order.as_deref() != Some("asc") {
        movements.reverse();
    }

    let pagination = Pagination::new(query.page, query.limit);
    let total = movements.len();
    let page = pagination.slice(&movements);

    Json(serde_json::json!({
        "movements": movements_with_products(&services, &page).await,
        "pagination": dto::pagination_to_json(pagination, total),
    }))
    .into_response()
}

pub async fn get_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: MovementId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid movement id"),
    };
    match services.movements.get(id).await {
        Ok(Some(movement)) => {
            let product = services
                .products
                .get(movement.product_id)
                .await
                .unwrap_or(None);
            Json(dto::movement_to_json(&movement, product.as_ref())).into_response()
        }
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "movement not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<crate::context::AuthContext>,
    Json(body): Json<dto::CreateMovementRequest>,
) -> axum::response::Response {
    let kind: MovementKind = match body.kind.parse() {
        Ok(k) => k,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let draft = MovementDraft {
        product_id: body.product_id,
        kind,
        quantity: body.quantity,
        reason: body.reason,
        user: body.user.unwrap_or_else(|| ctx.username().to_string()),
        cost: body.cost,
        notes: body.notes,
    };

    let movement = match services.ledger.record_movement(draft, Utc::now()).await {
        Ok(m) => m,
        Err(e) => return errors::ledger_error_to_response(e),
    };

    let product = services
        .products
        .get(movement.product_id)
        .await
        .unwrap_or(None);

    (
        StatusCode::CREATED,
        Json(dto::movement_to_json(&movement, product.as_ref())),
    )
        .into_response()
}

pub async fn movement_stats(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::DateRangeQuery>,
) -> axum::response::Response {
    match reports::movement_stats(services.movements.as_ref(), query.start_date, query.end_date)
        .await
    {
        Ok(stats) => Json(dto::movement_stats_to_json(&stats)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn recent_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::LimitQuery>,
) -> axum::response::Response {
    let limit = query.limit.unwrap_or(10) as usize;
    let movements = match reports::recent_movements(services.movements.as_ref(), limit).await {
        Ok(m) => m,
        Err(e) => return errors::store_error_to_response(e),
    };
    Json(movements_with_products(&services, &movements).await).into_response()
}

pub async fn movements_by_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(product_id): Path<String>,
    Query(query): Query<dto::PageQuery>,
) -> axum::response::Response {
    let product_id: ProductId = match product_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    let filter = MovementFilter {
        product_id: Some(product_id),
        ..Default::default()
    };
    let movements = match services.movements.list(&filter).await {
        Ok(m) => m,
        Err(e) => return errors::store_error_to_response(e),
    };

    let pagination = Pagination::new(query.page, query.limit);
    let total = movements.len();
    let page = pagination.slice(&movements);

    Json(serde_json::json!({
        "movements": movements_with_products(&services, &page).await,
        "pagination": dto::pagination_to_json(pagination, total),
    }))
    .into_response()
}

pub async fn top_selling(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::LimitQuery>,
) -> axum::response::Response {
    let limit = query.limit.unwrap_or(5) as usize;
    match reports::top_selling(services.movements.as_ref(), limit).await {
        Ok(rows) => Json(rows.iter().map(dto::top_product_to_json).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
