use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;

use stocky_core::TaskId;
use stocky_tasks::{NewTask, Task, TaskPatch};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::AuthContext;

/// All task routes are scoped to the authenticated owner; a foreign task id
/// behaves exactly like a missing one.
pub fn router() -> Router {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/:id", put(update_task).delete(delete_task))
}

pub async fn list_tasks(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
) -> axum::response::Response {
    match services.tasks.list_for_user(ctx.user_id()).await {
        Ok(tasks) => Json(tasks.iter().map(dto::task_to_json).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<NewTask>,
) -> axum::response::Response {
    let task = match Task::create(ctx.user_id(), body, Utc::now()) {
        Ok(t) => t,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.tasks.insert(task).await {
        Ok(task) => (StatusCode::CREATED, Json(dto::task_to_json(&task))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> axum::response::Response {
    let id: TaskId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid task id"),
    };

    let mut task = match owned_task(&services, id, &ctx).await {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    if let Err(e) = task.apply_patch(patch) {
        return errors::domain_error_to_response(e);
    }

    match services.tasks.replace(task).await {
        Ok(Some(task)) => Json(dto::task_to_json(&task)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "task not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TaskId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid task id"),
    };

    if let Err(resp) = owned_task(&services, id, &ctx).await {
        return resp;
    }

    match services.tasks.delete(id).await {
        Ok(Some(_)) => Json(serde_json::json!({ "message": "task deleted" })).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "task not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn owned_task(
    services: &AppServices,
    id: TaskId,
    ctx: &AuthContext,
) -> Result<Task, axum::response::Response> {
    match services.tasks.get(id).await {
        Ok(Some(task)) if task.user_id == ctx.user_id() => Ok(task),
        Ok(_) => Err(errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            "task not found",
        )),
        Err(e) => Err(errors::store_error_to_response(e)),
    }
}
