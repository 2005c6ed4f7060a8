use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;

use stocky_auth::{hash_password, NewUser, UserAccount, UserPatch};
use stocky_core::UserId;
use stocky_infra::StoreError;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::AuthContext;

/// User management is admin-only.
pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", put(update_user).delete(delete_user))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
) -> axum::response::Response {
    if let Err(resp) = errors::require_admin(&ctx) {
        return resp;
    }
    let mut users = match services.users.list().await {
        Ok(u) => u,
        Err(e) => return errors::store_error_to_response(e),
    };
    users.sort_by(|a, b| a.username.cmp(&b.username));

    Json(users.iter().map(dto::user_to_json).collect::<Vec<_>>()).into_response()
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<dto::CreateUserRequest>,
) -> axum::response::Response {
    if let Err(resp) = errors::require_admin(&ctx) {
        return resp;
    }

    let new = NewUser {
        username: body.username,
        email: body.email,
        password: body.password,
        role: body.role,
    };
    if let Err(e) = new.validate() {
        return errors::domain_error_to_response(e);
    }

    let password_hash = match hash_password(&new.password) {
        Ok(h) => h,
        Err(e) => {
            tracing::error!(error = %e, "password hashing failed");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "hash_error",
                "user creation failed",
            );
        }
    };

    let account = match UserAccount::register(new, password_hash, Utc::now()) {
        Ok(a) => a,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.users.insert(account).await {
        Ok(account) => (StatusCode::CREATED, Json(dto::user_to_json(&account))).into_response(),
        Err(StoreError::Duplicate(_)) => errors::json_error(
            StatusCode::CONFLICT,
            "duplicate_key",
            "username or email already exists",
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateUserRequest>,
) -> axum::response::Response {
    if let Err(resp) = errors::require_admin(&ctx) {
        return resp;
    }

    let id: UserId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id"),
    };

    let password_hash = match body.password {
        Some(password) if !password.is_empty() => match hash_password(&password) {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::error!(error = %e, "password hashing failed");
                return errors::json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "hash_error",
                    "user update failed",
                );
            }
        },
        _ => None,
    };

    let mut account = match services.users.get(id).await {
        Ok(Some(a)) => a,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => return errors::store_error_to_response(e),
    };

    let patch = UserPatch {
        username: body.username,
        email: body.email,
        password_hash,
        role: body.role,
    };
    if let Err(e) = account.apply_patch(patch, Utc::now()) {
        return errors::domain_error_to_response(e);
    }

    match services.users.replace(account).await {
        Ok(Some(account)) => Json(dto::user_to_json(&account)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(StoreError::Duplicate(_)) => errors::json_error(
            StatusCode::CONFLICT,
            "duplicate_key",
            "username or email already exists",
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = errors::require_admin(&ctx) {
        return resp;
    }

    let id: UserId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id"),
    };
    match services.users.delete(id).await {
        Ok(Some(_)) => Json(serde_json::json!({ "message": "user deleted" })).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}
