use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;

use stocky_auth::{hash_password, verify_password, Hs256TokenCodec, NewUser, UserAccount};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterRequest>,
) -> axum::response::Response {
    let new = NewUser {
        username: body.username,
        email: body.email,
        password: body.password,
        // Self-registration never grants elevated roles.
        role: None,
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
                "registration failed",
            );
        }
    };

    let account = match UserAccount::register(new, password_hash, Utc::now()) {
        Ok(a) => a,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let account = match services.users.insert(account).await {
        Ok(a) => a,
        Err(stocky_infra::StoreError::Duplicate(_)) => {
            return errors::json_error(
                StatusCode::CONFLICT,
                "duplicate_key",
                "username or email already exists",
            );
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    (StatusCode::CREATED, Json(dto::user_to_json(&account))).into_response()
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(codec): Extension<Arc<Hs256TokenCodec>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "username and password are required",
        );
    }

    let account = match services.users.find_by_username(&body.username).await {
        Ok(Some(a)) => a,
        // Same response for unknown user and bad password.
        Ok(None) => return invalid_credentials(),
        Err(e) => return errors::store_error_to_response(e),
    };

    match verify_password(&body.password, &account.password_hash) {
        Ok(true) => {}
        Ok(false) => return invalid_credentials(),
        Err(e) => {
            tracing::error!(error = %e, "password verification failed");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "hash_error",
                "login failed",
            );
        }
    }

    let pair = match codec.issue_pair(&account, Utc::now()) {
        Ok(p) => p,
        Err(_) => {
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_error",
                "login failed",
            );
        }
    };

    Json(serde_json::json!({
        "token": pair.access,
        "refresh_token": pair.refresh,
        "user": dto::user_to_json(&account),
    }))
    .into_response()
}

pub async fn refresh(
    Extension(codec): Extension<Arc<Hs256TokenCodec>>,
    Json(body): Json<dto::RefreshRequest>,
) -> axum::response::Response {
    let claims = match codec.decode(&body.refresh_token) {
        Ok(c) => c,
        Err(_) => {
            return errors::json_error(
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "refresh token invalid or expired",
            );
        }
    };

    match codec.refresh_access(&claims, Utc::now()) {
        Ok(token) => Json(serde_json::json!({ "token": token })).into_response(),
        Err(_) => errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "token_error",
            "token refresh failed",
        ),
    }
}

fn invalid_credentials() -> axum::response::Response {
    errors::json_error(
        StatusCode::UNAUTHORIZED,
        "invalid_credentials",
        "incorrect username or password",
    )
}
