use axum::{http::StatusCode, response::IntoResponse, Json};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    axum::extract::Extension(ctx): axum::extract::Extension<crate::context::AuthContext>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "user_id": ctx.user_id().to_string(),
        "username": ctx.username(),
        "role": ctx.role().as_str(),
    }))
}
