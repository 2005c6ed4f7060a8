use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stocky_core::DomainError;
use stocky_infra::{LedgerError, StoreError};

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::InsufficientStock {
            requested,
            available,
        } => json_error(
            StatusCode::BAD_REQUEST,
            "insufficient_stock",
            format!("insufficient stock: requested {requested}, available {available}"),
        ),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::Unauthorized => {
            json_error(StatusCode::FORBIDDEN, "unauthorized", "unauthorized")
        }
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Duplicate(msg) => json_error(StatusCode::BAD_REQUEST, "duplicate_key", msg),
        StoreError::StockConflict { expected, found } => json_error(
            StatusCode::CONFLICT,
            "conflict",
            format!("stale stock write: expected {expected}, found {found}"),
        ),
        StoreError::Backend(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    match err {
        LedgerError::NotFound => {
            json_error(StatusCode::NOT_FOUND, "not_found", "product not found")
        }
        LedgerError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        LedgerError::InsufficientStock {
            requested,
            available,
        } => json_error(
            StatusCode::BAD_REQUEST,
            "insufficient_stock",
            format!("insufficient stock: requested {requested}, available {available}"),
        ),
        LedgerError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        LedgerError::Timeout => json_error(
            StatusCode::GATEWAY_TIMEOUT,
            "timeout",
            "storage call exceeded deadline",
        ),
        // Distinct from a validation failure: the stock update was applied
        // but the audit entry was not persisted.
        LedgerError::MovementNotRecorded(msg) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "movement_not_recorded",
            msg,
        ),
        LedgerError::Storage(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}

/// Admin-only guard for user management routes.
pub fn require_admin(ctx: &crate::context::AuthContext) -> Result<(), axum::response::Response> {
    if ctx.is_admin() {
        Ok(())
    } else {
        Err(json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "admin role required",
        ))
    }
}
