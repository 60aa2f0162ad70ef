use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use agrostore_infra::StoreError;
use agrostore_orders::CheckoutError;

pub fn checkout_error_to_response(err: CheckoutError) -> axum::response::Response {
    match err {
        CheckoutError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        CheckoutError::NotFound(id) => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("presentation {id} not found"),
        ),
        CheckoutError::InsufficientStock { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "insufficient_stock", err.to_string())
        }
        CheckoutError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        CheckoutError::Storage(msg) => {
            tracing::error!(error = %msg, "checkout storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "storage failed; retry the whole operation",
            )
        }
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        StoreError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        StoreError::Storage(msg) => {
            tracing::error!(error = %msg, "storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", "storage failed")
        }
    }
}

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
