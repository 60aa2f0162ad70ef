use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};

use agrostore_catalog::{StockLevel, DEFAULT_LOW_STOCK_THRESHOLD};
use agrostore_core::PresentationId;

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/inventory/presentations/:id/stock", put(set_stock))
        .route("/inventory/low-stock", get(low_stock))
}

fn require_admin(principal: &PrincipalContext) -> Result<(), axum::response::Response> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "administrator role required",
        ))
    }
}

pub async fn set_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::SetStockRequest>,
) -> axum::response::Response {
    if let Err(response) = require_admin(&principal) {
        return response;
    }
    let presentation_id: PresentationId = match id.parse() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid presentation id")
        }
    };
    let stock = match StockLevel::new(body.stock) {
        Ok(s) => s,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };

    match services.catalog.set_stock(presentation_id, stock).await {
        Ok(()) => Json(serde_json::json!({"message": "stock updated"})).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn low_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::LowStockQuery>,
) -> axum::response::Response {
    if let Err(response) = require_admin(&principal) {
        return response;
    }
    let threshold = query.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);

    match services.catalog.low_stock(threshold).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
