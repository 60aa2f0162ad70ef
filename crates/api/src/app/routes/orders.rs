use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/add", post(place_order))
}

pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::PlaceOrderRequest>,
) -> axum::response::Response {
    let request = match body.into_checkout() {
        Ok(request) => request,
        Err(e) => return errors::checkout_error_to_response(e),
    };

    match services.orders.place_order(principal.user_id(), &request).await {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(e) => errors::checkout_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.orders.list_orders(principal.user_id()).await {
        Ok(orders) => Json(orders).into_response(),
        Err(e) => errors::checkout_error_to_response(e),
    }
}
