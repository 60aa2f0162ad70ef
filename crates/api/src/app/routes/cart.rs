use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};

use agrostore_cart::{NewCartItem, Quantity};
use agrostore_core::CartItemId;

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/cart", get(get_cart))
        .route("/cart/add", post(add_to_cart))
        .route("/cart/update/:id", put(update_cart_item))
        .route("/cart/delete/:id", delete(delete_cart_item))
}

pub async fn get_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.cart.cart_view(principal.user_id()).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn add_to_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::AddCartItemRequest>,
) -> axum::response::Response {
    let presentation_id = match body.presentation_id.parse() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid presentation id")
        }
    };
    let quantity = match Quantity::new(body.quantity) {
        Ok(q) => q,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };

    let item = NewCartItem {
        presentation_id,
        quantity,
    };
    match services.cart.add_item(principal.user_id(), item).await {
        Ok(stored) => (StatusCode::CREATED, Json(stored)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_cart_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateCartItemRequest>,
) -> axum::response::Response {
    let item_id: CartItemId = match id.parse() {
        Ok(id) => id,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid cart item id"),
    };
    let quantity = match Quantity::new(body.quantity) {
        Ok(q) => q,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };

    match services
        .cart
        .update_quantity(principal.user_id(), item_id, quantity)
        .await
    {
        Ok(()) => Json(serde_json::json!({"message": "quantity updated"})).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_cart_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let item_id: CartItemId = match id.parse() {
        Ok(id) => id,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid cart item id"),
    };

    match services.cart.remove_item(principal.user_id(), item_id).await {
        Ok(()) => Json(serde_json::json!({"message": "item removed"})).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
