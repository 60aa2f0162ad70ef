use axum::Router;

pub mod cart;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod system;

/// Router for all authenticated storefront endpoints.
pub fn router() -> Router {
    Router::new()
        .merge(products::router())
        .merge(cart::router())
        .merge(orders::router())
        .merge(inventory::router())
}
