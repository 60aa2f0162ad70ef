//! Storage port traits shared by the Postgres and in-memory implementations.

use async_trait::async_trait;

use agrostore_cart::{CartItem, CartView, NewCartItem, Quantity};
use agrostore_catalog::{LowStockRow, ProductWithPresentations, StockLevel};
use agrostore_core::{CartItemId, PresentationId, UserId};
use agrostore_orders::{CheckoutRequest, CheckoutResult, OrderReceipt, OrderWithItems};

/// Result type for cart/catalog storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage error for the simple (non-checkout) stores.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The row does not exist, or belongs to another user.
    #[error("not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

/// Order placement and retrieval.
///
/// `place_order` is the one multi-entity write in the system. Implementations
/// must commit the order row, its items, the stock decrements and the cart
/// clear together, or none of them, and must serialize concurrent decrements
/// of the same presentation so stock never goes negative.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Execute a validated checkout as one unit of work.
    ///
    /// When the request carries an idempotency key already recorded for this
    /// user with the same payload fingerprint, the original receipt is
    /// returned and nothing is re-executed.
    async fn place_order(
        &self,
        user_id: UserId,
        request: &CheckoutRequest,
    ) -> CheckoutResult<OrderReceipt>;

    /// All orders for a user joined with their items, newest order first,
    /// items contiguous per order.
    async fn list_orders(&self, user_id: UserId) -> CheckoutResult<Vec<OrderWithItems>>;
}

/// Per-user cart rows. Every mutation predicates on the owning user.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn cart_view(&self, user_id: UserId) -> StoreResult<CartView>;

    async fn add_item(&self, user_id: UserId, item: NewCartItem) -> StoreResult<CartItem>;

    async fn update_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: Quantity,
    ) -> StoreResult<()>;

    async fn remove_item(&self, user_id: UserId, item_id: CartItemId) -> StoreResult<()>;
}

/// Catalog reads and the admin-facing inventory operations.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_products(&self) -> StoreResult<Vec<ProductWithPresentations>>;

    /// Replace a presentation's stock count (admin path; the value is already
    /// validated non-negative).
    async fn set_stock(&self, id: PresentationId, stock: StockLevel) -> StoreResult<()>;

    /// Presentations at or under `threshold`, joined with their product name.
    async fn low_stock(&self, threshold: i64) -> StoreResult<Vec<LowStockRow>>;
}
