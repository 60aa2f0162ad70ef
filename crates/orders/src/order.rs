use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agrostore_core::{Money, OrderId, PresentationId, ProductId, UserId};

/// A committed order.
///
/// Immutable after creation: the total and the captured item prices are frozen
/// at checkout time, never live-joined against the catalog afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total: Money,
    pub created_at: DateTime<Utc>,
}

/// One line of a committed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub presentation_id: PresentationId,
    pub quantity: i64,
    /// Unit price captured at order time.
    pub price: Money,
}

/// An order joined with its line items, as returned by order listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderWithItems {
    /// The recomputed item sum; equals `order.total` for any committed order.
    pub fn item_sum(&self) -> Option<Money> {
        self.items.iter().try_fold(Money::ZERO, |acc, item| {
            acc.checked_add(item.price.checked_mul_quantity(item.quantity)?)
        })
    }
}

/// What the caller gets back from a successful (or replayed) checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub total: Money,
}
