use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agrostore_core::{CartItemId, DomainError, DomainResult, Money, PresentationId, UserId};

/// An item quantity, validated to be strictly positive at construction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(i64);

impl Quantity {
    pub fn new(value: i64) -> DomainResult<Self> {
        if value <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

/// A stored cart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub presentation_id: PresentationId,
    pub quantity: i64,
    pub added_at: DateTime<Utc>,
}

/// Input for adding a presentation to a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    pub presentation_id: PresentationId,
    pub quantity: Quantity,
}

/// Cart row joined with catalog data, as returned to the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartViewRow {
    pub id: CartItemId,
    pub presentation_id: PresentationId,
    pub product_name: String,
    pub kind: String,
    pub size: String,
    pub unit_price: Money,
    pub quantity: i64,
}

/// The whole cart as the storefront renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartViewRow>,
}

impl CartView {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_rejects_zero_and_negative() {
        assert!(Quantity::new(0).is_err());
        assert!(Quantity::new(-3).is_err());
        assert_eq!(Quantity::new(2).unwrap().value(), 2);
    }
}
