use serde::{Deserialize, Serialize};

use agrostore_core::{DomainError, DomainResult, Money, PresentationId, ProductId};

/// Presentations at or under this stock count show up in the low-stock report
/// when the caller supplies no threshold of their own.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// A sellable size/type variant of a product.
///
/// Stock is a plain counter with one invariant: it never goes negative. The
/// checkout path enforces this with a conditional decrement; the admin path
/// enforces it by validating replacement values up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub id: PresentationId,
    pub product_id: ProductId,
    /// Presentation type, e.g. "liquid" or "granular".
    pub kind: String,
    /// Package size, e.g. "1L" or "25kg".
    pub size: String,
    pub price: Money,
    pub stock: i64,
}

impl Presentation {
    /// Whether the current stock covers an order of `quantity` units.
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        quantity > 0 && self.stock >= quantity
    }

    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.stock <= threshold
    }
}

/// A replacement stock count, validated at construction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockLevel(i64);

impl StockLevel {
    pub fn new(value: i64) -> DomainResult<Self> {
        if value < 0 {
            return Err(DomainError::validation("stock cannot be negative"));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

/// Row of the low-stock report: presentation plus its product's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockRow {
    pub presentation_id: PresentationId,
    pub product_name: String,
    pub kind: String,
    pub size: String,
    pub stock: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presentation(stock: i64) -> Presentation {
        Presentation {
            id: PresentationId::new(),
            product_id: ProductId::new(),
            kind: "liquid".to_string(),
            size: "1L".to_string(),
            price: Money::from_minor(1000),
            stock,
        }
    }

    #[test]
    fn can_fulfill_requires_positive_quantity_within_stock() {
        let p = presentation(3);
        assert!(p.can_fulfill(3));
        assert!(!p.can_fulfill(4));
        assert!(!p.can_fulfill(0));
        assert!(!p.can_fulfill(-1));
    }

    #[test]
    fn stock_level_rejects_negative_values() {
        let err = StockLevel::new(-1).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(StockLevel::new(0).unwrap().value(), 0);
    }

    #[test]
    fn low_stock_uses_inclusive_threshold() {
        assert!(presentation(5).is_low_stock(DEFAULT_LOW_STOCK_THRESHOLD));
        assert!(!presentation(6).is_low_stock(DEFAULT_LOW_STOCK_THRESHOLD));
    }
}
