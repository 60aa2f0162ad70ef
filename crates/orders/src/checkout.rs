//! Checkout input validation, total computation and idempotency fingerprints.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use agrostore_core::{Money, PresentationId, ProductId, UserId};

use crate::error::{CheckoutError, CheckoutResult};

/// Longest accepted client-supplied idempotency key.
const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// One line of a checkout request: what the cart says the user is buying.
///
/// The price is the client's snapshot; the unit of work re-reads the live
/// catalog price and rejects the whole checkout if they differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub presentation_id: PresentationId,
    pub quantity: i64,
    pub price: Money,
}

impl LineItem {
    fn validate(&self, index: usize) -> CheckoutResult<()> {
        if self.quantity <= 0 {
            return Err(CheckoutError::validation(format!(
                "line {index}: quantity must be positive, got {}",
                self.quantity
            )));
        }
        if self.price.is_negative() {
            return Err(CheckoutError::validation(format!(
                "line {index}: price cannot be negative"
            )));
        }
        Ok(())
    }

    /// Line subtotal with overflow surfaced as a validation failure.
    pub fn subtotal(&self) -> CheckoutResult<Money> {
        self.price
            .checked_mul_quantity(self.quantity)
            .ok_or_else(|| CheckoutError::validation("line subtotal overflows"))
    }
}

/// A caller-supplied token identifying one logical checkout, so client
/// retries are deduplicated instead of double-charged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn new(key: impl Into<String>) -> CheckoutResult<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(CheckoutError::validation("idempotency key cannot be empty"));
        }
        if key.len() > MAX_IDEMPOTENCY_KEY_LEN {
            return Err(CheckoutError::validation(format!(
                "idempotency key exceeds {MAX_IDEMPOTENCY_KEY_LEN} bytes"
            )));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A validated checkout: non-empty line items, all quantities positive, no
/// negative prices, total within range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    line_items: Vec<LineItem>,
    total: Money,
    idempotency_key: Option<IdempotencyKey>,
}

impl CheckoutRequest {
    /// Validate raw line items and compute the fixed-point total.
    ///
    /// Detected before any mutation; a failure here has no partial effect.
    pub fn new(
        line_items: Vec<LineItem>,
        idempotency_key: Option<IdempotencyKey>,
    ) -> CheckoutResult<Self> {
        if line_items.is_empty() {
            return Err(CheckoutError::validation("order must contain at least one item"));
        }
        for (index, item) in line_items.iter().enumerate() {
            item.validate(index)?;
        }
        let total = compute_total(&line_items)?;
        Ok(Self {
            line_items,
            total,
            idempotency_key,
        })
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// The exact fixed-point sum of `quantity * price` over all lines.
    pub fn total(&self) -> Money {
        self.total
    }

    pub fn idempotency_key(&self) -> Option<&IdempotencyKey> {
        self.idempotency_key.as_ref()
    }

    /// Fingerprint of the logical checkout payload.
    ///
    /// Stored next to the idempotency key: a replay with the same key and the
    /// same fingerprint returns the original receipt, the same key with a
    /// different fingerprint is a conflict. Line order does not matter, so a
    /// client re-sorting its cart still counts as the same checkout.
    pub fn fingerprint(&self, user_id: UserId) -> String {
        let mut lines: Vec<&LineItem> = self.line_items.iter().collect();
        lines.sort_by_key(|l| {
            (*l.presentation_id.as_uuid(), *l.product_id.as_uuid(), l.quantity, l.price.minor())
        });

        let mut hasher = Sha256::new();
        hasher.update(user_id.as_uuid().as_bytes());
        for line in lines {
            hasher.update(line.product_id.as_uuid().as_bytes());
            hasher.update(line.presentation_id.as_uuid().as_bytes());
            hasher.update(line.quantity.to_be_bytes());
            hasher.update(line.price.minor().to_be_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// Exact fixed-point sum of `quantity * price`; overflow is a validation error.
pub fn compute_total(line_items: &[LineItem]) -> CheckoutResult<Money> {
    line_items.iter().try_fold(Money::ZERO, |acc, item| {
        acc.checked_add(item.subtotal()?)
            .ok_or_else(|| CheckoutError::validation("order total overflows"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(qty: i64, minor: i64) -> LineItem {
        LineItem {
            product_id: ProductId::new(),
            presentation_id: PresentationId::new(),
            quantity: qty,
            price: Money::from_minor(minor),
        }
    }

    #[test]
    fn total_sums_quantity_times_price() {
        // 2 x 10.00 + 1 x 5.00 = 25.00
        let request = CheckoutRequest::new(vec![line(2, 1000), line(1, 500)], None).unwrap();
        assert_eq!(request.total(), Money::from_minor(2500));
    }

    #[test]
    fn empty_cart_is_rejected() {
        let err = CheckoutRequest::new(vec![], None).unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        for qty in [0, -1] {
            let err = CheckoutRequest::new(vec![line(qty, 1000)], None).unwrap_err();
            assert!(matches!(err, CheckoutError::Validation(_)));
        }
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = CheckoutRequest::new(vec![line(1, -100)], None).unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
    }

    #[test]
    fn overflowing_total_is_rejected() {
        let items = vec![line(1, i64::MAX), line(1, 1)];
        let err = CheckoutRequest::new(items, None).unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
    }

    #[test]
    fn idempotency_key_bounds() {
        assert!(IdempotencyKey::new("").is_err());
        assert!(IdempotencyKey::new("k".repeat(129)).is_err());
        assert_eq!(IdempotencyKey::new("retry-1").unwrap().as_str(), "retry-1");
    }

    #[test]
    fn fingerprint_distinguishes_users_and_payloads() {
        let items = vec![line(2, 1000)];
        let request = CheckoutRequest::new(items.clone(), None).unwrap();
        let a = request.fingerprint(UserId::new());
        let b = request.fingerprint(UserId::new());
        assert_ne!(a, b);

        let mut changed = items;
        changed[0].quantity = 3;
        let other = CheckoutRequest::new(changed, None).unwrap();
        let user = UserId::new();
        assert_ne!(request.fingerprint(user), other.fingerprint(user));
    }

    proptest! {
        #[test]
        fn total_matches_exact_sum(
            lines in prop::collection::vec((1i64..1_000, 0i64..1_000_000), 1..20)
        ) {
            let items: Vec<LineItem> = lines.iter().map(|&(q, p)| line(q, p)).collect();
            let expected: i64 = lines.iter().map(|&(q, p)| q * p).sum();
            let request = CheckoutRequest::new(items, None).unwrap();
            prop_assert_eq!(request.total(), Money::from_minor(expected));
        }

        #[test]
        fn fingerprint_is_order_insensitive(
            lines in prop::collection::vec((1i64..1_000, 0i64..1_000_000), 2..10)
        ) {
            let items: Vec<LineItem> = lines.iter().map(|&(q, p)| line(q, p)).collect();
            let mut reversed = items.clone();
            reversed.reverse();

            let user = UserId::new();
            let a = CheckoutRequest::new(items, None).unwrap().fingerprint(user);
            let b = CheckoutRequest::new(reversed, None).unwrap().fingerprint(user);
            prop_assert_eq!(a, b);
        }
    }
}
