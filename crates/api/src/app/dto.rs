use serde::Deserialize;

use agrostore_core::Money;
use agrostore_orders::{CheckoutError, CheckoutRequest, IdempotencyKey, LineItem};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderLineRequest>,
    pub idempotency_key: Option<String>,
}

/// One checkout line as the client sends it. `price` is minor units (cents).
#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub presentation_id: String,
    pub quantity: i64,
    pub price: i64,
}

#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest {
    pub presentation_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetStockRequest {
    pub stock: i64,
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i64>,
}

impl PlaceOrderRequest {
    /// Parse ids and validate into a domain checkout request.
    pub fn into_checkout(self) -> Result<CheckoutRequest, CheckoutError> {
        let key = self.idempotency_key.map(IdempotencyKey::new).transpose()?;
        let items = self
            .items
            .into_iter()
            .enumerate()
            .map(|(index, line)| {
                Ok(LineItem {
                    product_id: line
                        .product_id
                        .parse()
                        .map_err(|_| CheckoutError::validation(format!("line {index}: invalid product id")))?,
                    presentation_id: line
                        .presentation_id
                        .parse()
                        .map_err(|_| CheckoutError::validation(format!("line {index}: invalid presentation id")))?,
                    quantity: line.quantity,
                    price: Money::from_minor(line.price),
                })
            })
            .collect::<Result<Vec<_>, CheckoutError>>()?;
        CheckoutRequest::new(items, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrostore_core::{PresentationId, ProductId};

    fn raw_line(qty: i64, price: i64) -> OrderLineRequest {
        OrderLineRequest {
            product_id: ProductId::new().to_string(),
            presentation_id: PresentationId::new().to_string(),
            quantity: qty,
            price,
        }
    }

    #[test]
    fn valid_request_maps_to_checkout_with_total() {
        let request = PlaceOrderRequest {
            items: vec![raw_line(2, 1000), raw_line(1, 500)],
            idempotency_key: Some("retry-1".to_string()),
        };
        let checkout = request.into_checkout().unwrap();
        assert_eq!(checkout.total(), Money::from_minor(2500));
        assert!(checkout.idempotency_key().is_some());
    }

    #[test]
    fn bad_ids_and_bad_quantities_are_validation_errors() {
        let mut bad_id = PlaceOrderRequest {
            items: vec![raw_line(1, 100)],
            idempotency_key: None,
        };
        bad_id.items[0].presentation_id = "nope".to_string();
        assert!(matches!(bad_id.into_checkout(), Err(CheckoutError::Validation(_))));

        let bad_qty = PlaceOrderRequest {
            items: vec![raw_line(0, 100)],
            idempotency_key: None,
        };
        assert!(matches!(bad_qty.into_checkout(), Err(CheckoutError::Validation(_))));
    }
}
