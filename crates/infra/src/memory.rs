//! In-memory stores for dev and tests.
//!
//! One mutex around the whole state gives the same externally observable
//! atomicity as the Postgres transaction: `place_order` mutates a copy and
//! swaps it in only when every step succeeded, so a failed checkout leaves
//! stock, cart and orders exactly as they were.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use agrostore_cart::{CartItem, CartView, CartViewRow, NewCartItem, Quantity};
use agrostore_catalog::{
    LowStockRow, Presentation, Product, ProductWithPresentations, StockLevel,
};
use agrostore_core::{CartItemId, OrderId, PresentationId, UserId};
use agrostore_orders::{
    CheckoutError, CheckoutRequest, CheckoutResult, Order, OrderItem, OrderReceipt, OrderWithItems,
};

use crate::store::{CartStore, CatalogStore, OrderStore, StoreError, StoreResult};

#[derive(Debug, Clone)]
struct StoredCheckoutKey {
    fingerprint: String,
    receipt: OrderReceipt,
}

#[derive(Debug, Default, Clone)]
struct State {
    products: Vec<Product>,
    presentations: HashMap<PresentationId, Presentation>,
    cart: Vec<CartItem>,
    /// Oldest first; listing reverses.
    orders: Vec<OrderWithItems>,
    checkout_keys: HashMap<(UserId, String), StoredCheckoutKey>,
}

/// In-memory implementation of all three storage ports.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_product(&self, product: Product) {
        self.state.lock().unwrap().products.push(product);
    }

    pub fn seed_presentation(&self, presentation: Presentation) {
        self.state
            .lock()
            .unwrap()
            .presentations
            .insert(presentation.id, presentation);
    }

    /// Current stock of a presentation, for assertions.
    pub fn presentation_stock(&self, id: PresentationId) -> Option<i64> {
        self.state
            .lock()
            .unwrap()
            .presentations
            .get(&id)
            .map(|p| p.stock)
    }

    pub fn order_count(&self) -> usize {
        self.state.lock().unwrap().orders.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn place_order(
        &self,
        user_id: UserId,
        request: &CheckoutRequest,
    ) -> CheckoutResult<OrderReceipt> {
        let mut state = self.state.lock().unwrap();
        let fingerprint = request.fingerprint(user_id);

        if let Some(key) = request.idempotency_key() {
            if let Some(stored) = state
                .checkout_keys
                .get(&(user_id, key.as_str().to_string()))
            {
                if stored.fingerprint != fingerprint {
                    return Err(CheckoutError::conflict(
                        "idempotency key already used with a different payload",
                    ));
                }
                return Ok(stored.receipt);
            }
        }

        // Work on a copy; swap in only if every line clears.
        let mut next = state.clone();
        for line in request.line_items() {
            let presentation = next
                .presentations
                .get_mut(&line.presentation_id)
                .ok_or(CheckoutError::NotFound(line.presentation_id))?;
            if presentation.price != line.price {
                return Err(CheckoutError::validation(format!(
                    "price changed for presentation {}: client sent {}, catalog has {}",
                    line.presentation_id, line.price, presentation.price,
                )));
            }
            if presentation.stock < line.quantity {
                return Err(CheckoutError::InsufficientStock {
                    presentation_id: line.presentation_id,
                    requested: line.quantity,
                    available: presentation.stock,
                });
            }
            presentation.stock -= line.quantity;
        }

        let order_id = OrderId::new();
        let items = request
            .line_items()
            .iter()
            .map(|line| OrderItem {
                order_id,
                product_id: line.product_id,
                presentation_id: line.presentation_id,
                quantity: line.quantity,
                price: line.price,
            })
            .collect();

        next.cart.retain(|item| item.user_id != user_id);
        next.orders.push(OrderWithItems {
            order: Order {
                id: order_id,
                user_id,
                total: request.total(),
                created_at: Utc::now(),
            },
            items,
        });

        let receipt = OrderReceipt {
            order_id,
            total: request.total(),
        };
        if let Some(key) = request.idempotency_key() {
            next.checkout_keys.insert(
                (user_id, key.as_str().to_string()),
                StoredCheckoutKey {
                    fingerprint,
                    receipt,
                },
            );
        }

        *state = next;
        Ok(receipt)
    }

    async fn list_orders(&self, user_id: UserId) -> CheckoutResult<Vec<OrderWithItems>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .orders
            .iter()
            .rev()
            .filter(|o| o.order.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn cart_view(&self, user_id: UserId) -> StoreResult<CartView> {
        let state = self.state.lock().unwrap();
        let mut items = Vec::new();
        for cart_item in state.cart.iter().filter(|c| c.user_id == user_id) {
            let presentation = state
                .presentations
                .get(&cart_item.presentation_id)
                .ok_or(StoreError::NotFound)?;
            let product_name = state
                .products
                .iter()
                .find(|p| p.id == presentation.product_id)
                .map(|p| p.name.clone())
                .unwrap_or_default();
            items.push(CartViewRow {
                id: cart_item.id,
                presentation_id: cart_item.presentation_id,
                product_name,
                kind: presentation.kind.clone(),
                size: presentation.size.clone(),
                unit_price: presentation.price,
                quantity: cart_item.quantity,
            });
        }
        Ok(CartView { items })
    }

    async fn add_item(&self, user_id: UserId, item: NewCartItem) -> StoreResult<CartItem> {
        let mut state = self.state.lock().unwrap();
        if !state.presentations.contains_key(&item.presentation_id) {
            return Err(StoreError::NotFound);
        }
        let cart_item = CartItem {
            id: CartItemId::new(),
            user_id,
            presentation_id: item.presentation_id,
            quantity: item.quantity.value(),
            added_at: Utc::now(),
        };
        state.cart.push(cart_item.clone());
        Ok(cart_item)
    }

    async fn update_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: Quantity,
    ) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        let item = state
            .cart
            .iter_mut()
            .find(|c| c.id == item_id && c.user_id == user_id)
            .ok_or(StoreError::NotFound)?;
        item.quantity = quantity.value();
        Ok(())
    }

    async fn remove_item(&self, user_id: UserId, item_id: CartItemId) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.cart.len();
        state
            .cart
            .retain(|c| !(c.id == item_id && c.user_id == user_id));
        if state.cart.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn list_products(&self) -> StoreResult<Vec<ProductWithPresentations>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .products
            .iter()
            .map(|product| ProductWithPresentations {
                product: product.clone(),
                presentations: state
                    .presentations
                    .values()
                    .filter(|p| p.product_id == product.id)
                    .cloned()
                    .collect(),
            })
            .collect())
    }

    async fn set_stock(&self, id: PresentationId, stock: StockLevel) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        let presentation = state.presentations.get_mut(&id).ok_or(StoreError::NotFound)?;
        presentation.stock = stock.value();
        Ok(())
    }

    async fn low_stock(&self, threshold: i64) -> StoreResult<Vec<LowStockRow>> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<LowStockRow> = state
            .presentations
            .values()
            .filter(|p| p.is_low_stock(threshold))
            .map(|p| LowStockRow {
                presentation_id: p.id,
                product_name: state
                    .products
                    .iter()
                    .find(|product| product.id == p.product_id)
                    .map(|product| product.name.clone())
                    .unwrap_or_default(),
                kind: p.kind.clone(),
                size: p.size.clone(),
                stock: p.stock,
            })
            .collect();
        rows.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.product_name.cmp(&b.product_name)));
        Ok(rows)
    }
}
