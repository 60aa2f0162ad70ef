//! End-to-end checkout behavior against the in-memory stores.

use std::sync::Arc;

use chrono::Utc;

use agrostore_cart::{NewCartItem, Quantity};
use agrostore_catalog::{Presentation, Product, StockLevel, DEFAULT_LOW_STOCK_THRESHOLD};
use agrostore_core::{Money, PresentationId, ProductId, UserId};
use agrostore_orders::{CheckoutError, CheckoutRequest, IdempotencyKey, LineItem};

use crate::memory::InMemoryStore;
use crate::store::{CartStore, CatalogStore, OrderStore, StoreError};

struct Fixture {
    store: Arc<InMemoryStore>,
    product_id: ProductId,
    p1: PresentationId,
    p2: PresentationId,
}

/// One product, two presentations: P1 at 10.00 with stock 10, P2 at 5.00 with
/// stock 3 (the worked example from the storefront's checkout contract).
fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let product_id = ProductId::new();
    store.seed_product(Product {
        id: product_id,
        name: "Glyphosate Pro".to_string(),
        category: "herbicide".to_string(),
        description: None,
        image: None,
        created_at: Utc::now(),
    });

    let p1 = PresentationId::new();
    let p2 = PresentationId::new();
    store.seed_presentation(Presentation {
        id: p1,
        product_id,
        kind: "liquid".to_string(),
        size: "1L".to_string(),
        price: Money::from_minor(1000),
        stock: 10,
    });
    store.seed_presentation(Presentation {
        id: p2,
        product_id,
        kind: "liquid".to_string(),
        size: "5L".to_string(),
        price: Money::from_minor(500),
        stock: 3,
    });

    Fixture {
        store,
        product_id,
        p1,
        p2,
    }
}

fn line(f: &Fixture, presentation: PresentationId, qty: i64, minor: i64) -> LineItem {
    LineItem {
        product_id: f.product_id,
        presentation_id: presentation,
        quantity: qty,
        price: Money::from_minor(minor),
    }
}

#[tokio::test]
async fn checkout_commits_order_stock_and_cart_together() {
    let f = fixture();
    let user = UserId::new();

    f.store
        .add_item(
            user,
            NewCartItem {
                presentation_id: f.p1,
                quantity: Quantity::new(2).unwrap(),
            },
        )
        .await
        .unwrap();

    let request = CheckoutRequest::new(
        vec![line(&f, f.p1, 2, 1000), line(&f, f.p2, 1, 500)],
        None,
    )
    .unwrap();
    let receipt = f.store.place_order(user, &request).await.unwrap();

    assert_eq!(receipt.total, Money::from_minor(2500));
    assert_eq!(f.store.presentation_stock(f.p1), Some(8));
    assert_eq!(f.store.presentation_stock(f.p2), Some(2));
    assert!(f.store.cart_view(user).await.unwrap().is_empty());

    let orders = f.store.list_orders(user).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order.id, receipt.order_id);
    assert_eq!(orders[0].items.len(), 2);
    assert_eq!(orders[0].item_sum(), Some(orders[0].order.total));
}

#[tokio::test]
async fn insufficient_stock_leaves_no_trace() {
    let f = fixture();
    let user = UserId::new();
    f.store.set_stock(f.p2, StockLevel::new(0).unwrap()).await.unwrap();

    f.store
        .add_item(
            user,
            NewCartItem {
                presentation_id: f.p1,
                quantity: Quantity::new(2).unwrap(),
            },
        )
        .await
        .unwrap();

    let request = CheckoutRequest::new(
        vec![line(&f, f.p1, 2, 1000), line(&f, f.p2, 1, 500)],
        None,
    )
    .unwrap();
    let err = f.store.place_order(user, &request).await.unwrap_err();

    match err {
        CheckoutError::InsufficientStock {
            presentation_id,
            requested,
            available,
        } => {
            assert_eq!(presentation_id, f.p2);
            assert_eq!(requested, 1);
            assert_eq!(available, 0);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // Full rollback: earlier lines undone, cart intact, no order row.
    assert_eq!(f.store.presentation_stock(f.p1), Some(10));
    assert_eq!(f.store.cart_view(user).await.unwrap().items.len(), 1);
    assert_eq!(f.store.order_count(), 0);
}

#[tokio::test]
async fn unknown_presentation_fails_whole_checkout() {
    let f = fixture();
    let user = UserId::new();
    let ghost = PresentationId::new();

    let request = CheckoutRequest::new(
        vec![line(&f, f.p1, 1, 1000), line(&f, ghost, 1, 500)],
        None,
    )
    .unwrap();
    let err = f.store.place_order(user, &request).await.unwrap_err();

    assert_eq!(err, CheckoutError::NotFound(ghost));
    assert_eq!(f.store.presentation_stock(f.p1), Some(10));
    assert_eq!(f.store.order_count(), 0);
}

#[tokio::test]
async fn stale_client_price_fails_with_no_mutation() {
    let f = fixture();
    let user = UserId::new();

    // Client still quotes 9.00 after a price change to 10.00.
    let request = CheckoutRequest::new(vec![line(&f, f.p1, 1, 900)], None).unwrap();
    let err = f.store.place_order(user, &request).await.unwrap_err();

    assert!(matches!(err, CheckoutError::Validation(_)));
    assert_eq!(f.store.presentation_stock(f.p1), Some(10));
    assert_eq!(f.store.order_count(), 0);
}

#[tokio::test]
async fn replaying_a_checkout_returns_the_original_receipt() {
    let f = fixture();
    let user = UserId::new();
    let key = IdempotencyKey::new("retry-42").unwrap();

    let request = CheckoutRequest::new(vec![line(&f, f.p1, 2, 1000)], Some(key.clone())).unwrap();
    let first = f.store.place_order(user, &request).await.unwrap();
    let second = f.store.place_order(user, &request).await.unwrap();

    assert_eq!(first.order_id, second.order_id);
    assert_eq!(first.total, second.total);
    // No second order, no double decrement.
    assert_eq!(f.store.order_count(), 1);
    assert_eq!(f.store.presentation_stock(f.p1), Some(8));
}

#[tokio::test]
async fn reusing_a_key_with_a_different_payload_conflicts() {
    let f = fixture();
    let user = UserId::new();
    let key = IdempotencyKey::new("retry-42").unwrap();

    let first = CheckoutRequest::new(vec![line(&f, f.p1, 2, 1000)], Some(key.clone())).unwrap();
    f.store.place_order(user, &first).await.unwrap();

    let changed = CheckoutRequest::new(vec![line(&f, f.p1, 3, 1000)], Some(key)).unwrap();
    let err = f.store.place_order(user, &changed).await.unwrap_err();

    assert!(matches!(err, CheckoutError::Conflict(_)));
    assert_eq!(f.store.order_count(), 1);
    assert_eq!(f.store.presentation_stock(f.p1), Some(8));
}

#[tokio::test]
async fn concurrent_checkouts_never_overdraw_stock() {
    let f = fixture();
    f.store.set_stock(f.p1, StockLevel::new(3).unwrap()).await.unwrap();

    // Two users each want 2 units of a presentation with stock 3: exactly one
    // checkout can succeed.
    let mut handles = Vec::new();
    for _ in 0..2 {
        let store = Arc::clone(&f.store);
        let request = CheckoutRequest::new(vec![line(&f, f.p1, 2, 1000)], None).unwrap();
        handles.push(tokio::spawn(async move {
            store.place_order(UserId::new(), &request).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(f.store.presentation_stock(f.p1), Some(1));
}

#[tokio::test]
async fn orders_list_newest_first_with_contiguous_items() {
    let f = fixture();
    let user = UserId::new();

    let first = CheckoutRequest::new(vec![line(&f, f.p1, 1, 1000)], None).unwrap();
    let second = CheckoutRequest::new(
        vec![line(&f, f.p1, 1, 1000), line(&f, f.p2, 1, 500)],
        None,
    )
    .unwrap();
    let r1 = f.store.place_order(user, &first).await.unwrap();
    let r2 = f.store.place_order(user, &second).await.unwrap();

    let orders = f.store.list_orders(user).await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].order.id, r2.order_id);
    assert_eq!(orders[1].order.id, r1.order_id);
    assert!(orders[0].items.iter().all(|i| i.order_id == r2.order_id));
}

#[tokio::test]
async fn cart_rows_are_invisible_across_users() {
    let f = fixture();
    let alice = UserId::new();
    let bob = UserId::new();

    let item = f
        .store
        .add_item(
            alice,
            NewCartItem {
                presentation_id: f.p1,
                quantity: Quantity::new(1).unwrap(),
            },
        )
        .await
        .unwrap();

    assert!(f.store.cart_view(bob).await.unwrap().is_empty());
    let err = f
        .store
        .update_quantity(bob, item.id, Quantity::new(5).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
    let err = f.store.remove_item(bob, item.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound));

    // The owner still can.
    f.store
        .update_quantity(alice, item.id, Quantity::new(5).unwrap())
        .await
        .unwrap();
    f.store.remove_item(alice, item.id).await.unwrap();
}

#[tokio::test]
async fn low_stock_report_respects_threshold() {
    let f = fixture();

    let rows = f.store.low_stock(DEFAULT_LOW_STOCK_THRESHOLD).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].presentation_id, f.p2);
    assert_eq!(rows[0].stock, 3);
    assert_eq!(rows[0].product_name, "Glyphosate Pro");

    let rows = f.store.low_stock(10).await.unwrap();
    assert_eq!(rows.len(), 2);
}
