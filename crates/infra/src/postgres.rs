//! Postgres-backed stores.
//!
//! All checkout writes go through one explicit sqlx transaction. The stock
//! decrement is a single conditional `UPDATE ... AND stock >= qty`, which both
//! enforces the non-negative invariant and takes the row lock that serializes
//! concurrent checkouts touching the same presentation.
//!
//! ## Error Mapping
//!
//! | SQLx error | Postgres code | Mapped to | Scenario |
//! |------------|---------------|-----------|----------|
//! | Database (unique violation) | `23505` | `Conflict` / replay lookup | Concurrent checkout with the same idempotency key |
//! | Database (foreign key violation) | `23503` | `NotFound` | Line references a presentation that no longer exists |
//! | anything else | any | `Storage` | Connection/commit failure; fully rolled back, retry whole operation |

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use agrostore_cart::{CartItem, CartView, CartViewRow, NewCartItem, Quantity};
use agrostore_catalog::{LowStockRow, Presentation, Product, ProductWithPresentations, StockLevel};
use agrostore_core::{CartItemId, Money, OrderId, PresentationId, ProductId, UserId};
use agrostore_orders::{
    CheckoutError, CheckoutRequest, CheckoutResult, Order, OrderItem, OrderReceipt, OrderWithItems,
};

use crate::store::{CartStore, CatalogStore, OrderStore, StoreError, StoreResult};

/// Postgres implementation of all three storage ports.
///
/// Thread-safe: the sqlx pool is `Send + Sync` and hands out connections per
/// operation. Clone freely; clones share the pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a small default pool. Schema comes from `migrations/`.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Look up a previously committed checkout for `(user, key)`.
    ///
    /// Returns the original receipt when the stored fingerprint matches, a
    /// conflict when the same key was used with a different payload.
    async fn replayed_checkout(
        &self,
        user_id: UserId,
        key: &str,
        fingerprint: &str,
    ) -> CheckoutResult<Option<OrderReceipt>> {
        let row = sqlx::query(
            r#"
            SELECT k.fingerprint, k.order_id, o.total
            FROM checkout_keys k
            JOIN orders o ON o.id = k.order_id
            WHERE k.user_id = $1 AND k.idempotency_key = $2
            "#,
        )
        .bind(*user_id.as_uuid())
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| checkout_storage("load_checkout_key", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let stored: String = row.get("fingerprint");
        if stored != fingerprint {
            return Err(CheckoutError::conflict(
                "idempotency key already used with a different payload",
            ));
        }
        Ok(Some(OrderReceipt {
            order_id: OrderId::from_uuid(row.get("order_id")),
            total: Money::from_minor(row.get("total")),
        }))
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    #[instrument(skip(self, request), fields(user_id = %user_id, lines = request.line_items().len()))]
    async fn place_order(
        &self,
        user_id: UserId,
        request: &CheckoutRequest,
    ) -> CheckoutResult<OrderReceipt> {
        let fingerprint = request.fingerprint(user_id);

        // Fast path: a retry of an already committed checkout.
        if let Some(key) = request.idempotency_key() {
            if let Some(receipt) = self
                .replayed_checkout(user_id, key.as_str(), &fingerprint)
                .await?
            {
                tracing::info!(order_id = %receipt.order_id, "checkout replayed from idempotency key");
                return Ok(receipt);
            }
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| checkout_storage("begin_transaction", e))?;

        let order_id = OrderId::new();
        sqlx::query("INSERT INTO orders (id, user_id, total) VALUES ($1, $2, $3)")
            .bind(*order_id.as_uuid())
            .bind(*user_id.as_uuid())
            .bind(request.total().minor())
            .execute(&mut *tx)
            .await
            .map_err(|e| checkout_storage("insert_order", e))?;

        for (line_no, line) in request.line_items().iter().enumerate() {
            let inserted = sqlx::query(
                r#"
                INSERT INTO order_items (order_id, line_no, product_id, presentation_id, quantity, price)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(*order_id.as_uuid())
            .bind(line_no as i32)
            .bind(*line.product_id.as_uuid())
            .bind(*line.presentation_id.as_uuid())
            .bind(line.quantity)
            .bind(line.price.minor())
            .execute(&mut *tx)
            .await;

            if let Err(e) = inserted {
                let err = if is_foreign_key_violation(&e) {
                    CheckoutError::NotFound(line.presentation_id)
                } else {
                    checkout_storage("insert_order_item", e)
                };
                tx.rollback()
                    .await
                    .map_err(|e| checkout_storage("rollback", e))?;
                return Err(err);
            }
        }

        // Conditional decrement: zero rows means missing row or short stock,
        // distinguished by a follow-up read inside the same transaction.
        for line in request.line_items() {
            let row = sqlx::query(
                r#"
                UPDATE presentations
                SET stock = stock - $1
                WHERE id = $2 AND stock >= $1
                RETURNING price
                "#,
            )
            .bind(line.quantity)
            .bind(*line.presentation_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| checkout_storage("decrement_stock", e))?;

            match row {
                Some(row) => {
                    let live_price: i64 = row.get("price");
                    if live_price != line.price.minor() {
                        tx.rollback()
                            .await
                            .map_err(|e| checkout_storage("rollback", e))?;
                        return Err(CheckoutError::validation(format!(
                            "price changed for presentation {}: client sent {}, catalog has {}",
                            line.presentation_id,
                            line.price,
                            Money::from_minor(live_price),
                        )));
                    }
                }
                None => {
                    let available: Option<i64> =
                        sqlx::query("SELECT stock FROM presentations WHERE id = $1")
                            .bind(*line.presentation_id.as_uuid())
                            .fetch_optional(&mut *tx)
                            .await
                            .map_err(|e| checkout_storage("read_stock", e))?
                            .map(|r| r.get("stock"));
                    tx.rollback()
                        .await
                        .map_err(|e| checkout_storage("rollback", e))?;
                    return Err(match available {
                        None => CheckoutError::NotFound(line.presentation_id),
                        Some(available) => CheckoutError::InsufficientStock {
                            presentation_id: line.presentation_id,
                            requested: line.quantity,
                            available,
                        },
                    });
                }
            }
        }

        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(*user_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| checkout_storage("clear_cart", e))?;

        if let Some(key) = request.idempotency_key() {
            let recorded = sqlx::query(
                r#"
                INSERT INTO checkout_keys (user_id, idempotency_key, fingerprint, order_id)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(*user_id.as_uuid())
            .bind(key.as_str())
            .bind(&fingerprint)
            .bind(*order_id.as_uuid())
            .execute(&mut *tx)
            .await;

            if let Err(e) = recorded {
                let unique = is_unique_violation(&e);
                tx.rollback()
                    .await
                    .map_err(|e| checkout_storage("rollback", e))?;
                if unique {
                    // Lost the race to a concurrent retry; hand back its result.
                    return match self
                        .replayed_checkout(user_id, key.as_str(), &fingerprint)
                        .await?
                    {
                        Some(receipt) => Ok(receipt),
                        None => Err(CheckoutError::conflict(
                            "idempotency key already used with a different payload",
                        )),
                    };
                }
                return Err(checkout_storage("record_checkout_key", e));
            }
        }

        tx.commit()
            .await
            .map_err(|e| checkout_storage("commit", e))?;

        tracing::info!(order_id = %order_id, total = %request.total(), "order placed");
        Ok(OrderReceipt {
            order_id,
            total: request.total(),
        })
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn list_orders(&self, user_id: UserId) -> CheckoutResult<Vec<OrderWithItems>> {
        let order_rows = sqlx::query(
            r#"
            SELECT id, user_id, total, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(*user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| checkout_storage("list_orders", e))?;

        let item_rows = sqlx::query(
            r#"
            SELECT order_id, product_id, presentation_id, quantity, price
            FROM order_items
            WHERE order_id IN (SELECT id FROM orders WHERE user_id = $1)
            ORDER BY order_id, line_no
            "#,
        )
        .bind(*user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| checkout_storage("list_order_items", e))?;

        let mut items_by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            let order_id = OrderId::from_uuid(row.get("order_id"));
            items_by_order.entry(order_id).or_default().push(OrderItem {
                order_id,
                product_id: ProductId::from_uuid(row.get("product_id")),
                presentation_id: PresentationId::from_uuid(row.get("presentation_id")),
                quantity: row.get("quantity"),
                price: Money::from_minor(row.get("price")),
            });
        }

        Ok(order_rows
            .into_iter()
            .map(|row| {
                let id = OrderId::from_uuid(row.get("id"));
                OrderWithItems {
                    order: Order {
                        id,
                        user_id: UserId::from_uuid(row.get("user_id")),
                        total: Money::from_minor(row.get("total")),
                        created_at: row.get::<DateTime<Utc>, _>("created_at"),
                    },
                    items: items_by_order.remove(&id).unwrap_or_default(),
                }
            })
            .collect())
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn cart_view(&self, user_id: UserId) -> StoreResult<CartView> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.presentation_id, c.quantity,
                   p.kind, p.size, p.price,
                   pr.name AS product_name
            FROM cart_items c
            JOIN presentations p ON p.id = c.presentation_id
            JOIN products pr ON pr.id = p.product_id
            WHERE c.user_id = $1
            ORDER BY c.added_at
            "#,
        )
        .bind(*user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_storage("cart_view", e))?;

        Ok(CartView {
            items: rows
                .into_iter()
                .map(|row| CartViewRow {
                    id: CartItemId::from_uuid(row.get("id")),
                    presentation_id: PresentationId::from_uuid(row.get("presentation_id")),
                    product_name: row.get("product_name"),
                    kind: row.get("kind"),
                    size: row.get("size"),
                    unit_price: Money::from_minor(row.get("price")),
                    quantity: row.get("quantity"),
                })
                .collect(),
        })
    }

    #[instrument(skip(self, item), fields(user_id = %user_id))]
    async fn add_item(&self, user_id: UserId, item: NewCartItem) -> StoreResult<CartItem> {
        let id = CartItemId::new();
        let row = sqlx::query(
            r#"
            INSERT INTO cart_items (id, user_id, presentation_id, quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING added_at
            "#,
        )
        .bind(*id.as_uuid())
        .bind(*user_id.as_uuid())
        .bind(*item.presentation_id.as_uuid())
        .bind(item.quantity.value())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::NotFound
            } else {
                store_storage("add_cart_item", e)
            }
        })?;

        Ok(CartItem {
            id,
            user_id,
            presentation_id: item.presentation_id,
            quantity: item.quantity.value(),
            added_at: row.get::<DateTime<Utc>, _>("added_at"),
        })
    }

    #[instrument(skip(self), fields(user_id = %user_id, item_id = %item_id))]
    async fn update_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: Quantity,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $1 WHERE id = $2 AND user_id = $3",
        )
        .bind(quantity.value())
        .bind(*item_id.as_uuid())
        .bind(*user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| store_storage("update_cart_item", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user_id, item_id = %item_id))]
    async fn remove_item(&self, user_id: UserId, item_id: CartItemId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(*item_id.as_uuid())
            .bind(*user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| store_storage("remove_cart_item", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    #[instrument(skip(self))]
    async fn list_products(&self) -> StoreResult<Vec<ProductWithPresentations>> {
        let product_rows = sqlx::query(
            "SELECT id, name, category, description, image, created_at FROM products ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_storage("list_products", e))?;

        let presentation_rows = sqlx::query(
            "SELECT id, product_id, kind, size, price, stock FROM presentations ORDER BY product_id, size",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_storage("list_presentations", e))?;

        let mut by_product: HashMap<ProductId, Vec<Presentation>> = HashMap::new();
        for row in presentation_rows {
            let product_id = ProductId::from_uuid(row.get("product_id"));
            by_product.entry(product_id).or_default().push(Presentation {
                id: PresentationId::from_uuid(row.get("id")),
                product_id,
                kind: row.get("kind"),
                size: row.get("size"),
                price: Money::from_minor(row.get("price")),
                stock: row.get("stock"),
            });
        }

        Ok(product_rows
            .into_iter()
            .map(|row| {
                let id = ProductId::from_uuid(row.get("id"));
                ProductWithPresentations {
                    product: Product {
                        id,
                        name: row.get("name"),
                        category: row.get("category"),
                        description: row.get("description"),
                        image: row.get("image"),
                        created_at: row.get::<DateTime<Utc>, _>("created_at"),
                    },
                    presentations: by_product.remove(&id).unwrap_or_default(),
                }
            })
            .collect())
    }

    #[instrument(skip(self), fields(presentation_id = %id))]
    async fn set_stock(&self, id: PresentationId, stock: StockLevel) -> StoreResult<()> {
        let result = sqlx::query("UPDATE presentations SET stock = $1 WHERE id = $2")
            .bind(stock.value())
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| store_storage("set_stock", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn low_stock(&self, threshold: i64) -> StoreResult<Vec<LowStockRow>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.kind, p.size, p.stock, pr.name AS product_name
            FROM presentations p
            JOIN products pr ON pr.id = p.product_id
            WHERE p.stock <= $1
            ORDER BY p.stock, pr.name
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_storage("low_stock", e))?;

        Ok(rows
            .into_iter()
            .map(|row| LowStockRow {
                presentation_id: PresentationId::from_uuid(row.get::<Uuid, _>("id")),
                product_name: row.get("product_name"),
                kind: row.get("kind"),
                size: row.get("size"),
                stock: row.get("stock"),
            })
            .collect())
    }
}

fn checkout_storage(operation: &str, e: sqlx::Error) -> CheckoutError {
    CheckoutError::storage(format!("{operation}: {e}"))
}

fn store_storage(operation: &str, e: sqlx::Error) -> StoreError {
    StoreError::storage(format!("{operation}: {e}"))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"))
}
