//! `agrostore-orders` — order placement and retrieval domain.
//!
//! The one place in the system where multiple entities commit together: a
//! checkout writes the order, its items, the stock decrements and the cart
//! clear as a single unit of work. This crate holds the pure domain half of
//! that contract (validation, fixed-point totals, idempotency fingerprints,
//! the error taxonomy); the transactional half lives in `agrostore-infra`.

pub mod checkout;
pub mod error;
pub mod order;

pub use checkout::{CheckoutRequest, IdempotencyKey, LineItem};
pub use error::{CheckoutError, CheckoutResult};
pub use order::{Order, OrderItem, OrderReceipt, OrderWithItems};
