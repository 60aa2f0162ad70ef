//! `agrostore-cart` — per-user shopping cart.
//!
//! Cart rows are owned by exactly one user and are never contended across
//! users; every storage statement predicates on the owning `user_id`.

pub mod item;

pub use item::{CartItem, CartView, CartViewRow, NewCartItem, Quantity};
