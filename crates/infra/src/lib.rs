//! `agrostore-infra` — storage ports and their implementations.
//!
//! Each port is an async trait with two implementations: `PostgresStore`
//! (sqlx, explicit transactions) for production and `InMemoryStore` for
//! dev/test. The checkout unit of work lives behind `OrderStore::place_order`;
//! callers never see a half-applied order.

pub mod memory;
pub mod postgres;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{CartStore, CatalogStore, OrderStore, StoreError, StoreResult};
