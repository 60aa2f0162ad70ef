//! `agrostore-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use id::{CartItemId, OrderId, PresentationId, ProductId, UserId};
pub use money::Money;
pub use value_object::ValueObject;
