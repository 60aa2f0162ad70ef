//! `agrostore-catalog` — products and their sellable presentations.
//!
//! A presentation is the unit customers actually buy: a concrete size/type
//! variant of a product carrying its own price and stock counter.

pub mod presentation;
pub mod product;

pub use presentation::{LowStockRow, Presentation, StockLevel, DEFAULT_LOW_STOCK_THRESHOLD};
pub use product::{Product, ProductWithPresentations};
