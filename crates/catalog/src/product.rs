use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agrostore_core::ProductId;

use crate::presentation::Presentation;

/// A catalog product (e.g. a herbicide brand).
///
/// Products carry descriptive data only; anything priced or counted lives on
/// the presentations underneath.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Browse view: a product together with all of its presentations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductWithPresentations {
    #[serde(flatten)]
    pub product: Product,
    pub presentations: Vec<Presentation>,
}
