//! Storage wiring: Postgres when `DATABASE_URL` is configured, in-memory
//! otherwise (dev/test, seeded with a small demo catalog).

use std::sync::Arc;

use agrostore_infra::{CartStore, CatalogStore, InMemoryStore, OrderStore, PostgresStore};

/// The storage ports the handlers talk to.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<dyn OrderStore>,
    pub cart: Arc<dyn CartStore>,
    pub catalog: Arc<dyn CatalogStore>,
}

impl AppServices {
    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: OrderStore + CartStore + CatalogStore + 'static,
    {
        Self {
            orders: store.clone(),
            cart: store.clone(),
            catalog: store,
        }
    }
}

/// Wire services from the environment.
pub async fn build_services() -> AppServices {
    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let store = PostgresStore::connect(&url)
                .await
                .expect("failed to connect to DATABASE_URL");
            tracing::info!("using postgres storage");
            AppServices::from_store(Arc::new(store))
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using in-memory storage with demo catalog");
            AppServices::from_store(Arc::new(demo_store()))
        }
    }
}

/// In-memory store seeded with a couple of products so the storefront has
/// something to browse in dev mode.
fn demo_store() -> InMemoryStore {
    use agrostore_catalog::{Presentation, Product};
    use agrostore_core::{Money, PresentationId, ProductId};
    use chrono::Utc;

    let store = InMemoryStore::new();

    let herbicide = ProductId::new();
    store.seed_product(Product {
        id: herbicide,
        name: "Glyphosate Pro".to_string(),
        category: "herbicide".to_string(),
        description: Some("Broad-spectrum systemic herbicide".to_string()),
        image: None,
        created_at: Utc::now(),
    });
    store.seed_presentation(Presentation {
        id: PresentationId::new(),
        product_id: herbicide,
        kind: "liquid".to_string(),
        size: "1L".to_string(),
        price: Money::from_minor(1850),
        stock: 40,
    });
    store.seed_presentation(Presentation {
        id: PresentationId::new(),
        product_id: herbicide,
        kind: "liquid".to_string(),
        size: "5L".to_string(),
        price: Money::from_minor(7900),
        stock: 12,
    });

    let fungicide = ProductId::new();
    store.seed_product(Product {
        id: fungicide,
        name: "CupriMax".to_string(),
        category: "fungicide".to_string(),
        description: Some("Copper-based contact fungicide".to_string()),
        image: None,
        created_at: Utc::now(),
    });
    store.seed_presentation(Presentation {
        id: PresentationId::new(),
        product_id: fungicide,
        kind: "granular".to_string(),
        size: "25kg".to_string(),
        price: Money::from_minor(15400),
        stock: 5,
    });

    store
}
