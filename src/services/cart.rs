use crate::{
    entities::{product, Product, ProductModel},
    errors::ServiceError,
    events::{Event, EventSender},
    sessions::CartSessionStore,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Session cart service.
///
/// Quantities live in the per-visitor session store; this service
/// validates mutations against the catalog and resolves the stored
/// `product id → quantity` mapping into priced cart lines. Every
/// mutation is written back to the store before the updated view is
/// returned — there is no batching.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    store: Arc<CartSessionStore>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        store: Arc<CartSessionStore>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            store,
            event_sender,
        }
    }

    /// Add a product to the cart, summing with any existing quantity.
    ///
    /// The quantity must be at least 1 and the product must exist; both
    /// are checked before the store is touched.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        session_id: Uuid,
        input: CartItemInput,
    ) -> Result<CartView, ServiceError> {
        let quantity = u32::try_from(input.quantity)
            .ok()
            .filter(|q| *q >= 1)
            .ok_or_else(|| {
                ServiceError::ValidationError("quantity must be at least 1".to_string())
            })?;

        self.ensure_product_exists(input.product_id).await?;

        self.store.add(session_id, input.product_id, quantity);

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                session_id,
                product_id: input.product_id,
            })
            .await;

        info!(
            "Added to cart {}: product {} x{}",
            session_id, input.product_id, quantity
        );
        self.get_cart(session_id).await
    }

    /// Set a product's quantity exactly. A quantity of zero or less
    /// removes the entry; removal of an absent entry is a no-op.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        session_id: Uuid,
        input: CartItemInput,
    ) -> Result<CartView, ServiceError> {
        if input.quantity <= 0 {
            self.store.remove(session_id, input.product_id);
        } else {
            self.ensure_product_exists(input.product_id).await?;
            self.store
                .set(session_id, input.product_id, input.quantity as u32);
        }

        self.event_sender
            .send_or_log(Event::CartItemUpdated {
                session_id,
                product_id: input.product_id,
            })
            .await;

        self.get_cart(session_id).await
    }

    /// Remove a product from the cart; absent entries are a no-op.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        session_id: Uuid,
        product_id: Uuid,
    ) -> Result<CartView, ServiceError> {
        self.store.remove(session_id, product_id);

        self.event_sender
            .send_or_log(Event::CartItemRemoved {
                session_id,
                product_id,
            })
            .await;

        self.get_cart(session_id).await
    }

    /// Resolve the session's cart against the catalog.
    ///
    /// An entry whose product has disappeared fails the whole read with
    /// a not-found error; partial carts are never returned.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, session_id: Uuid) -> Result<CartView, ServiceError> {
        let entries = self.store.snapshot(session_id);
        self.resolve(entries).await
    }

    async fn resolve(&self, entries: HashMap<Uuid, u32>) -> Result<CartView, ServiceError> {
        if entries.is_empty() {
            return Ok(CartView::default());
        }

        let ids: Vec<Uuid> = entries.keys().copied().collect();
        let products: Vec<ProductModel> = Product::find()
            .filter(product::Column::Id.is_in(ids.iter().copied()))
            .all(&*self.db)
            .await?;

        if products.len() != entries.len() {
            let missing = ids
                .iter()
                .find(|id| !products.iter().any(|p| p.id == **id))
                .copied()
                .unwrap_or_default();
            return Err(ServiceError::NotFound(format!(
                "Product {} referenced by cart not found",
                missing
            )));
        }

        let mut items: Vec<CartLine> = products
            .into_iter()
            .map(|p| {
                let quantity = entries[&p.id];
                let subtotal = p.price * Decimal::from(quantity);
                CartLine {
                    product_id: p.id,
                    name: p.name,
                    price: p.price,
                    image_url: p.image_url,
                    quantity,
                    subtotal,
                }
            })
            .collect();

        items.sort_by(|a, b| a.name.cmp(&b.name));
        let total = items.iter().map(|line| line.subtotal).sum();

        Ok(CartView { items, total })
    }

    async fn ensure_product_exists(&self, product_id: Uuid) -> Result<(), ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;
        Ok(())
    }
}

/// A product/quantity pair from the caller
#[derive(Debug, Clone, Deserialize)]
pub struct CartItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// One resolved cart line
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub subtotal: Decimal,
}

/// The cart as the caller sees it
#[derive(Debug, Clone, Default, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total: Decimal,
}
