use crate::{
    entities::{order, order_item, OrderItemModel, OrderModel, Product},
    errors::ServiceError,
    events::{Event, EventSender},
    sessions::CartSessionStore,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Checkout service: converts a session cart into a persisted order.
///
/// The order row and every item row are written in a single transaction;
/// any failure mid-loop (a product deleted since it was added, a
/// persistence error) rolls the whole order back and leaves the cart
/// untouched. The cart is cleared only after the transaction commits,
/// which also makes a second checkout on the same session fail with the
/// empty-cart error.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    store: Arc<CartSessionStore>,
    event_sender: Arc<EventSender>,
}

impl CheckoutService {
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

    /// Create an order from the session's cart.
    ///
    /// `user_id` comes from the authenticated identity when present;
    /// guests are recorded by `email` instead (which may be empty, as in
    /// the storefront's guest flow).
    #[instrument(skip(self))]
    pub async fn checkout(
        &self,
        session_id: Uuid,
        user_id: Option<Uuid>,
        email: Option<String>,
    ) -> Result<OrderReceipt, ServiceError> {
        let entries = self.store.snapshot(session_id);
        if entries.is_empty() {
            return Err(ServiceError::EmptyCart);
        }

        // Deterministic insert order keeps retries and tests stable
        let mut entries: Vec<(Uuid, u32)> = entries.into_iter().collect();
        entries.sort_by_key(|(product_id, _)| *product_id);

        let order_id = Uuid::new_v4();
        let created_at = Utc::now();

        let txn = self.db.begin().await?;

        let order = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(user_id),
            email: Set(email.unwrap_or_default().trim().to_string()),
            paid: Set(false),
            created_at: Set(created_at),
        };
        let order: OrderModel = order.insert(&txn).await?;

        let mut lines = Vec::with_capacity(entries.len());
        for (product_id, quantity) in entries {
            let product = Product::find_by_id(product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", product_id))
                })?;

            let quantity = i32::try_from(quantity).map_err(|_| {
                ServiceError::InvalidInput(format!(
                    "quantity for product {} is out of range",
                    product_id
                ))
            })?;

            // Price snapshot: copied now, never re-read from the catalog
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(product_id),
                quantity: Set(quantity),
                price: Set(product.price),
                created_at: Set(created_at),
            };
            let item: OrderItemModel = item.insert(&txn).await?;

            lines.push(OrderReceiptLine {
                product_id,
                name: product.name,
                quantity: item.quantity,
                price: item.price,
                subtotal: item.subtotal(),
            });
        }

        txn.commit().await?;

        // Only a committed order empties the cart
        self.store.clear(session_id);

        self.event_sender
            .send_or_log(Event::OrderCreated(order_id))
            .await;
        self.event_sender
            .send_or_log(Event::CheckoutCompleted {
                session_id,
                order_id,
            })
            .await;

        lines.sort_by(|a, b| a.name.cmp(&b.name));
        let total = lines.iter().map(|line| line.subtotal).sum();

        info!(
            "Checkout completed: order {} created from session {} ({} items)",
            order_id,
            session_id,
            lines.len()
        );

        Ok(OrderReceipt {
            id: order.id,
            user_id: order.user_id,
            email: order.email,
            paid: order.paid,
            created_at: order.created_at,
            items: lines,
            total,
        })
    }
}

/// One line of a created order, priced at checkout time
#[derive(Debug, Clone, Serialize)]
pub struct OrderReceiptLine {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub subtotal: Decimal,
}

/// The persisted order as returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct OrderReceipt {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub email: String,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderReceiptLine>,
    pub total: Decimal,
}
