pub mod cart;
pub mod categories;
pub mod checkout;
pub mod common;
pub mod orders;
pub mod products;

use crate::{
    db::DbPool,
    events::EventSender,
    services::{CartService, CatalogService, CheckoutService, OrderService},
    sessions::CartSessionStore,
};
use std::sync::Arc;

/// Services used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub cart: Arc<CartService>,
    pub checkout: Arc<CheckoutService>,
    pub orders: Arc<OrderService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        store: Arc<CartSessionStore>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        let catalog = Arc::new(CatalogService::new(db.clone(), event_sender.clone()));
        let cart = Arc::new(CartService::new(
            db.clone(),
            store.clone(),
            event_sender.clone(),
        ));
        let checkout = Arc::new(CheckoutService::new(db.clone(), store, event_sender));
        let orders = Arc::new(OrderService::new(db));

        Self {
            catalog,
            cart,
            checkout,
            orders,
        }
    }
}
