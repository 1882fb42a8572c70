use crate::{
    entities::{order, order_item, Order, OrderItem, OrderModel, Product},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Read side of persisted orders. Totals are always recomputed from the
/// item price snapshots, never from current catalog prices.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Fetch one order with its items.
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderDetails, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .find_also_related(Product)
            .all(&*self.db)
            .await?;

        Ok(OrderDetails::assemble(order, items))
    }

    /// Paginated order history, newest first.
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<OrderDetails>, u64), ServiceError> {
        let paginator = Order::find()
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut items_by_order: HashMap<Uuid, Vec<_>> = HashMap::new();
        if !order_ids.is_empty() {
            let items = OrderItem::find()
                .filter(order_item::Column::OrderId.is_in(order_ids))
                .find_also_related(Product)
                .all(&*self.db)
                .await?;
            for pair in items {
                items_by_order.entry(pair.0.order_id).or_default().push(pair);
            }
        }

        let details = orders
            .into_iter()
            .map(|order| {
                let items = items_by_order.remove(&order.id).unwrap_or_default();
                OrderDetails::assemble(order, items)
            })
            .collect();

        Ok((details, total))
    }
}

/// One order line with the product name resolved when the product still
/// exists
#[derive(Debug, Clone, Serialize)]
pub struct OrderLineDetails {
    pub product_id: Uuid,
    pub name: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    pub order: OrderModel,
    pub items: Vec<OrderLineDetails>,
    pub total: Decimal,
}

impl OrderDetails {
    fn assemble(
        order: OrderModel,
        items: Vec<(
            crate::entities::OrderItemModel,
            Option<crate::entities::ProductModel>,
        )>,
    ) -> Self {
        let mut lines: Vec<OrderLineDetails> = items
            .into_iter()
            .map(|(item, product)| OrderLineDetails {
                product_id: item.product_id,
                name: product.map(|p| p.name),
                quantity: item.quantity,
                price: item.price,
                subtotal: item.subtotal(),
            })
            .collect();

        lines.sort_by(|a, b| a.product_id.cmp(&b.product_id));
        let total = lines.iter().map(|line| line.subtotal).sum();

        Self {
            order,
            items: lines,
            total,
        }
    }
}
