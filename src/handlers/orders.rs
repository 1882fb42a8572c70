use crate::handlers::common::{success_response, PaginatedResponse, PaginationParams};
use crate::services::orders::OrderDetails;
use crate::{errors::ServiceError, AppState};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Creates the router for order read endpoints
pub fn orders_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/:id", get(get_order))
}

/// Order history, newest first
async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, ServiceError> {
    let (page, limit) = params.clamped();

    let (orders, total) = state.services.orders.list_orders(page, limit).await?;

    let items: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();

    Ok(success_response(PaginatedResponse::new(
        items, total, page, limit,
    )))
}

/// One order with items and its computed total
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order detail", body = OrderResponse),
        (status = 404, description = "Order not found")
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let details = state.services.orders.get_order(id).await?;

    Ok(success_response(OrderResponse::from(details)))
}

// Response DTOs

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub product_id: Uuid,
    /// Resolved product name; absent when the product has been removed
    pub name: Option<String>,
    pub quantity: i32,
    /// Price captured at order time, not the current catalog price
    pub price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub email: String,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderLineResponse>,
    pub total: Decimal,
}

impl From<OrderDetails> for OrderResponse {
    fn from(details: OrderDetails) -> Self {
        Self {
            id: details.order.id,
            user_id: details.order.user_id,
            email: details.order.email,
            paid: details.order.paid,
            created_at: details.order.created_at,
            items: details
                .items
                .into_iter()
                .map(|line| OrderLineResponse {
                    product_id: line.product_id,
                    name: line.name,
                    quantity: line.quantity,
                    price: line.price,
                    subtotal: line.subtotal,
                })
                .collect(),
            total: details.total,
        }
    }
}
