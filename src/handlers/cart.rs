use crate::handlers::common::{success_response, validate_input};
use crate::services::cart::CartItemInput;
use crate::sessions::{with_session_cookie, CartSessionId};
use crate::{errors::ServiceError, AppState};
use axum::{
    extract::{Json, State},
    response::Response,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for cart endpoints. All of them operate on the
/// visitor's session cart, identified by the `cart_session` cookie.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/add", post(add_item))
        .route("/update", post(update_item))
        .route("/remove", post(remove_item))
}

/// Current cart contents and total
#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart contents with per-line subtotals and total"),
        (status = 404, description = "A cart entry references a product that no longer exists")
    ),
    tag = "cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    session: CartSessionId,
) -> Result<Response, ServiceError> {
    let view = state.services.cart.get_cart(session.id).await?;

    Ok(with_session_cookie(session, success_response(view)))
}

/// Add a product to the cart; quantities for the same product sum
async fn add_item(
    State(state): State<AppState>,
    session: CartSessionId,
    Json(payload): Json<AddItemRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;

    let view = state
        .services
        .cart
        .add_item(
            session.id,
            CartItemInput {
                product_id: payload.product_id,
                quantity: payload.quantity,
            },
        )
        .await?;

    Ok(with_session_cookie(session, success_response(view)))
}

/// Set a product's quantity exactly; zero or less removes the entry
async fn update_item(
    State(state): State<AppState>,
    session: CartSessionId,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<Response, ServiceError> {
    let view = state
        .services
        .cart
        .update_item(
            session.id,
            CartItemInput {
                product_id: payload.product_id,
                quantity: payload.quantity,
            },
        )
        .await?;

    Ok(with_session_cookie(session, success_response(view)))
}

/// Remove a product from the cart; absent products are a no-op
async fn remove_item(
    State(state): State<AppState>,
    session: CartSessionId,
    Json(payload): Json<RemoveItemRequest>,
) -> Result<Response, ServiceError> {
    let view = state
        .services
        .cart
        .remove_item(session.id, payload.product_id)
        .await?;

    Ok(with_session_cookie(session, success_response(view)))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveItemRequest {
    pub product_id: Uuid,
}
