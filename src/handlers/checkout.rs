use crate::auth::OptionalUser;
use crate::handlers::common::{created_response, validate_input};
use crate::sessions::{with_session_cookie, CartSessionId};
use crate::{errors::ServiceError, AppState};
use axum::{
    extract::{Json, State},
    response::Response,
    routing::post,
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Creates the router for the checkout endpoint
pub fn checkout_routes() -> Router<AppState> {
    Router::new().route("/", post(checkout))
}

/// Convert the session cart into a persisted order.
///
/// Signed-in visitors (identified by the upstream auth layer) own the
/// order; guests are recorded by the optional email instead.
#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order created; body carries items and total"),
        (status = 400, description = "Cart is empty"),
        (status = 404, description = "A cart entry references a product that no longer exists")
    ),
    tag = "checkout"
)]
pub async fn checkout(
    State(state): State<AppState>,
    session: CartSessionId,
    user: OptionalUser,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;

    let receipt = state
        .services
        .checkout
        .checkout(session.id, user.0, payload.email)
        .await?;

    Ok(with_session_cookie(session, created_response(receipt)))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CheckoutRequest {
    /// Guest email; ignored for signed-in visitors, may be empty
    #[validate(length(max = 254))]
    pub email: Option<String>,
}
