use crate::handlers::common::success_response;
use crate::handlers::products::CategorySummary;
use crate::{errors::ServiceError, AppState};
use axum::{extract::State, response::Response, routing::get, Router};

/// Creates the router for category endpoints
pub fn categories_routes() -> Router<AppState> {
    Router::new().route("/", get(list_categories))
}

/// All categories, ordered by name
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Category listing", body = [CategorySummary])
    ),
    tag = "categories"
)]
pub async fn list_categories(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let categories = state.services.catalog.list_categories().await?;

    let items: Vec<CategorySummary> = categories.into_iter().map(CategorySummary::from).collect();

    Ok(success_response(items))
}
