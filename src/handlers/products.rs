use crate::entities::{CategoryModel, ProductModel};
use crate::handlers::common::{
    default_limit, default_page, success_response, PaginatedResponse,
};
use crate::{errors::ServiceError, AppState};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Creates the router for product endpoints
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_product))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListProductsQuery {
    /// Restrict the listing to one category (by slug)
    pub category: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

/// List products, newest catalog order by name
#[utoipa::path(
    get,
    path = "/api/products",
    params(ListProductsQuery),
    responses(
        (status = 200, description = "Paginated product listing", body = PaginatedResponse<ProductResponse>),
        (status = 404, description = "Unknown category slug")
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Response, ServiceError> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, crate::handlers::common::MAX_PAGE_SIZE);

    let (rows, total) = state
        .services
        .catalog
        .list_products(query.category.as_deref(), page, limit)
        .await?;

    let items: Vec<ProductResponse> = rows
        .into_iter()
        .map(|(product, category)| ProductResponse::from_models(product, category))
        .collect();

    Ok(success_response(PaginatedResponse::new(
        items, total, page, limit,
    )))
}

/// Product detail
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product detail", body = ProductResponse),
        (status = 404, description = "Product not found")
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let (product, category) = state.services.catalog.get_product_with_category(id).await?;

    Ok(success_response(ProductResponse::from_models(
        product, category,
    )))
}

// Response DTOs

#[derive(Debug, Serialize, ToSchema)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<CategoryModel> for CategorySummary {
    fn from(category: CategoryModel) -> Self {
        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    /// Serialized as a decimal string, e.g. "19.99"
    pub price: Decimal,
    pub image_url: Option<String>,
    pub description: String,
    pub category: Option<CategorySummary>,
    pub created_at: DateTime<Utc>,
}

impl ProductResponse {
    pub fn from_models(product: ProductModel, category: Option<CategoryModel>) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
            image_url: product.image_url,
            description: product.description,
            category: category.map(CategorySummary::from),
            created_at: product.created_at,
        }
    }
}
