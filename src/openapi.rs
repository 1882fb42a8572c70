use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = r#"
A small storefront backend: a product catalog, per-visitor session carts,
and a checkout flow that converts a cart into a persisted order.

Cart endpoints identify the visitor by the `cart_session` cookie, minted
on first use. Signed-in visitors are recognized through the `X-User-Id`
header set by the upstream auth layer; everyone else checks out as a
guest with an optional email.
"#
    ),
    paths(
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::categories::list_categories,
        crate::handlers::cart::get_cart,
        crate::handlers::checkout::checkout,
        crate::handlers::orders::get_order,
    ),
    components(schemas(
        crate::handlers::products::ProductResponse,
        crate::handlers::products::CategorySummary,
        crate::handlers::cart::AddItemRequest,
        crate::handlers::cart::UpdateItemRequest,
        crate::handlers::cart::RemoveItemRequest,
        crate::handlers::checkout::CheckoutRequest,
        crate::handlers::orders::OrderResponse,
        crate::handlers::orders::OrderLineResponse,
        crate::errors::ErrorResponse,
    )),
    tags(
        (name = "products", description = "Catalog browsing"),
        (name = "categories", description = "Catalog categories"),
        (name = "cart", description = "Session cart operations"),
        (name = "checkout", description = "Cart to order conversion"),
        (name = "orders", description = "Persisted order reads"),
    )
)]
pub struct ApiDoc;

/// Swagger UI router, served at `/docs`
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
