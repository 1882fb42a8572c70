mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use storefront_api::{
    entities::{Category, Product},
    errors::ServiceError,
    services::catalog::CreateProductInput,
};
use uuid::Uuid;

async fn seed_categorized_product(app: &TestApp, name: &str, category_id: Uuid) -> Uuid {
    app.state
        .services
        .catalog
        .create_product(CreateProductInput {
            name: name.to_string(),
            price: dec!(9.99),
            image_url: None,
            description: Some("test product".to_string()),
            category_id: Some(category_id),
        })
        .await
        .expect("failed to seed categorized product")
        .id
}

#[tokio::test]
async fn listing_filters_by_category_slug() {
    let app = TestApp::new().await;
    let teaware = app.seed_category("Teaware", "teaware").await;
    seed_categorized_product(&app, "Teapot", teaware).await;
    app.seed_product("Unrelated", dec!(1.00)).await;

    let catalog = &app.state.services.catalog;

    let (rows, total) = catalog.list_products(Some("teaware"), 1, 20).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].0.name, "Teapot");
    let category = rows[0].1.as_ref().expect("category should be resolved");
    assert_eq!(category.slug, "teaware");

    let (_, all) = catalog.list_products(None, 1, 20).await.unwrap();
    assert_eq!(all, 2);
}

#[tokio::test]
async fn unknown_category_slug_is_not_found() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .catalog
        .list_products(Some("no-such-slug"), 1, 20)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn deleting_a_category_nulls_product_references() {
    let app = TestApp::new().await;
    let teaware = app.seed_category("Teaware", "teaware").await;
    let product_id = seed_categorized_product(&app, "Teapot", teaware).await;

    app.state
        .services
        .catalog
        .delete_category(teaware)
        .await
        .unwrap();

    // The category row is gone, the product survives with no category
    assert!(Category::find_by_id(teaware)
        .one(&*app.state.db)
        .await
        .unwrap()
        .is_none());

    let product = Product::find_by_id(product_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .expect("product must not be cascaded");
    assert_eq!(product.category_id, None);
}

#[tokio::test]
async fn deleting_an_unknown_category_is_not_found() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .catalog
        .delete_category(Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn product_detail_resolves_its_category() {
    let app = TestApp::new().await;
    let teaware = app.seed_category("Teaware", "teaware").await;
    let product_id = seed_categorized_product(&app, "Teapot", teaware).await;

    let (product, category) = app
        .state
        .services
        .catalog
        .get_product_with_category(product_id)
        .await
        .unwrap();

    assert_eq!(product.name, "Teapot");
    assert_eq!(category.expect("category expected").id, teaware);
}

#[tokio::test]
async fn unknown_product_detail_is_not_found() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .catalog
        .get_product(Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)));
}
