mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use storefront_api::{
    entities::{product, Order, OrderItem, Product},
    errors::ServiceError,
    services::cart::CartItemInput,
};
use uuid::Uuid;

fn input(product_id: Uuid, quantity: i32) -> CartItemInput {
    CartItemInput {
        product_id,
        quantity,
    }
}

#[tokio::test]
async fn checkout_converts_the_cart_into_an_order() {
    let app = TestApp::new().await;
    let session = Uuid::new_v4();
    let product_a = app.seed_product("Alpha", dec!(10.00)).await;
    let product_b = app.seed_product("Beta", dec!(5.00)).await;

    let cart = &app.state.services.cart;
    cart.add_item(session, input(product_a, 2)).await.unwrap();
    cart.add_item(session, input(product_b, 1)).await.unwrap();

    let receipt = app
        .state
        .services
        .checkout
        .checkout(session, None, Some("guest@example.com".to_string()))
        .await
        .unwrap();

    assert_eq!(receipt.items.len(), 2);
    assert_eq!(receipt.total, dec!(25.00));
    assert_eq!(receipt.email, "guest@example.com");
    assert!(!receipt.paid);
    assert!(receipt.user_id.is_none());

    // Durable rows exist
    let order = Order::find_by_id(receipt.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .expect("order row should exist");
    assert!(!order.paid);

    let items = OrderItem::find().all(&*app.state.db).await.unwrap();
    assert_eq!(items.len(), 2);

    // The cart is empty afterwards
    let view = cart.get_cart(session).await.unwrap();
    assert!(view.items.is_empty());
}

#[tokio::test]
async fn empty_cart_checkout_fails_and_writes_nothing() {
    let app = TestApp::new().await;
    let session = Uuid::new_v4();

    let err = app
        .state
        .services
        .checkout
        .checkout(session, None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::EmptyCart));
    assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);

    let orders = Order::find().all(&*app.state.db).await.unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn a_second_checkout_on_the_same_session_sees_an_empty_cart() {
    let app = TestApp::new().await;
    let session = Uuid::new_v4();
    let product = app.seed_product("Alpha", dec!(10.00)).await;

    let cart = &app.state.services.cart;
    cart.add_item(session, input(product, 1)).await.unwrap();

    let checkout = &app.state.services.checkout;
    checkout.checkout(session, None, None).await.unwrap();

    let err = checkout.checkout(session, None, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::EmptyCart));

    let orders = Order::find().all(&*app.state.db).await.unwrap();
    assert_eq!(orders.len(), 1);
}

#[tokio::test]
async fn order_totals_survive_later_price_changes() {
    let app = TestApp::new().await;
    let session = Uuid::new_v4();
    let product_id = app.seed_product("Alpha", dec!(10.00)).await;

    let cart = &app.state.services.cart;
    cart.add_item(session, input(product_id, 2)).await.unwrap();

    let receipt = app
        .state
        .services
        .checkout
        .checkout(session, None, None)
        .await
        .unwrap();
    assert_eq!(receipt.total, dec!(20.00));

    // The catalog price doubles after the order was placed
    let existing = Product::find_by_id(product_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    let mut active: product::ActiveModel = existing.into();
    active.price = Set(dec!(20.00));
    active.update(&*app.state.db).await.unwrap();

    let details = app
        .state
        .services
        .orders
        .get_order(receipt.id)
        .await
        .unwrap();

    assert_eq!(details.items[0].price, dec!(10.00));
    assert_eq!(details.total, dec!(20.00));
}

#[tokio::test]
async fn checkout_rolls_back_entirely_when_a_product_is_gone() {
    let app = TestApp::new().await;
    let session = Uuid::new_v4();
    let kept = app.seed_product("Alpha", dec!(10.00)).await;
    let doomed = app.seed_product("Beta", dec!(5.00)).await;

    let cart = &app.state.services.cart;
    cart.add_item(session, input(kept, 1)).await.unwrap();
    cart.add_item(session, input(doomed, 1)).await.unwrap();

    // Deleted between cart-add and checkout
    Product::delete_by_id(doomed)
        .exec(&*app.state.db)
        .await
        .unwrap();

    let err = app
        .state
        .services
        .checkout
        .checkout(session, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    // No partial order, no partial items
    let orders = Order::find().all(&*app.state.db).await.unwrap();
    assert!(orders.is_empty());
    let items = OrderItem::find().all(&*app.state.db).await.unwrap();
    assert!(items.is_empty());

    // The cart itself is untouched
    assert_eq!(app.store.snapshot(session).len(), 2);
}

#[tokio::test]
async fn authenticated_checkout_records_the_user() {
    let app = TestApp::new().await;
    let session = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let product = app.seed_product("Alpha", dec!(10.00)).await;

    app.state
        .services
        .cart
        .add_item(session, input(product, 1))
        .await
        .unwrap();

    let receipt = app
        .state
        .services
        .checkout
        .checkout(session, Some(user_id), None)
        .await
        .unwrap();

    assert_eq!(receipt.user_id, Some(user_id));
    assert_eq!(receipt.email, "");
}

#[tokio::test]
async fn unknown_order_lookup_is_not_found() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .orders
        .get_order(Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn order_history_lists_all_orders_with_totals() {
    let app = TestApp::new().await;
    let product = app.seed_product("Alpha", dec!(10.00)).await;

    let cart = &app.state.services.cart;
    let checkout = &app.state.services.checkout;

    let first_session = Uuid::new_v4();
    cart.add_item(first_session, input(product, 1)).await.unwrap();
    let first = checkout.checkout(first_session, None, None).await.unwrap();

    let second_session = Uuid::new_v4();
    cart.add_item(second_session, input(product, 3)).await.unwrap();
    let second = checkout.checkout(second_session, None, None).await.unwrap();

    let (orders, total) = app.state.services.orders.list_orders(1, 20).await.unwrap();

    assert_eq!(total, 2);
    assert_eq!(orders.len(), 2);
    let ids: Vec<Uuid> = orders.iter().map(|o| o.order.id).collect();
    assert!(ids.contains(&first.id));
    assert!(ids.contains(&second.id));
    let second_details = orders.iter().find(|o| o.order.id == second.id).unwrap();
    assert_eq!(second_details.total, dec!(30.00));
}
