mod common;

use boutique_api::errors::ServiceError;
use common::{seed_category, seed_product, test_state};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};

#[tokio::test]
async fn adding_twice_accumulates_one_line() {
    let state = test_state().await;
    let category = seed_category(&state.db, "Bags").await;
    let product = seed_product(&state.db, category.id, "Tote", dec!(10.00), 10).await;
    let (session, _) = state.sessions.acquire(None);

    state
        .services
        .cart
        .add(&session, product.id, 2)
        .await
        .expect("first add");
    let view = state
        .services
        .cart
        .add(&session, product.id, 3)
        .await
        .expect("second add");

    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.lines[0].quantity, 5);
    assert_eq!(view.total_quantity, 5);
}

#[tokio::test]
async fn add_beyond_stock_fails_and_leaves_the_line_untouched() {
    let state = test_state().await;
    let category = seed_category(&state.db, "Bags").await;
    let product = seed_product(&state.db, category.id, "Tote", dec!(10.00), 4).await;
    let (session, _) = state.sessions.acquire(None);

    state
        .services
        .cart
        .add(&session, product.id, 3)
        .await
        .expect("first add");
    let err = state
        .services
        .cart
        .add(&session, product.id, 2)
        .await
        .expect_err("over stock");
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    let view = state.services.cart.view(&session).await.expect("view");
    assert_eq!(view.lines[0].quantity, 3);
}

#[tokio::test]
async fn cart_view_prices_lines_with_tax() {
    let state = test_state().await;
    let category = seed_category(&state.db, "Bags").await;
    let product = seed_product(&state.db, category.id, "Tote", dec!(10.00), 10).await;
    let (session, _) = state.sessions.acquire(None);

    let view = state
        .services
        .cart
        .add(&session, product.id, 2)
        .await
        .expect("add");

    assert_eq!(view.lines[0].unit_price, dec!(10.00));
    assert_eq!(view.lines[0].unit_price_with_tax, dec!(12.00));
    assert_eq!(view.lines[0].line_total, dec!(24.00));
    assert_eq!(view.subtotal, dec!(20.00));
    assert_eq!(view.tax, dec!(4.00));
    assert_eq!(view.total, dec!(24.00));
}

#[tokio::test]
async fn update_to_zero_removes_and_remove_is_idempotent() {
    let state = test_state().await;
    let category = seed_category(&state.db, "Bags").await;
    let product = seed_product(&state.db, category.id, "Tote", dec!(10.00), 10).await;
    let (session, _) = state.sessions.acquire(None);

    state
        .services
        .cart
        .add(&session, product.id, 2)
        .await
        .expect("add");
    let view = state
        .services
        .cart
        .update(&session, product.id, 0)
        .await
        .expect("update to zero");
    assert!(view.is_empty());

    let view = state
        .services
        .cart
        .remove(&session, product.id)
        .await
        .expect("remove absent line");
    assert!(view.is_empty());
}

#[tokio::test]
async fn deactivated_products_are_pruned_on_view() {
    let state = test_state().await;
    let category = seed_category(&state.db, "Bags").await;
    let keep = seed_product(&state.db, category.id, "Tote", dec!(10.00), 10).await;
    let gone = seed_product(&state.db, category.id, "Clutch", dec!(5.00), 10).await;
    let (session, _) = state.sessions.acquire(None);

    state
        .services
        .cart
        .add(&session, keep.id, 1)
        .await
        .expect("add keep");
    state
        .services
        .cart
        .add(&session, gone.id, 1)
        .await
        .expect("add gone");

    let mut model: boutique_api::entities::product::ActiveModel = gone.into();
    model.is_active = Set(false);
    model.update(&*state.db).await.expect("deactivate");

    let view = state.services.cart.view(&session).await.expect("view");
    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.lines[0].product_id, keep.id);
    // The session cart itself was pruned, not just the rendered view.
    assert_eq!(session.cart().len(), 1);
}
