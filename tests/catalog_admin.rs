mod common;

use boutique_api::entities::{category, product};
use boutique_api::errors::ServiceError;
use boutique_api::services::catalog::{CreateCategoryInput, CreateProductInput};
use common::{seed_category, seed_product, test_state};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

#[tokio::test]
async fn category_with_products_cannot_be_deleted() {
    let state = test_state().await;
    let cat = seed_category(&state.db, "Bags").await;
    let item = seed_product(&state.db, cat.id, "Tote", dec!(10.00), 5).await;

    let err = state
        .services
        .catalog
        .delete_category(cat.id)
        .await
        .expect_err("category in use");
    assert!(matches!(err, ServiceError::Conflict(_)));

    // Nothing changed.
    assert!(category::Entity::find_by_id(cat.id)
        .one(&*state.db)
        .await
        .expect("query")
        .is_some());
    assert!(product::Entity::find_by_id(item.id)
        .one(&*state.db)
        .await
        .expect("query")
        .is_some());

    // Once the product is gone the category can be deleted.
    state
        .services
        .catalog
        .delete_product(item.id)
        .await
        .expect("delete product");
    state
        .services
        .catalog
        .delete_category(cat.id)
        .await
        .expect("delete empty category");
}

#[tokio::test]
async fn storefront_hides_inactive_and_out_of_stock_products() {
    let state = test_state().await;
    let cat = seed_category(&state.db, "Bags").await;
    let visible = seed_product(&state.db, cat.id, "Tote", dec!(10.00), 5).await;
    let depleted = seed_product(&state.db, cat.id, "Clutch", dec!(5.00), 0).await;
    let hidden = seed_product(&state.db, cat.id, "Satchel", dec!(8.00), 5).await;

    let mut model: product::ActiveModel = hidden.clone().into();
    model.is_active = Set(false);
    model.update(&*state.db).await.expect("deactivate");

    let listed = state
        .services
        .catalog
        .list_active_products()
        .await
        .expect("list");
    let ids: Vec<_> = listed.iter().map(|p| p.id).collect();
    assert!(ids.contains(&visible.id));
    assert!(!ids.contains(&depleted.id));
    assert!(!ids.contains(&hidden.id));

    // The back office still sees everything.
    let all = state
        .services
        .catalog
        .list_all_products()
        .await
        .expect("list all");
    assert_eq!(all.len(), 3);

    // Inactive products are invisible to the storefront detail view too.
    let err = state
        .services
        .catalog
        .get_active_product(hidden.id)
        .await
        .expect_err("inactive detail");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn featured_listing_is_capped_at_six() {
    let state = test_state().await;
    let cat = seed_category(&state.db, "Bags").await;
    for i in 0..8 {
        let p = seed_product(&state.db, cat.id, &format!("Bag {}", i), dec!(10.00), 5).await;
        let mut model: product::ActiveModel = p.into();
        model.is_featured = Set(true);
        model.update(&*state.db).await.expect("feature");
    }

    let featured = state
        .services
        .catalog
        .list_featured_products()
        .await
        .expect("featured");
    assert_eq!(featured.len(), 6);
}

#[tokio::test]
async fn low_stock_lists_only_the_band_above_zero() {
    let state = test_state().await;
    let cat = seed_category(&state.db, "Bags").await;
    seed_product(&state.db, cat.id, "Out", dec!(10.00), 0).await;
    let low = seed_product(&state.db, cat.id, "Low", dec!(10.00), 3).await;
    let edge = seed_product(&state.db, cat.id, "Edge", dec!(10.00), 5).await;
    seed_product(&state.db, cat.id, "Plenty", dec!(10.00), 6).await;

    let listed = state
        .services
        .catalog
        .list_low_stock_products()
        .await
        .expect("low stock");
    let ids: Vec<_> = listed.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![low.id, edge.id]);
}

#[tokio::test]
async fn search_matches_name_and_description_alphabetically() {
    let state = test_state().await;
    let cat = seed_category(&state.db, "Bags").await;
    seed_product(&state.db, cat.id, "Zip wallet", dec!(10.00), 5).await;
    seed_product(&state.db, cat.id, "Alpine wallet", dec!(10.00), 5).await;
    seed_product(&state.db, cat.id, "Scarf", dec!(10.00), 5).await;

    let found = state
        .services
        .catalog
        .search_products("wallet")
        .await
        .expect("search");
    let names: Vec<_> = found.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Alpine wallet", "Zip wallet"]);
}

#[tokio::test]
async fn category_listing_narrows_with_the_same_search_match() {
    let state = test_state().await;
    let bags = seed_category(&state.db, "Bags").await;
    let other = seed_category(&state.db, "Travel").await;
    seed_product(&state.db, bags.id, "Zip wallet", dec!(10.00), 5).await;
    seed_product(&state.db, bags.id, "Alpine wallet", dec!(10.00), 5).await;
    seed_product(&state.db, bags.id, "Scarf", dec!(10.00), 5).await;
    seed_product(&state.db, other.id, "Travel wallet", dec!(10.00), 5).await;

    let (_, found) = state
        .services
        .catalog
        .list_products_in_category(bags.id, Some("wallet"))
        .await
        .expect("filtered listing");
    let names: Vec<_> = found.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Alpine wallet", "Zip wallet"]);

    // Same LIKE semantics as the plain search path, casing included.
    let (_, found) = state
        .services
        .catalog
        .list_products_in_category(bags.id, Some("Wallet"))
        .await
        .expect("filtered listing");
    assert_eq!(found.len(), 2);

    let (_, all) = state
        .services
        .catalog
        .list_products_in_category(bags.id, None)
        .await
        .expect("unfiltered listing");
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn schema_accepts_full_precision_prices() {
    let state = test_state().await;
    let cat = seed_category(&state.db, "Bags").await;
    let pricey = seed_product(&state.db, cat.id, "Trunk", dec!(99999.99), 1).await;

    let stored = product::Entity::find_by_id(pricey.id)
        .one(&*state.db)
        .await
        .expect("query")
        .expect("product");
    assert_eq!(stored.price, dec!(99999.99));
    assert_eq!(stored.price_with_tax(), dec!(119999.99));
}

#[tokio::test]
async fn product_creation_requires_an_existing_category() {
    let state = test_state().await;
    let input = CreateProductInput {
        name: "Tote".into(),
        description: "A tote".into(),
        price: dec!(10.00),
        stock: 5,
        sku: "SKU-TOTE".into(),
        image: None,
        images: vec![],
        is_active: true,
        is_featured: false,
        category_id: uuid::Uuid::new_v4(),
    };
    let err = state
        .services
        .catalog
        .create_product(input)
        .await
        .expect_err("orphan category");
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn category_create_and_update_round_trip() {
    let state = test_state().await;
    let created = state
        .services
        .catalog
        .create_category(CreateCategoryInput {
            name: "Accessoires".into(),
            description: Some("Petits objets".into()),
            image: None,
            is_active: true,
        })
        .await
        .expect("create");

    let updated = state
        .services
        .catalog
        .update_category(
            created.id,
            boutique_api::services::catalog::UpdateCategoryInput {
                name: Some("Accessories".into()),
                ..Default::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.name, "Accessories");
    assert_eq!(updated.description.as_deref(), Some("Petits objets"));
}
