#![allow(dead_code)]

use boutique_api::auth::AuthService;
use boutique_api::config::AppConfig;
use boutique_api::entities::{category, product, user};
use boutique_api::events;
use boutique_api::migrator::Migrator;
use boutique_api::AppState;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-test-secret-test-secret!";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        jwt_secret: TEST_JWT_SECRET.into(),
        jwt_expiration: 3600,
        auth_issuer: "boutique-api".into(),
        auth_audience: "boutique-clients".into(),
        host: "127.0.0.1".into(),
        port: 0,
        environment: "test".into(),
        log_level: "warn".into(),
        log_json: false,
        auto_migrate: true,
        cors_allowed_origins: None,
        default_country: "France".into(),
        low_stock_threshold: 5,
    }
}

/// Fresh in-memory database with the schema applied. A single connection is
/// required so every query sees the same memory store.
pub async fn test_db() -> Arc<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.expect("sqlite connect");
    Migrator::up(&db, None).await.expect("migrations");
    Arc::new(db)
}

pub async fn test_state() -> AppState {
    let db = test_db().await;
    let (event_sender, receiver) = events::channel();
    tokio::spawn(events::process_events(receiver));
    AppState::new(db, Arc::new(test_config()), event_sender)
}

pub async fn seed_category(db: &DatabaseConnection, name: &str) -> category::Model {
    let now = Utc::now();
    category::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(None),
        image: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed category")
}

pub async fn seed_product(
    db: &DatabaseConnection,
    category_id: Uuid,
    name: &str,
    price: Decimal,
    stock: i32,
) -> product::Model {
    let now = Utc::now();
    product::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(format!("{} description", name)),
        price: Set(price),
        stock: Set(stock),
        sku: Set(format!("SKU-{}", name.to_uppercase().replace(' ', "-"))),
        image: Set(None),
        images: Set(serde_json::json!([])),
        is_active: Set(true),
        is_featured: Set(false),
        category_id: Set(category_id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed product")
}

pub async fn seed_user(
    db: &DatabaseConnection,
    auth: &AuthService,
    email: &str,
    password: &str,
    roles: &[&str],
) -> user::Model {
    let now = Utc::now();
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(auth.hash_password(password).expect("hash")),
        first_name: Set("Test".into()),
        last_name: Set("User".into()),
        phone: Set(None),
        address: Set(None),
        postal_code: Set(None),
        city: Set(None),
        roles: Set(serde_json::json!(roles)),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed user")
}
