use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::policy::AuthRouterExt;
use crate::entities::{category, order, product, user, OrderStatus};
use crate::errors::ApiError;
use crate::services::catalog::{
    CreateCategoryInput, CreateProductInput, UpdateCategoryInput, UpdateProductInput,
};
use crate::services::orders::DashboardStats;
use crate::AppState;

/// GET /admin/dashboard
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardStats>, ApiError> {
    Ok(Json(state.services.orders.dashboard_stats().await?))
}

/// GET /admin/products
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<product::Model>>, ApiError> {
    Ok(Json(state.services.catalog.list_all_products().await?))
}

/// GET /admin/products/low-stock
pub async fn low_stock(
    State(state): State<AppState>,
) -> Result<Json<Vec<product::Model>>, ApiError> {
    Ok(Json(state.services.catalog.list_low_stock_products().await?))
}

/// GET /admin/products/:id
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<product::Model>, ApiError> {
    Ok(Json(state.services.catalog.get_product(id).await?))
}

/// POST /admin/products
pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<CreateProductInput>,
) -> Result<(StatusCode, Json<product::Model>), ApiError> {
    let created = state.services.catalog.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /admin/products/:id
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> Result<Json<product::Model>, ApiError> {
    Ok(Json(state.services.catalog.update_product(id, input).await?))
}

/// DELETE /admin/products/:id
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.services.catalog.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<category::Model>>, ApiError> {
    Ok(Json(state.services.catalog.list_all_categories().await?))
}

/// POST /admin/categories
pub async fn create_category(
    State(state): State<AppState>,
    Json(input): Json<CreateCategoryInput>,
) -> Result<(StatusCode, Json<category::Model>), ApiError> {
    let created = state.services.catalog.create_category(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /admin/categories/:id
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCategoryInput>,
) -> Result<Json<category::Model>, ApiError> {
    Ok(Json(state.services.catalog.update_category(id, input).await?))
}

/// DELETE /admin/categories/:id — refused while products reference it.
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.services.catalog.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/orders
pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<order::Model>>, ApiError> {
    Ok(Json(state.services.orders.list_all().await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: OrderStatus,
}

/// PUT /admin/orders/:id/status
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<order::Model>, ApiError> {
    Ok(Json(
        state.services.orders.update_status(id, body.status).await?,
    ))
}

/// GET /admin/users
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<user::Model>>, ApiError> {
    Ok(Json(state.services.users.list_users().await?))
}

#[derive(Debug, Deserialize)]
pub struct SetActiveBody {
    pub is_active: bool,
}

/// PUT /admin/users/:id/active
pub async fn set_user_active(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SetActiveBody>,
) -> Result<Json<user::Model>, ApiError> {
    Ok(Json(
        state
            .services
            .users
            .set_user_active(id, body.is_active)
            .await?,
    ))
}

pub fn routes(state: &AppState) -> Router<AppState> {
    let dashboard_routes = Router::new()
        .route("/admin/dashboard", get(dashboard))
        .with_policy(state.auth.clone(), "admin:dashboard");
    let product_routes = Router::new()
        .route("/admin/products", get(list_products).post(create_product))
        .route("/admin/products/low-stock", get(low_stock))
        .route(
            "/admin/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .with_policy(state.auth.clone(), "admin:products");
    let category_routes = Router::new()
        .route(
            "/admin/categories",
            get(list_categories).post(create_category),
        )
        .route(
            "/admin/categories/:id",
            put(update_category).delete(delete_category),
        )
        .with_policy(state.auth.clone(), "admin:categories");
    let order_routes = Router::new()
        .route("/admin/orders", get(list_orders))
        .route("/admin/orders/:id/status", put(update_order_status))
        .with_policy(state.auth.clone(), "admin:orders");
    let user_routes = Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id/active", put(set_user_active))
        .with_policy(state.auth.clone(), "admin:users");

    dashboard_routes
        .merge(product_routes)
        .merge(category_routes)
        .merge(order_routes)
        .merge(user_routes)
}
