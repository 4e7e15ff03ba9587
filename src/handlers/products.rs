use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::product;
use crate::errors::ApiError;
use crate::session::{csrf, Session};
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryRef {
    pub id: Uuid,
    #[schema(example = "Accessories")]
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    #[schema(example = "Leather wallet")]
    pub name: String,
    pub description: String,
    /// Pre-tax unit price
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    /// Unit price including 20% tax, rounded to 2 decimals
    #[schema(value_type = String, example = "23.99")]
    pub price_with_tax: Decimal,
    pub image: Option<String>,
    pub category: Option<CategoryRef>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    #[schema(inline)]
    pub product: ProductResponse,
    pub stock: i32,
    pub in_stock: bool,
    pub images: serde_json::Value,
    /// Anti-forgery token for POST /cart/add/{id}, bound to the caller's session
    pub cart_token: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductListQuery {
    /// Restrict to one category
    pub category: Option<Uuid>,
    /// Case-sensitive name/description substring match
    pub search: Option<String>,
}

fn to_response(
    product: product::Model,
    categories: &HashMap<Uuid, String>,
) -> ProductResponse {
    let category = categories
        .get(&product.category_id)
        .map(|name| CategoryRef {
            id: product.category_id,
            name: name.clone(),
        });
    ProductResponse {
        id: product.id,
        price_with_tax: product.price_with_tax(),
        name: product.name,
        description: product.description,
        price: product.price,
        image: product.image,
        category,
    }
}

async fn category_names(state: &AppState) -> Result<HashMap<Uuid, String>, ApiError> {
    let categories = state.services.catalog.list_all_categories().await?;
    Ok(categories.into_iter().map(|c| (c.id, c.name)).collect())
}

/// List sellable products.
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "products",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Active, in-stock products", body = [ProductResponse]),
        (status = 404, description = "Unknown category", body = crate::errors::ErrorResponse)
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = match (&query.category, &query.search) {
        (Some(category_id), search) => {
            let (_, products) = state
                .services
                .catalog
                .list_products_in_category(*category_id, search.as_deref())
                .await?;
            products
        }
        (None, Some(term)) => state.services.catalog.search_products(term).await?,
        (None, None) => state.services.catalog.list_active_products().await?,
    };

    let categories = category_names(&state).await?;
    Ok(Json(
        products
            .into_iter()
            .map(|p| to_response(p, &categories))
            .collect(),
    ))
}

/// Fetch one sellable product.
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "products",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product detail", body = ProductDetailResponse),
        (status = 404, description = "Missing or inactive product", body = crate::errors::ErrorResponse)
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductDetailResponse>, ApiError> {
    let product = state.services.catalog.get_active_product(id).await?;
    let categories = category_names(&state).await?;
    let cart_token = session.csrf_token(&csrf::cart_add_action(product.id));
    let stock = product.stock;
    let in_stock = product.is_in_stock();
    let images = product.images.clone();
    Ok(Json(ProductDetailResponse {
        product: to_response(product, &categories),
        stock,
        in_stock,
        images,
        cart_token,
    }))
}

/// Featured products for the home page, at most six.
#[utoipa::path(
    get,
    path = "/api/products/featured",
    tag = "products",
    responses((status = 200, description = "Featured products", body = [ProductResponse]))
)]
pub async fn featured_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.services.catalog.list_featured_products().await?;
    let categories = category_names(&state).await?;
    Ok(Json(
        products
            .into_iter()
            .map(|p| to_response(p, &categories))
            .collect(),
    ))
}

/// Active categories, alphabetical.
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "products",
    responses((status = 200, description = "Active categories", body = [CategoryRef]))
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryRef>>, ApiError> {
    let categories = state.services.catalog.list_active_categories().await?;
    Ok(Json(
        categories
            .into_iter()
            .map(|c| CategoryRef {
                id: c.id,
                name: c.name,
            })
            .collect(),
    ))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products))
        .route("/api/products/featured", get(featured_products))
        .route("/api/products/:id", get(get_product))
        .route("/api/categories", get(list_categories))
}
