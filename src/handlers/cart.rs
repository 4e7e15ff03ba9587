use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::flash_redirect;
use crate::errors::{ApiError, ServiceError};
use crate::session::{csrf, CartLine, FlashMessage, Session};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CartAddForm {
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(rename = "_token")]
    pub token: String,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct CartUpdateForm {
    pub quantity: i32,
    #[serde(rename = "_token")]
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct CartTokenForm {
    #[serde(rename = "_token")]
    pub token: String,
}

/// Cart line plus the per-line anti-forgery tokens the client posts back.
#[derive(Debug, Serialize)]
pub struct CartLineResponse {
    #[serde(flatten)]
    pub line: CartLine,
    pub update_token: String,
    pub remove_token: String,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub lines: Vec<CartLineResponse>,
    pub total_quantity: i32,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub clear_token: String,
    pub flash: Vec<FlashMessage>,
}

fn require_token(session: &Session, action: &str, token: &str) -> Result<(), ApiError> {
    if session.verify_csrf(action, token) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Invalid anti-forgery token".into()))
    }
}

/// Mutation failures become a flash message and a redirect back to the cart,
/// never an error page.
fn flash_service_error(session: &Session, err: ServiceError) -> Response {
    match err {
        ServiceError::DatabaseError(_) | ServiceError::InternalError(_) | ServiceError::Other(_) => {
            ApiError::ServiceError(err).into_response()
        }
        other => flash_redirect(
            session,
            FlashMessage::error(other.response_message()),
            "/cart",
        )
        .into_response(),
    }
}

/// GET /cart
pub async fn view_cart(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CartResponse>, ApiError> {
    let view = state.services.cart.view(&session).await?;
    let lines = view
        .lines
        .into_iter()
        .map(|line| {
            let update_token = session.csrf_token(&csrf::cart_update_action(line.product_id));
            let remove_token = session.csrf_token(&csrf::cart_remove_action(line.product_id));
            CartLineResponse {
                line,
                update_token,
                remove_token,
            }
        })
        .collect();
    Ok(Json(CartResponse {
        lines,
        total_quantity: view.total_quantity,
        subtotal: view.subtotal,
        tax: view.tax,
        total: view.total,
        clear_token: session.csrf_token(&csrf::cart_clear_action()),
        flash: session.take_flash(),
    }))
}

/// POST /cart/add/:id
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<Uuid>,
    Form(form): Form<CartAddForm>,
) -> Result<Response, ApiError> {
    require_token(&session, &csrf::cart_add_action(product_id), &form.token)?;
    match state
        .services
        .cart
        .add(&session, product_id, form.quantity)
        .await
    {
        Ok(_) => Ok(flash_redirect(
            &session,
            FlashMessage::success("Product added to cart"),
            "/cart",
        )
        .into_response()),
        Err(err) => Ok(flash_service_error(&session, err)),
    }
}

/// POST /cart/update/:id
pub async fn update_cart_line(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<Uuid>,
    Form(form): Form<CartUpdateForm>,
) -> Result<Response, ApiError> {
    require_token(&session, &csrf::cart_update_action(product_id), &form.token)?;
    match state
        .services
        .cart
        .update(&session, product_id, form.quantity)
        .await
    {
        Ok(_) => Ok(flash_redirect(
            &session,
            FlashMessage::success("Cart updated"),
            "/cart",
        )
        .into_response()),
        Err(err) => Ok(flash_service_error(&session, err)),
    }
}

/// POST /cart/remove/:id
pub async fn remove_from_cart(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<Uuid>,
    Form(form): Form<CartTokenForm>,
) -> Result<Response, ApiError> {
    require_token(&session, &csrf::cart_remove_action(product_id), &form.token)?;
    match state.services.cart.remove(&session, product_id).await {
        Ok(_) => Ok(flash_redirect(
            &session,
            FlashMessage::success("Product removed from cart"),
            "/cart",
        )
        .into_response()),
        Err(err) => Ok(flash_service_error(&session, err)),
    }
}

/// POST /cart/clear
pub async fn clear_cart(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CartTokenForm>,
) -> Result<Response, ApiError> {
    require_token(&session, &csrf::cart_clear_action(), &form.token)?;
    state.services.cart.clear(&session).await?;
    Ok(flash_redirect(&session, FlashMessage::success("Cart cleared"), "/cart").into_response())
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(view_cart))
        .route("/cart/add/:id", post(add_to_cart))
        .route("/cart/update/:id", post(update_cart_line))
        .route("/cart/remove/:id", post(remove_from_cart))
        .route("/cart/clear", post(clear_cart))
}
