use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};

use super::flash_redirect;
use crate::auth::policy::AuthRouterExt;
use crate::auth::AuthUser;
use crate::errors::{ApiError, ServiceError};
use crate::services::cart::CartView;
use crate::services::checkout::{PaymentCard, ShippingDetails};
use crate::session::{FlashMessage, Session};
use crate::AppState;

/// Flat form the checkout page posts: shipping fields plus the card.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub address: String,
    pub postal_code: String,
    pub city: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub card_holder: String,
    pub card_number: String,
    pub card_expiry_month: i32,
    pub card_expiry_year: i32,
    pub card_cvc: String,
}

/// Shipping fields pre-filled from the customer profile.
#[derive(Debug, Serialize)]
pub struct CheckoutPrefill {
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutPage {
    #[serde(flatten)]
    pub cart: CartView,
    pub prefill: CheckoutPrefill,
    pub flash: Vec<FlashMessage>,
}

/// GET /cart/checkout
pub async fn checkout_page(
    State(state): State<AppState>,
    session: Session,
    caller: AuthUser,
) -> Result<Response, ApiError> {
    let cart = state.services.cart.view(&session).await?;
    if cart.is_empty() {
        return Ok(flash_redirect(
            &session,
            FlashMessage::warning("Your cart is empty"),
            "/cart",
        )
        .into_response());
    }
    let profile = state.services.users.get_profile(caller.user_id).await?;
    Ok(Json(CheckoutPage {
        cart,
        prefill: CheckoutPrefill {
            address: profile.address,
            postal_code: profile.postal_code,
            city: profile.city,
            country: state.config.default_country.clone(),
            phone: profile.phone,
        },
        flash: session.take_flash(),
    })
    .into_response())
}

/// POST /cart/checkout/process
pub async fn process_checkout(
    State(state): State<AppState>,
    session: Session,
    caller: AuthUser,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, ApiError> {
    let shipping = ShippingDetails {
        address: form.address,
        postal_code: form.postal_code,
        city: form.city,
        country: form.country,
        phone: form.phone,
        notes: form.notes,
    };
    let card = PaymentCard {
        card_holder: form.card_holder,
        card_number: form.card_number,
        card_expiry_month: form.card_expiry_month,
        card_expiry_year: form.card_expiry_year,
        card_cvc: form.card_cvc,
    };

    match state
        .services
        .checkout
        .place_order(&session, caller.user_id, shipping, card)
        .await
    {
        Ok(order) => Ok(flash_redirect(
            &session,
            FlashMessage::success(format!("Order {} placed", order.order_number)),
            &format!("/order/{}", order.order_number),
        )
        .into_response()),
        Err(err @ ServiceError::InvalidOperation(_)) => Ok(flash_redirect(
            &session,
            FlashMessage::warning(err.response_message()),
            "/cart",
        )
        .into_response()),
        Err(
            err @ (ServiceError::ValidationError(_)
            | ServiceError::PaymentRejected(_)
            | ServiceError::InsufficientStock(_)),
        ) => Ok(flash_redirect(
            &session,
            FlashMessage::error(err.response_message()),
            "/cart/checkout",
        )
        .into_response()),
        Err(err) => Err(err.into()),
    }
}

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/cart/checkout", get(checkout_page))
        .route("/cart/checkout/process", post(process_checkout))
        .with_policy(state.auth.clone(), "orders:place")
}
