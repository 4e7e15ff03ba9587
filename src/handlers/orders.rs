use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::flash_redirect;
use crate::auth::policy::AuthRouterExt;
use crate::auth::AuthUser;
use crate::entities::order;
use crate::errors::ApiError;
use crate::services::orders::OrderWithItems;
use crate::session::{FlashMessage, Session};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct OrderPage {
    #[serde(flatten)]
    pub order: OrderWithItems,
    pub flash: Vec<FlashMessage>,
}

/// GET /order/:order_number
pub async fn view_order(
    State(state): State<AppState>,
    session: Session,
    caller: AuthUser,
    Path(order_number): Path<String>,
) -> Result<Json<OrderPage>, ApiError> {
    let order = state
        .services
        .orders
        .get_by_order_number(&order_number, caller.user_id, caller.is_admin())
        .await?;
    Ok(Json(OrderPage {
        order,
        flash: session.take_flash(),
    }))
}

/// POST /order/:order_number/confirm
pub async fn confirm_order(
    State(state): State<AppState>,
    session: Session,
    caller: AuthUser,
    Path(order_number): Path<String>,
) -> Result<Response, ApiError> {
    let (confirmed, transitioned) = state
        .services
        .orders
        .confirm(&order_number, caller.user_id)
        .await?;
    let flash = if transitioned {
        FlashMessage::success(format!("Order {} confirmed", confirmed.order_number))
    } else {
        FlashMessage::info(format!(
            "Order {} was already confirmed",
            confirmed.order_number
        ))
    };
    Ok(flash_redirect(&session, flash, &format!("/order/{}", confirmed.order_number)).into_response())
}

/// GET /user/dashboard
pub async fn user_dashboard(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Vec<order::Model>>, ApiError> {
    let orders = state.services.orders.list_for_user(caller.user_id).await?;
    Ok(Json(orders))
}

pub fn routes(state: &AppState) -> Router<AppState> {
    let view = Router::new()
        .route("/order/:order_number", get(view_order))
        .route("/user/dashboard", get(user_dashboard))
        .with_policy(state.auth.clone(), "orders:view_own");
    let confirm = Router::new()
        .route("/order/:order_number/confirm", post(confirm_order))
        .with_policy(state.auth.clone(), "orders:confirm");
    view.merge(confirm)
}
