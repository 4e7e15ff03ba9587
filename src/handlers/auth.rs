use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::auth::policy::AuthRouterExt;
use crate::entities::user;
use crate::errors::ApiError;
use crate::services::users::{LoginInput, RegisterInput};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: user::Model,
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<user::Model>), ApiError> {
    let created = state.services.users.register(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (token, user) = state.services.users.login(input).await?;
    Ok(Json(LoginResponse { token, user }))
}

/// GET /user/profile
pub async fn profile(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<user::Model>, ApiError> {
    let user = state.services.users.get_profile(caller.user_id).await?;
    Ok(Json(user))
}

pub fn routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login));
    let protected = Router::new()
        .route("/user/profile", get(profile))
        .with_policy(state.auth.clone(), "profile:view");
    public.merge(protected)
}
