pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod session;

use axum::http::{HeaderValue, Method};
use axum::{middleware, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::middleware_helpers::security_headers::security_headers_middleware;
use crate::services::AppServices;
use crate::session::{session_middleware, SessionStore};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: Arc<AppConfig>,
    pub services: AppServices,
    pub auth: AuthService,
    pub sessions: SessionStore,
    pub event_sender: EventSender,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: Arc<AppConfig>, event_sender: EventSender) -> Self {
        let auth = AuthService::new(
            &config.jwt_secret,
            config.auth_issuer.clone(),
            config.auth_audience.clone(),
            config.jwt_expiration,
        );
        let services = AppServices::new(db.clone(), event_sender.clone(), auth.clone(), &config);
        Self {
            db,
            config,
            services,
            auth,
            sessions: SessionStore::new(),
            event_sender,
        }
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origin = match &config.cors_allowed_origins {
        Some(origins) => {
            let parsed: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| match HeaderValue::from_str(s) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(origin = %s, "ignoring unparsable CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(parsed)
        }
        None => AllowOrigin::any(),
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

/// Full application router: storefront, cart, checkout, auth, back-office,
/// API docs, with sessions and the fixed security headers on everything.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::health::routes())
        .merge(handlers::products::routes())
        .merge(handlers::cart::routes())
        .merge(handlers::checkout::routes(&state))
        .merge(handlers::orders::routes(&state))
        .merge(handlers::auth::routes(&state))
        .merge(handlers::admin::routes(&state))
        .merge(openapi::swagger_ui())
        .layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            session_middleware,
        ))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
