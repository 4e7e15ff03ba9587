pub mod csrf;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use rand::RngCore;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "boutique_session";

/// Sessions idle longer than this are dropped.
const SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24);

/// How often the background sweep looks for idle sessions.
const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 10);

/// Shopping cart held in the session. Maps product id to requested quantity;
/// iteration order is stable so rendered carts do not shuffle between requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cart {
    items: BTreeMap<Uuid, i32>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` to the existing line, creating it when absent.
    pub fn add(&mut self, product_id: Uuid, quantity: i32) {
        let entry = self.items.entry(product_id).or_insert(0);
        *entry = entry.saturating_add(quantity.max(0));
        if *entry <= 0 {
            self.items.remove(&product_id);
        }
    }

    /// Replaces the line quantity. Zero or negative removes the line.
    pub fn set(&mut self, product_id: Uuid, quantity: i32) {
        if quantity > 0 {
            self.items.insert(product_id, quantity);
        } else {
            self.items.remove(&product_id);
        }
    }

    pub fn remove(&mut self, product_id: Uuid) {
        self.items.remove(&product_id);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn quantity(&self, product_id: Uuid) -> i32 {
        self.items.get(&product_id).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total number of units across all lines.
    pub fn total_quantity(&self) -> i32 {
        self.items.values().fold(0, |acc, q| acc.saturating_add(*q))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Uuid, i32)> + '_ {
        self.items.iter().map(|(id, qty)| (*id, *qty))
    }

    pub fn product_ids(&self) -> Vec<Uuid> {
        self.items.keys().copied().collect()
    }
}

/// One flash message queued for the next rendered response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlashMessage {
    pub kind: String,
    pub message: String,
}

impl FlashMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: "success".into(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: "error".into(),
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: "warning".into(),
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: "info".into(),
            message: message.into(),
        }
    }
}

/// Per-visitor server-side state.
#[derive(Debug, Clone)]
struct SessionData {
    cart: Cart,
    flash: Vec<FlashMessage>,
    csrf_secret: [u8; 32],
    last_seen: Instant,
}

impl SessionData {
    fn new() -> Self {
        let mut csrf_secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut csrf_secret);
        Self {
            cart: Cart::new(),
            flash: Vec::new(),
            csrf_secret,
            last_seen: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.last_seen.elapsed() > ttl
    }
}

/// In-memory session store keyed by the opaque cookie value. Idle sessions
/// expire after the TTL; [`purge_loop`] reclaims their memory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, SessionData>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_ttl(SESSION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            ttl,
        }
    }

    fn new_session_id() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Returns a handle for `session_id`, creating the session when the id is
    /// unknown, expired or absent. The bool is true when a fresh session was
    /// created. Touching a live session resets its idle clock.
    pub fn acquire(&self, session_id: Option<&str>) -> (Session, bool) {
        if let Some(id) = session_id {
            if let Some(mut data) = self.sessions.get_mut(id) {
                if data.is_expired(self.ttl) {
                    drop(data);
                    self.sessions.remove(id);
                } else {
                    data.last_seen = Instant::now();
                    return (
                        Session {
                            id: id.to_string(),
                            store: self.clone(),
                        },
                        false,
                    );
                }
            }
        }
        let id = Self::new_session_id();
        self.sessions.insert(id.clone(), SessionData::new());
        (
            Session {
                id,
                store: self.clone(),
            },
            true,
        )
    }

    /// Drops every session idle past the TTL.
    pub fn purge_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, data| !data.is_expired(self.ttl));
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Periodically sweeps idle sessions out of the store. Spawn once at startup.
pub async fn purge_loop(store: SessionStore) {
    let mut ticker = tokio::time::interval(PURGE_INTERVAL);
    loop {
        ticker.tick().await;
        let purged = store.purge_expired();
        if purged > 0 {
            tracing::debug!(purged, remaining = store.len(), "expired sessions purged");
        }
    }
}

/// Handle to one visitor's session. Cheap to clone; all mutation goes through
/// the shared store so concurrent requests on the same session stay coherent.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    store: SessionStore,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cart(&self) -> Cart {
        self.store
            .sessions
            .get(&self.id)
            .map(|data| data.cart.clone())
            .unwrap_or_default()
    }

    /// Applies `f` to the cart and returns the updated copy.
    pub fn with_cart<F>(&self, f: F) -> Cart
    where
        F: FnOnce(&mut Cart),
    {
        match self.store.sessions.get_mut(&self.id) {
            Some(mut data) => {
                f(&mut data.cart);
                data.cart.clone()
            }
            None => Cart::new(),
        }
    }

    pub fn push_flash(&self, flash: FlashMessage) {
        if let Some(mut data) = self.store.sessions.get_mut(&self.id) {
            data.flash.push(flash);
        }
    }

    /// Drains and returns the queued flash messages.
    pub fn take_flash(&self) -> Vec<FlashMessage> {
        self.store
            .sessions
            .get_mut(&self.id)
            .map(|mut data| std::mem::take(&mut data.flash))
            .unwrap_or_default()
    }

    pub fn csrf_token(&self, action: &str) -> String {
        let secret = self
            .store
            .sessions
            .get(&self.id)
            .map(|data| data.csrf_secret)
            .unwrap_or_default();
        csrf::token_for(&secret, action)
    }

    pub fn verify_csrf(&self, action: &str, token: &str) -> bool {
        let secret = match self.store.sessions.get(&self.id) {
            Some(data) => data.csrf_secret,
            None => return false,
        };
        csrf::verify(&secret, action, token)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

fn session_id_from_cookies(parts: &axum::http::HeaderMap) -> Option<String> {
    let raw = parts.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// Resolves (or creates) the visitor session, exposes it through request
/// extensions and sets the cookie on first contact.
pub async fn session_middleware(
    State(store): State<SessionStore>,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = session_id_from_cookies(request.headers());
    let (session, created) = store.acquire(existing.as_deref());
    let session_id = session.id().to_string();
    request.extensions_mut().insert(session);

    let mut response = next.run(request).await;

    if created {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE, session_id
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

/// One rendered cart line: the live product joined with the session quantity.
/// `line_total` is tax-inclusive.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub unit_price_with_tax: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}
