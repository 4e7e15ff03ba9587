pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod products;

use crate::session::{FlashMessage, Session};
use axum::response::Redirect;

/// Queue a flash message and answer with a 303 so the client re-fetches the
/// target with GET.
pub(crate) fn flash_redirect(session: &Session, flash: FlashMessage, to: &str) -> Redirect {
    session.push_flash(flash);
    Redirect::to(to)
}
