//! Per-session CSRF tokens for the state-changing cart endpoints.
//!
//! A token is the hex HMAC-SHA256 of the action string under the session's
//! random secret, so tokens are deterministic per session and action but
//! unforgeable without the secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub fn cart_add_action(product_id: Uuid) -> String {
    format!("cart_add_{}", product_id)
}

pub fn cart_update_action(product_id: Uuid) -> String {
    format!("cart_update_{}", product_id)
}

pub fn cart_remove_action(product_id: Uuid) -> String {
    format!("cart_remove_{}", product_id)
}

pub fn cart_clear_action() -> String {
    "cart_clear".to_string()
}

/// Derives the token for `action` under `secret`.
pub fn token_for(secret: &[u8], action: &str) -> String {
    // HMAC accepts keys of any length, so this branch is unreachable.
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return String::new();
    };
    mac.update(action.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time verification via the Mac trait.
pub fn verify(secret: &[u8], action: &str, token: &str) -> bool {
    let Ok(expected) = hex::decode(token) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(action.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips() {
        let secret = [7u8; 32];
        let action = cart_add_action(Uuid::nil());
        let token = token_for(&secret, &action);
        assert!(verify(&secret, &action, &token));
    }

    #[test]
    fn token_is_action_bound() {
        let secret = [7u8; 32];
        let token = token_for(&secret, &cart_add_action(Uuid::nil()));
        assert!(!verify(&secret, &cart_remove_action(Uuid::nil()), &token));
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        let secret = [7u8; 32];
        assert!(!verify(&secret, "cart_clear", "not-hex!"));
        assert!(!verify(&secret, "cart_clear", ""));
    }

    #[test]
    fn different_secrets_produce_different_tokens() {
        let action = cart_clear_action();
        let a = token_for(&[1u8; 32], &action);
        let b = token_for(&[2u8; 32], &action);
        assert_ne!(a, b);
    }
}
