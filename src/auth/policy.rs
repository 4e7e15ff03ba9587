//! Declarative access policies.
//!
//! Every protected route names a `resource:action` policy; the table below is
//! the single place that says which roles may perform it. Unknown policies
//! fail closed.

use super::{auth_middleware, AuthError, AuthService, AuthUser};
use crate::entities::user::{ROLE_ADMIN, ROLE_USER};
use axum::{extract::Request, middleware, middleware::Next, response::Response, Router};
use lazy_static::lazy_static;
use std::collections::HashMap;
use tracing::warn;

lazy_static! {
    static ref POLICIES: HashMap<&'static str, Vec<&'static str>> = {
        let mut table = HashMap::new();
        table.insert("orders:place", vec![ROLE_USER, ROLE_ADMIN]);
        table.insert("orders:view_own", vec![ROLE_USER, ROLE_ADMIN]);
        table.insert("orders:confirm", vec![ROLE_USER, ROLE_ADMIN]);
        table.insert("profile:view", vec![ROLE_USER, ROLE_ADMIN]);
        table.insert("admin:dashboard", vec![ROLE_ADMIN]);
        table.insert("admin:products", vec![ROLE_ADMIN]);
        table.insert("admin:categories", vec![ROLE_ADMIN]);
        table.insert("admin:orders", vec![ROLE_ADMIN]);
        table.insert("admin:users", vec![ROLE_ADMIN]);
        table
    };
}

/// True when any of `roles` satisfies `policy`.
pub fn is_allowed(policy: &str, roles: &[String]) -> bool {
    match POLICIES.get(policy) {
        Some(allowed) => roles.iter().any(|role| allowed.contains(&role.as_str())),
        None => {
            warn!(%policy, "unknown access policy; denying");
            false
        }
    }
}

async fn policy_middleware(
    policy: &'static str,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingToken)?;
    if !is_allowed(policy, &user.roles) {
        return Err(AuthError::Forbidden);
    }
    Ok(next.run(request).await)
}

/// Router sugar for attaching authentication and policy checks.
pub trait AuthRouterExt<S> {
    /// Requires a valid bearer token.
    fn with_auth(self, auth: AuthService) -> Self;

    /// Requires a valid bearer token whose roles satisfy `policy`.
    fn with_policy(self, auth: AuthService, policy: &'static str) -> Self;
}

impl<S> AuthRouterExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self, auth: AuthService) -> Self {
        self.layer(middleware::from_fn_with_state(auth, auth_middleware))
    }

    fn with_policy(self, auth: AuthService, policy: &'static str) -> Self {
        // Policy layer sits inside the auth layer so AuthUser is present.
        self.layer(middleware::from_fn(move |request, next| {
            policy_middleware(policy, request, next)
        }))
        .layer(middleware::from_fn_with_state(auth, auth_middleware))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_policies_exclude_plain_users() {
        let user_roles = vec!["user".to_string()];
        let admin_roles = vec!["user".to_string(), "admin".to_string()];
        assert!(!is_allowed("admin:products", &user_roles));
        assert!(is_allowed("admin:products", &admin_roles));
    }

    #[test]
    fn customer_policies_admit_both_roles() {
        assert!(is_allowed("orders:place", &["user".to_string()]));
        assert!(is_allowed("orders:place", &["admin".to_string()]));
    }

    #[test]
    fn unknown_policy_fails_closed() {
        assert!(!is_allowed("warehouse:restock", &["admin".to_string()]));
    }
}
