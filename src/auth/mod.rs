pub mod policy;

use crate::entities::user;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// JWT claims carried by every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Account email
    pub email: String,
    /// Granted roles
    pub roles: Vec<String>,
    pub iss: String,
    pub aud: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization token")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Insufficient permissions")]
    Forbidden,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Password hashing failed")]
    Hashing,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidToken | Self::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Hashing => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": self.to_string(),
            "timestamp": Utc::now().to_rfc3339(),
        });
        (status, Json(body)).into_response()
    }
}

/// Issues and validates tokens, and hashes passwords. Cloned freely into
/// middleware and services.
#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    expiration_secs: usize,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiration_secs", &self.expiration_secs)
            .finish()
    }
}

impl AuthService {
    pub fn new(secret: &str, issuer: String, audience: String, expiration_secs: usize) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            expiration_secs,
        }
    }

    pub fn generate_token(&self, user: &user::Model) -> Result<String, AuthError> {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            roles: user.effective_roles(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now,
            exp: now + self.expiration_secs,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::InvalidToken)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::Hashing)
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<(), AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)
    }
}

/// Authenticated caller, available to handlers behind `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(user::ROLE_ADMIN)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Validates the bearer token and stores the caller in request extensions.
pub async fn auth_middleware(
    State(auth): State<AuthService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(&request).ok_or(AuthError::MissingToken)?;
    let claims = auth.validate_token(token)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
    request.extensions_mut().insert(AuthUser {
        user_id,
        email: claims.email,
        roles: claims.roles,
    });
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn service() -> AuthService {
        AuthService::new(
            "0123456789abcdef0123456789abcdef",
            "boutique-api".into(),
            "boutique-clients".into(),
            3600,
        )
    }

    fn sample_user(roles: Vec<String>) -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            email: "alice@example.com".into(),
            password_hash: "x".into(),
            first_name: "Alice".into(),
            last_name: "Martin".into(),
            phone: None,
            address: None,
            postal_code: None,
            city: None,
            roles: serde_json::json!(roles),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn token_round_trip_preserves_identity_and_roles() {
        let auth = service();
        let user = sample_user(vec!["admin".into()]);
        let token = auth.generate_token(&user).unwrap();
        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, "alice@example.com");
        assert!(claims.roles.contains(&"admin".to_string()));
        assert!(claims.roles.contains(&"user".to_string()));
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let auth = service();
        let other = AuthService::new(
            "ffffffffffffffffffffffffffffffff",
            "boutique-api".into(),
            "boutique-clients".into(),
            3600,
        );
        let token = other.generate_token(&sample_user(vec![])).unwrap();
        assert!(auth.validate_token(&token).is_err());
    }

    #[test]
    fn password_hash_verifies_and_rejects_wrong_password() {
        let auth = service();
        let hash = auth.hash_password("s3cret-passw0rd").unwrap();
        assert!(auth.verify_password("s3cret-passw0rd", &hash).is_ok());
        assert!(auth.verify_password("wrong", &hash).is_err());
    }
}
