use crate::auth::{AuthError, AuthService};
use crate::db::DbPool;
use crate::entities::user;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

fn map_auth_err(err: AuthError) -> ServiceError {
    match err {
        AuthError::InvalidCredentials => ServiceError::Unauthorized("Invalid credentials".into()),
        AuthError::Hashing => ServiceError::InternalError("Password hashing failed".into()),
        other => ServiceError::Unauthorized(other.to_string()),
    }
}

/// Registration, login and profile reads.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    auth: AuthService,
}

impl UserService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, auth: AuthService) -> Self {
        Self {
            db,
            event_sender,
            auth,
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, ServiceError> {
        let found = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?;
        Ok(found)
    }

    /// Creates a customer account. Email addresses are unique and
    /// case-preserved; lookups match what was registered.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<user::Model, ServiceError> {
        input.validate()?;
        if self.find_by_email(&input.email).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Account {} already exists",
                input.email
            )));
        }

        let password_hash = self.auth.hash_password(&input.password).map_err(map_auth_err)?;
        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(input.email),
            password_hash: Set(password_hash),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            phone: Set(input.phone),
            address: Set(input.address),
            postal_code: Set(input.postal_code),
            city: Set(input.city),
            roles: Set(serde_json::json!([user::ROLE_USER])),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let saved = model.insert(&*self.db).await?;
        info!(user_id = %saved.id, "user registered");
        self.event_sender
            .send_or_log(Event::UserRegistered(saved.id))
            .await;
        Ok(saved)
    }

    /// Verifies credentials and issues a token. Disabled accounts and unknown
    /// emails fail the same way as a bad password.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<(String, user::Model), ServiceError> {
        input.validate()?;
        let user = self
            .find_by_email(&input.email)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| ServiceError::Unauthorized("Invalid credentials".into()))?;

        self.auth
            .verify_password(&input.password, &user.password_hash)
            .map_err(map_auth_err)?;

        let token = self.auth.generate_token(&user).map_err(map_auth_err)?;
        Ok((token, user))
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, user_id: Uuid) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<user::Model>, ServiceError> {
        let users = user::Entity::find()
            .order_by_desc(user::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(users)
    }

    /// Back-office account toggle. A disabled account cannot log in; existing
    /// tokens keep working until they expire.
    #[instrument(skip(self))]
    pub async fn set_user_active(
        &self,
        user_id: Uuid,
        is_active: bool,
    ) -> Result<user::Model, ServiceError> {
        let existing = self.get_profile(user_id).await?;
        let mut model: user::ActiveModel = existing.into();
        model.is_active = Set(is_active);
        model.updated_at = Set(Utc::now());
        Ok(model.update(&*self.db).await?)
    }
}
