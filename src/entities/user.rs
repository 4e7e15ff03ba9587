use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Base role every authenticated account carries, whether or not it is stored.
pub const ROLE_USER: &str = "user";
/// Back-office role gating catalog management and aggregate views.
pub const ROLE_ADMIN: &str = "admin";

/// Account entity. The email address is the login identifier.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(nullable)]
    pub phone: Option<String>,
    #[sea_orm(nullable)]
    pub address: Option<String>,
    #[sea_orm(nullable)]
    pub postal_code: Option<String>,
    #[sea_orm(nullable)]
    pub city: Option<String>,
    /// Stored role tags as a JSON array of strings. The effective role set
    /// always includes `ROLE_USER` even when the column omits it.
    #[sea_orm(column_type = "Json")]
    pub roles: Json,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Stored roles plus the implicit base role, deduplicated.
    pub fn effective_roles(&self) -> Vec<String> {
        let mut roles: Vec<String> = self
            .roles
            .as_array()
            .map(|tags| {
                tags.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        if !roles.iter().any(|r| r == ROLE_USER) {
            roles.push(ROLE_USER.to_string());
        }
        roles
    }

    pub fn is_admin(&self) -> bool {
        self.effective_roles().iter().any(|r| r == ROLE_ADMIN)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(roles: serde_json::Value) -> Model {
        Model {
            id: Uuid::new_v4(),
            email: "jane@example.com".into(),
            password_hash: String::new(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            phone: None,
            address: None,
            postal_code: None,
            city: None,
            roles,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn base_role_is_implicit() {
        assert_eq!(user(serde_json::json!([])).effective_roles(), vec!["user"]);
        assert_eq!(
            user(serde_json::json!(["admin"])).effective_roles(),
            vec!["admin", "user"]
        );
    }

    #[test]
    fn stored_base_role_is_not_duplicated() {
        assert_eq!(
            user(serde_json::json!(["user"])).effective_roles(),
            vec!["user"]
        );
    }

    #[test]
    fn admin_detection() {
        assert!(user(serde_json::json!(["admin"])).is_admin());
        assert!(!user(serde_json::json!(["user"])).is_admin());
    }
}
