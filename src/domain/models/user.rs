use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const ROLE_CUSTOMER: &str = "customer";
pub const ROLE_STAFF: &str = "staff";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, name: String, password_hash: String, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: normalize_email(&email),
            name,
            password_hash,
            role: role.to_string(),
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Staff access is granted to admins as well.
    pub fn is_staff(&self) -> bool {
        self.role == ROLE_STAFF || self.role == ROLE_ADMIN
    }
}

pub fn is_valid_role(role: &str) -> bool {
    matches!(role, ROLE_CUSTOMER | ROLE_STAFF | ROLE_ADMIN)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
