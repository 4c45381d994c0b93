use crate::models::role::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub patronymic: Option<String>,
    pub email: String,
    pub phone: String,
    pub school: String,
    pub role: Role,
    pub login: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}
