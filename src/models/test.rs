use crate::models::grading::GradingSystem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Test {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub creator_id: i64,
    pub grading_system: Json<GradingSystem>,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
}
