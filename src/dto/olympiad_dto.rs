use crate::dto::question_dto::{AnswerPayload, QuestionView};
use crate::models::grading::GradingSystem;
use crate::models::result::UserAnswer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOlympiadRequest {
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub grading_system: GradingSystem,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[validate(range(min = 1))]
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOlympiadResponse {
    pub message: String,
    pub olympiad_id: i64,
}

/// Row shape of the olympiad listing (creator joined in).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OlympiadSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub grading_system: sqlx::types::Json<GradingSystem>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub creator_id: i64,
    pub creator_first_name: String,
    pub creator_last_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OlympiadDetailResponse {
    #[serde(flatten)]
    pub olympiad: OlympiadSummary,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OlympiadAnswerRequest {
    pub result_id: i64,
    pub question_id: i64,
    pub answer: AnswerPayload,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(range(min = 0))]
    pub score: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewResponse {
    pub message: String,
    pub score: i32,
    pub grade: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OlympiadResultResponse {
    pub id: i64,
    pub user_id: i64,
    pub olympiad_id: i64,
    pub started_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub score: i32,
    pub total_score: i32,
    pub grade: Option<String>,
    pub is_checked: bool,
    pub answers: Vec<UserAnswer>,
}
