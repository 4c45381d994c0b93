use crate::dto::question_dto::{AnswerPayload, QuestionView};
use crate::models::grading::GradingSystem;
use crate::models::question::QuestionType;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTestRequest {
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub grading_system: GradingSystem,
    pub is_open: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTestResponse {
    pub message: String,
    pub test_id: i64,
}

/// Row shape of the public test listing (creator joined in).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TestSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub grading_system: sqlx::types::Json<GradingSystem>,
    pub is_open: bool,
    pub creator_id: i64,
    pub creator_first_name: String,
    pub creator_last_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestDetailResponse {
    #[serde(flatten)]
    pub test: TestSummary,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestAnswerRequest {
    pub question_id: i64,
    #[serde(flatten)]
    pub answer: AnswerPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartAttemptResponse {
    pub message: String,
    pub result_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinishAttemptResponse {
    pub message: String,
    pub score: i32,
    pub total_score: i32,
    pub percentage: f64,
    pub grade: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressQuestion {
    pub id: i64,
    pub content: String,
    pub question_type: QuestionType,
    pub points: i32,
    pub image_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<AnswerPayload>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressResponse {
    pub test_id: i64,
    pub result_id: i64,
    pub questions: Vec<ProgressQuestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestResultResponse {
    pub id: i64,
    pub user_id: i64,
    pub test_id: i64,
    pub test_title: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    pub score: i32,
    pub total_score: i32,
    pub grade: Option<String>,
    pub questions: Vec<ProgressQuestion>,
}

/// Row shape of a user's result history (test title joined in).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserTestResult {
    pub id: i64,
    pub test_id: i64,
    pub test_title: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    pub score: i32,
    pub total_score: i32,
    pub grade: Option<String>,
}
