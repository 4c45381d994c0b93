use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// One user's pass at a test. `finished_at` is NULL while the attempt is
/// in progress; `total_score` is snapshotted at start time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TestResult {
    pub id: i64,
    pub user_id: i64,
    pub test_id: i64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub score: i32,
    pub total_score: i32,
    pub grade: Option<String>,
}

/// One user's pass at an olympiad. The deadline is fixed at start time as
/// min(start + duration, olympiad end); `is_checked` flips when a teacher
/// reviews the attempt.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OlympiadResult {
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
}

/// Stored answer for one question of one attempt. At most one row exists
/// per (result, question, is_olympiad); a resubmission replaces it whole.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserAnswer {
    pub result_id: i64,
    pub question_id: i64,
    pub is_olympiad: bool,
    pub answer_ids: Option<Json<Vec<i64>>>,
    pub answer_text: Option<String>,
}
