use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum QuestionType {
    Single,
    Multiple,
    Text,
}

impl std::str::FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(QuestionType::Single),
            "multiple" => Ok(QuestionType::Multiple),
            "text" => Ok(QuestionType::Text),
            other => Err(format!("unknown question type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: i64,
    pub content: String,
    pub question_type: QuestionType,
    pub points: i32,
    pub image_id: Option<i64>,
}

/// One selectable option of a question. Text questions store their
/// canonical answer as a single option row with `is_correct = true`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnswerOption {
    pub id: i64,
    pub question_id: i64,
    pub content: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct Image {
    pub id: i64,
    pub data: Vec<u8>,
    pub mime_type: String,
}
