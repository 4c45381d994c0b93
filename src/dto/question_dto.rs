use crate::models::question::{AnswerOption, Question, QuestionType};
use serde::{Deserialize, Serialize};

/// Option supplied when a teacher creates a question. `is_correct` marks
/// the key; for text questions the single correct option carries the
/// canonical answer text.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAnswerOption {
    pub content: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone)]
pub struct NewImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Parsed from the multipart form of the add-question endpoints.
#[derive(Debug, Clone)]
pub struct NewQuestionPayload {
    pub content: String,
    pub question_type: QuestionType,
    pub points: i32,
    pub answers: Vec<NewAnswerOption>,
    pub image: Option<NewImage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateQuestionResponse {
    pub message: String,
    pub question_id: i64,
}

/// Either a set of chosen option ids or free text, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: i64,
    pub content: String,
    pub question_type: QuestionType,
    pub points: i32,
    pub image_id: Option<i64>,
    pub answers: Vec<AnswerOption>,
}

impl QuestionView {
    pub fn assemble(questions: Vec<Question>, mut options: Vec<AnswerOption>) -> Vec<Self> {
        questions
            .into_iter()
            .map(|q| {
                let answers = options
                    .iter()
                    .filter(|o| o.question_id == q.id)
                    .cloned()
                    .collect();
                options.retain(|o| o.question_id != q.id);
                QuestionView {
                    id: q.id,
                    content: q.content,
                    question_type: q.question_type,
                    points: q.points,
                    image_id: q.image_id,
                    answers,
                }
            })
            .collect()
    }
}
