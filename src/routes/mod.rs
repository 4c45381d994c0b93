use axum::extract::Multipart;

use crate::dto::question_dto::{NewAnswerOption, NewImage, NewQuestionPayload};
use crate::error::{Error, Result};
use crate::models::question::QuestionType;

pub mod health;
pub mod images;
pub mod olympiads;
pub mod tests;
pub mod users;

/// Parses the multipart form shared by the add-question endpoints:
/// `content`, `type`, `points`, an `answers` JSON array and an optional
/// `image` file.
pub(crate) async fn parse_question_form(mut multipart: Multipart) -> Result<NewQuestionPayload> {
    let mut content: Option<String> = None;
    let mut question_type: Option<QuestionType> = None;
    let mut points: Option<i32> = None;
    let mut answers: Vec<NewAnswerOption> = Vec::new();
    let mut image: Option<NewImage> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "content" => content = Some(field.text().await?),
            "type" => {
                let raw = field.text().await?;
                question_type = Some(raw.parse().map_err(Error::BadRequest)?);
            }
            "points" => {
                let raw = field.text().await?;
                let parsed: i32 = raw.parse().map_err(|_| {
                    Error::BadRequest("points must be a positive integer".to_string())
                })?;
                points = Some(parsed);
            }
            "answers" => {
                let raw = field.text().await?;
                answers = serde_json::from_str(&raw)?;
            }
            "image" => {
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await?.to_vec();
                if !data.is_empty() {
                    image = Some(NewImage { data, mime_type });
                }
            }
            _ => {}
        }
    }

    let missing = || Error::BadRequest("content, type and points are required".to_string());
    let content = content.filter(|c| !c.is_empty()).ok_or_else(missing)?;
    let question_type = question_type.ok_or_else(missing)?;
    let points = points.ok_or_else(missing)?;
    if points <= 0 {
        return Err(Error::BadRequest(
            "points must be a positive integer".to_string(),
        ));
    }

    Ok(NewQuestionPayload {
        content,
        question_type,
        points,
        answers,
        image,
    })
}
