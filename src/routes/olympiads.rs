use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde_json::json;
use validator::Validate;

use crate::dto::olympiad_dto::{
    CreateOlympiadRequest, CreateOlympiadResponse, OlympiadAnswerRequest, OlympiadDetailResponse,
    OlympiadResultResponse, ReviewRequest, ReviewResponse,
};
use crate::dto::question_dto::{CreateQuestionResponse, QuestionView};
use crate::dto::test_dto::{FinishAttemptResponse, StartAttemptResponse};
use crate::middleware::auth::Claims;
use crate::services::attempt_service::StartOutcome;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_olympiads(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> crate::error::Result<Response> {
    let olympiads = state.olympiad_service.list_olympiads(claims.role).await?;
    Ok(Json(olympiads).into_response())
}

#[axum::debug_handler]
pub async fn create_olympiad(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateOlympiadRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let olympiad_id = state
        .olympiad_service
        .create_olympiad(req, claims.sub)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateOlympiadResponse {
            message: "Olympiad created".to_string(),
            olympiad_id,
        }),
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn get_olympiad(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(olympiad_id): Path<i64>,
) -> crate::error::Result<Response> {
    let olympiad = state
        .olympiad_service
        .get_summary(olympiad_id, claims.role)
        .await?;
    let questions = state
        .olympiad_service
        .questions()
        .for_olympiad(olympiad_id)
        .await?;
    let options = state
        .olympiad_service
        .questions()
        .options_for_olympiad(olympiad_id)
        .await?;
    let response = OlympiadDetailResponse {
        olympiad,
        questions: QuestionView::assemble(questions, options),
    };
    Ok(Json(response).into_response())
}

#[axum::debug_handler]
pub async fn add_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(olympiad_id): Path<i64>,
    multipart: Multipart,
) -> crate::error::Result<Response> {
    let payload = super::parse_question_form(multipart).await?;
    let question_id = state
        .olympiad_service
        .add_question(olympiad_id, &claims, payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateQuestionResponse {
            message: "Question added".to_string(),
            question_id,
        }),
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn start_olympiad(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(olympiad_id): Path<i64>,
) -> crate::error::Result<Response> {
    let outcome = state
        .attempt_service
        .start_olympiad(olympiad_id, claims.sub)
        .await?;
    let response = match outcome {
        StartOutcome::Started { result_id, deadline } => StartAttemptResponse {
            message: "Olympiad started".to_string(),
            result_id,
            deadline,
        },
        StartOutcome::AlreadyStarted { result_id, deadline } => StartAttemptResponse {
            message: "You have already started this olympiad".to_string(),
            result_id,
            deadline,
        },
    };
    Ok(Json(response).into_response())
}

#[axum::debug_handler]
pub async fn save_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<OlympiadAnswerRequest>,
) -> crate::error::Result<Response> {
    state
        .attempt_service
        .save_olympiad_answer(req.result_id, claims.sub, req.question_id, &req.answer)
        .await?;
    Ok(Json(json!({"message": "Answer saved"})).into_response())
}

#[axum::debug_handler]
pub async fn finish_olympiad(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(result_id): Path<i64>,
) -> crate::error::Result<Response> {
    let outcome = state
        .attempt_service
        .finish_olympiad(result_id, claims.sub)
        .await?;
    Ok(Json(FinishAttemptResponse {
        message: "Olympiad finished".to_string(),
        score: outcome.score,
        total_score: outcome.total_score,
        percentage: (outcome.percentage * 100.0).round() / 100.0,
        grade: outcome.grade,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn review_result(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(result_id): Path<i64>,
    Json(req): Json<ReviewRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let outcome = state
        .attempt_service
        .review_olympiad(result_id, &claims, req.score)
        .await?;
    Ok(Json(ReviewResponse {
        message: "Olympiad reviewed".to_string(),
        score: outcome.score,
        grade: outcome.grade,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn get_result(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(result_id): Path<i64>,
) -> crate::error::Result<Response> {
    let (result, answers) = state
        .attempt_service
        .get_olympiad_result(result_id, &claims)
        .await?;
    Ok(Json(OlympiadResultResponse {
        id: result.id,
        user_id: result.user_id,
        olympiad_id: result.olympiad_id,
        started_at: result.started_at,
        deadline: result.deadline,
        finished_at: result.finished_at,
        score: result.score,
        total_score: result.total_score,
        grade: result.grade,
        is_checked: result.is_checked,
        answers,
    })
    .into_response())
}

#[axum::debug_handler]
pub async fn add_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(olympiad_id): Path<i64>,
) -> crate::error::Result<Response> {
    state
        .olympiad_service
        .add_favorite(claims.sub, olympiad_id)
        .await?;
    Ok(Json(json!({"message": "Olympiad added to favorites"})).into_response())
}
