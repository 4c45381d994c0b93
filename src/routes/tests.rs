use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde_json::json;
use validator::Validate;

use crate::dto::question_dto::{CreateQuestionResponse, QuestionView};
use crate::dto::test_dto::{
    CreateTestRequest, CreateTestResponse, FinishAttemptResponse, StartAttemptResponse,
    TestAnswerRequest, TestDetailResponse,
};
use crate::middleware::auth::Claims;
use crate::services::attempt_service::StartOutcome;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/tests",
    responses((status = 200, description = "List of open tests with their creators"))
)]
#[axum::debug_handler]
pub async fn list_tests(State(state): State<AppState>) -> crate::error::Result<Response> {
    let tests = state.test_service.list_open_tests().await?;
    Ok(Json(tests).into_response())
}

#[axum::debug_handler]
pub async fn create_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateTestRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let test_id = state.test_service.create_test(req, claims.sub).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateTestResponse {
            message: "Test created".to_string(),
            test_id,
        }),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/tests/{id}",
    responses(
        (status = 200, description = "Test with its questions and options"),
        (status = 404, description = "Test not found")
    )
)]
#[axum::debug_handler]
pub async fn get_test(
    State(state): State<AppState>,
    Path(test_id): Path<i64>,
) -> crate::error::Result<Response> {
    let test = state.test_service.get_summary(test_id).await?;
    let questions = state.test_service.questions().for_test(test_id).await?;
    let options = state.test_service.questions().options_for_test(test_id).await?;
    let response = TestDetailResponse {
        test,
        questions: QuestionView::assemble(questions, options),
    };
    Ok(Json(response).into_response())
}

#[axum::debug_handler]
pub async fn add_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
    multipart: Multipart,
) -> crate::error::Result<Response> {
    let payload = super::parse_question_form(multipart).await?;
    let question_id = state
        .test_service
        .add_question(test_id, &claims, payload)
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
pub async fn start_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
) -> crate::error::Result<Response> {
    let outcome = state.attempt_service.start_test(test_id, claims.sub).await?;
    let response = match outcome {
        StartOutcome::Started { result_id, .. } => StartAttemptResponse {
            message: "Test started".to_string(),
            result_id,
            deadline: None,
        },
        StartOutcome::AlreadyStarted { result_id, .. } => StartAttemptResponse {
            message: "You have already started this test".to_string(),
            result_id,
            deadline: None,
        },
    };
    Ok(Json(response).into_response())
}

#[axum::debug_handler]
pub async fn save_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
    Json(req): Json<TestAnswerRequest>,
) -> crate::error::Result<Response> {
    state
        .attempt_service
        .save_test_answer(test_id, claims.sub, req.question_id, &req.answer)
        .await?;
    Ok(Json(json!({"message": "Answer saved"})).into_response())
}

#[axum::debug_handler]
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
) -> crate::error::Result<Response> {
    let progress = state.attempt_service.test_progress(test_id, claims.sub).await?;
    Ok(Json(progress).into_response())
}

#[axum::debug_handler]
pub async fn submit_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(result_id): Path<i64>,
) -> crate::error::Result<Response> {
    let outcome = state.attempt_service.finish_test(result_id, claims.sub).await?;
    Ok(Json(FinishAttemptResponse {
        message: "Test finished".to_string(),
        score: outcome.score,
        total_score: outcome.total_score,
        percentage: (outcome.percentage * 100.0).round() / 100.0,
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
    let result = state.attempt_service.get_test_result(result_id, &claims).await?;
    Ok(Json(result).into_response())
}

#[axum::debug_handler]
pub async fn user_results(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> crate::error::Result<Response> {
    let results = state
        .attempt_service
        .list_user_test_results(user_id, &claims)
        .await?;
    Ok(Json(results).into_response())
}

#[axum::debug_handler]
pub async fn add_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
) -> crate::error::Result<Response> {
    state.test_service.add_favorite(claims.sub, test_id).await?;
    Ok(Json(json!({"message": "Test added to favorites"})).into_response())
}
