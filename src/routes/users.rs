use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde_json::json;
use validator::Validate;

use crate::dto::user_dto::{
    LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest, UserProfile,
};
use crate::middleware::auth::Claims;
use crate::AppState;

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    state.user_service.register(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully. Await administrator approval."
        })),
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let (token, user) = state.user_service.login(req).await?;
    let response = LoginResponse {
        message: "Authentication successful".to_string(),
        token,
        user: UserProfile::from(user),
    };
    Ok(Json(response).into_response())
}

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> crate::error::Result<Response> {
    let user = state.user_service.get_user(claims.sub).await?;
    Ok(Json(UserProfile::from(user)).into_response())
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> crate::error::Result<Response> {
    state.user_service.update_profile(claims.sub, req).await?;
    Ok(Json(json!({"message": "Profile updated successfully"})).into_response())
}

#[axum::debug_handler]
pub async fn list_users(State(state): State<AppState>) -> crate::error::Result<Response> {
    let users = state.user_service.list_users().await?;
    let profiles: Vec<UserProfile> = users.into_iter().map(UserProfile::from).collect();
    Ok(Json(profiles).into_response())
}

#[axum::debug_handler]
pub async fn approve_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> crate::error::Result<Response> {
    state
        .user_service
        .approve(user_id, &state.mail_service)
        .await?;
    Ok(Json(json!({
        "message": "User approved. Credentials have been sent by mail."
    }))
    .into_response())
}
