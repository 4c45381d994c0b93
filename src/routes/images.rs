use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::AppState;

#[axum::debug_handler]
pub async fn get_image(
    State(state): State<AppState>,
    Path(image_id): Path<i64>,
) -> crate::error::Result<Response> {
    let image = state.question_service.get_image(image_id).await?;
    Ok(([(header::CONTENT_TYPE, image.mime_type)], image.data).into_response())
}
