use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use crate::errors::AppError;
use crate::manager::interviews::{InterviewDraft, InterviewTemplate};
use crate::state::AppState;

/// POST /api/v1/manager/interviews
pub async fn handle_create_interview(
    State(state): State<AppState>,
    Json(draft): Json<InterviewDraft>,
) -> Result<(StatusCode, Json<InterviewTemplate>), AppError> {
    let template = state.interviews.insert(draft.into_template()?).await;
    info!(
        "Interview created: {} ({} questions)",
        template.title,
        template.questions.len()
    );
    Ok((StatusCode::CREATED, Json(template)))
}

/// GET /api/v1/manager/interviews
pub async fn handle_list_interviews(
    State(state): State<AppState>,
) -> Json<Vec<InterviewTemplate>> {
    Json(state.interviews.list().await)
}
