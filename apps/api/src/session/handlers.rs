use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::media::Permission;
use crate::session::catalog::{catalog_view, CatalogView};
use crate::session::machine::{SessionConfig, SessionKind, SessionPhase, SessionView};
use crate::session::{analyze_recording, start, submit_text};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub kind: SessionKind,
}

#[derive(Deserialize)]
pub struct SubmitResponseRequest {
    pub response: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionDecision {
    Granted,
    Denied,
}

#[derive(Deserialize)]
pub struct PermissionReport {
    pub decision: PermissionDecision,
}

#[derive(Serialize)]
pub struct ChunkAck {
    pub buffered_bytes: usize,
}

/// GET /api/v1/catalog
pub async fn handle_get_catalog() -> Json<CatalogView> {
    Json(catalog_view())
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> (StatusCode, Json<SessionView>) {
    let view = state.sessions.create(req.kind).await;
    info!(
        "Created {:?} session {} ({} active)",
        req.kind,
        view.id,
        state.sessions.len().await
    );
    (StatusCode::CREATED, Json(view))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.sessions.view(id).await?))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    info!("Session {id} torn down");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/start
pub async fn handle_start_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(config): Json<SessionConfig>,
) -> Result<Json<SessionView>, AppError> {
    let view = start(&state.sessions, state.llm.as_ref(), id, config).await?;
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/responses
pub async fn handle_submit_response(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitResponseRequest>,
) -> Result<Json<SessionView>, AppError> {
    let view = submit_text(&state.sessions, state.llm.as_ref(), id, req.response).await?;
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/media/permission
pub async fn handle_report_permission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PermissionReport>,
) -> Result<Json<SessionView>, AppError> {
    let granted = matches!(req.decision, PermissionDecision::Granted);
    let view = state
        .sessions
        .update(id, |s| {
            let permission = s.capture_mut()?.report_permission(granted)?;
            if permission == Permission::Denied {
                info!("Session {id}: media permission denied");
            }
            Ok(s.view())
        })
        .await?;
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/recording/start
pub async fn handle_start_recording(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .sessions
        .update(id, |s| {
            s.capture_mut()?.start()?;
            Ok(s.view())
        })
        .await?;
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/recording/chunks
/// Body is one raw recorder chunk.
pub async fn handle_push_chunk(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<ChunkAck>, AppError> {
    let buffered_bytes = state
        .sessions
        .update(id, |s| Ok(s.capture_mut()?.push_chunk(body)?))
        .await?;
    Ok(Json(ChunkAck { buffered_bytes }))
}

/// POST /api/v1/sessions/:id/recording/stop
pub async fn handle_stop_recording(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .sessions
        .update(id, |s| {
            s.capture_mut()?.stop()?;
            Ok(s.view())
        })
        .await?;
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/recording/analyze
pub async fn handle_analyze_recording(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let view = analyze_recording(&state.sessions, state.llm.as_ref(), id).await?;
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/advance
pub async fn handle_advance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .sessions
        .update(id, |s| {
            let phase = s.advance()?;
            if phase == SessionPhase::Finished {
                info!("Session {id} finished");
            }
            Ok(s.view())
        })
        .await?;
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/restart
pub async fn handle_restart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .sessions
        .update(id, |s| {
            s.restart();
            Ok(s.view())
        })
        .await?;
    Ok(Json(view))
}
