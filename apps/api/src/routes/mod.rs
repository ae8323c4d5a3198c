pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::manager::handlers as manager;
use crate::mode::handlers as mode;
use crate::pipeline::handlers as pipeline;
use crate::session::handlers as session;
use crate::state::AppState;

/// Body limit for routes that carry a whole recording or document. Room for the
/// base64 form of a `MAX_RECORDING_BYTES` capture plus the JSON around it.
pub const MEDIA_BODY_LIMIT: usize = 20 * 1024 * 1024;

async fn not_implemented() -> Result<(), AppError> {
    Err(AppError::NotImplemented)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Catalog and mode context
        .route("/api/v1/catalog", get(session::handle_get_catalog))
        .route(
            "/api/v1/mode",
            get(mode::handle_get_mode).put(mode::handle_set_mode),
        )
        .route("/api/v1/mode/toggle", post(mode::handle_toggle_mode))
        .route("/api/v1/navigation", get(mode::handle_get_navigation))
        // Stand-alone analysis tools
        .route(
            "/api/v1/questions",
            post(pipeline::handle_generate_questions),
        )
        .route("/api/v1/feedback", post(pipeline::handle_generate_feedback))
        .route(
            "/api/v1/resume/analyze",
            post(pipeline::handle_analyze_resume).layer(DefaultBodyLimit::max(MEDIA_BODY_LIMIT)),
        )
        .route(
            "/api/v1/resume/upload",
            post(pipeline::handle_upload_resume).layer(DefaultBodyLimit::max(MEDIA_BODY_LIMIT)),
        )
        .route(
            "/api/v1/cover-letter/analyze",
            post(pipeline::handle_analyze_cover_letter),
        )
        .route(
            "/api/v1/video/analyze",
            post(pipeline::handle_analyze_video).layer(DefaultBodyLimit::max(MEDIA_BODY_LIMIT)),
        )
        .route(
            "/api/v1/voice/analyze",
            post(pipeline::handle_analyze_voice).layer(DefaultBodyLimit::max(MEDIA_BODY_LIMIT)),
        )
        // Guided sessions
        .route("/api/v1/sessions", post(session::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(session::handle_get_session).delete(session::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/start",
            post(session::handle_start_session),
        )
        .route(
            "/api/v1/sessions/:id/responses",
            post(session::handle_submit_response),
        )
        .route(
            "/api/v1/sessions/:id/media/permission",
            post(session::handle_report_permission),
        )
        .route(
            "/api/v1/sessions/:id/recording/start",
            post(session::handle_start_recording),
        )
        .route(
            "/api/v1/sessions/:id/recording/chunks",
            post(session::handle_push_chunk),
        )
        .route(
            "/api/v1/sessions/:id/recording/stop",
            post(session::handle_stop_recording),
        )
        .route(
            "/api/v1/sessions/:id/recording/analyze",
            post(session::handle_analyze_recording),
        )
        .route(
            "/api/v1/sessions/:id/advance",
            post(session::handle_advance),
        )
        .route(
            "/api/v1/sessions/:id/restart",
            post(session::handle_restart),
        )
        // Manager tools
        .route(
            "/api/v1/manager/interviews",
            post(manager::handle_create_interview).get(manager::handle_list_interviews),
        )
        .route("/api/v1/manager/candidates", get(not_implemented))
        .with_state(state)
}
