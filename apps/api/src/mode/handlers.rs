use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::mode::{AppMode, NavItem};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ModeResponse {
    pub mode: AppMode,
}

#[derive(Deserialize)]
pub struct SetModeRequest {
    pub mode: AppMode,
}

#[derive(Serialize)]
pub struct NavigationResponse {
    pub mode: AppMode,
    pub items: &'static [NavItem],
}

/// GET /api/v1/mode
pub async fn handle_get_mode(State(state): State<AppState>) -> Json<ModeResponse> {
    Json(ModeResponse {
        mode: state.mode.get().await,
    })
}

/// PUT /api/v1/mode
pub async fn handle_set_mode(
    State(state): State<AppState>,
    Json(req): Json<SetModeRequest>,
) -> Json<ModeResponse> {
    let mode = state.mode.set(req.mode).await;
    info!("Mode set to {mode:?}");
    Json(ModeResponse { mode })
}

/// POST /api/v1/mode/toggle
pub async fn handle_toggle_mode(State(state): State<AppState>) -> Json<ModeResponse> {
    let mode = state.mode.toggle().await;
    info!("Mode toggled to {mode:?}");
    Json(ModeResponse { mode })
}

/// GET /api/v1/navigation
pub async fn handle_get_navigation(State(state): State<AppState>) -> Json<NavigationResponse> {
    let mode = state.mode.get().await;
    Json(NavigationResponse {
        mode,
        items: mode.navigation(),
    })
}
