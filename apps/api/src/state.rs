use std::sync::Arc;

use crate::llm_client::ModelCapability;
use crate::manager::interviews::InterviewStore;
use crate::mode::ModeContext;
use crate::session::store::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Model boundary. `LlmClient` in production, a scripted stub in tests.
    pub llm: Arc<dyn ModelCapability>,
    pub sessions: SessionStore,
    pub mode: ModeContext,
    pub interviews: InterviewStore,
}

impl AppState {
    pub fn new(llm: Arc<dyn ModelCapability>) -> Self {
        Self {
            llm,
            sessions: SessionStore::new(),
            mode: ModeContext::new(),
            interviews: InterviewStore::new(),
        }
    }
}
