//! Candidate / manager mode context, created at startup and held in `AppState`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

pub mod handlers;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppMode {
    #[default]
    Candidate,
    Manager,
}

impl AppMode {
    pub fn toggled(self) -> Self {
        match self {
            AppMode::Candidate => AppMode::Manager,
            AppMode::Manager => AppMode::Candidate,
        }
    }

    pub fn navigation(self) -> &'static [NavItem] {
        match self {
            AppMode::Candidate => CANDIDATE_NAV,
            AppMode::Manager => MANAGER_NAV,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub href: &'static str,
    pub label: &'static str,
}

const CANDIDATE_NAV: &[NavItem] = &[
    NavItem { href: "/", label: "Dashboard" },
    NavItem { href: "/interview", label: "Mock Interview" },
    NavItem { href: "/resume-analyzer", label: "Resume Analyzer" },
    NavItem { href: "/cover-letter-analyzer", label: "Cover Letter Analyzer" },
    NavItem { href: "/video-analysis", label: "Video Analysis" },
    NavItem { href: "/voice-analysis", label: "Voice Analysis" },
];

const MANAGER_NAV: &[NavItem] = &[
    NavItem { href: "/", label: "Dashboard" },
    NavItem { href: "/manager/create-interview", label: "Create Interview" },
    NavItem { href: "/manager/candidates", label: "Candidates" },
];

/// Process-wide mode. Not persisted; every restart begins in candidate mode.
#[derive(Clone, Default)]
pub struct ModeContext {
    mode: Arc<RwLock<AppMode>>,
}

impl ModeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> AppMode {
        *self.mode.read().await
    }

    pub async fn set(&self, mode: AppMode) -> AppMode {
        *self.mode.write().await = mode;
        mode
    }

    pub async fn toggle(&self) -> AppMode {
        let mut mode = self.mode.write().await;
        *mode = mode.toggled();
        *mode
    }
}
