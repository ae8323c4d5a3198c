use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::session::machine::{Session, SessionKind, SessionView};

/// In-memory session registry. Each session is isolated; nothing outlives the process.
/// The lock is only held for synchronous transitions, never across a model call.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, kind: SessionKind) -> SessionView {
        let session = Session::new(kind);
        let view = session.view();
        self.sessions.lock().await.insert(session.id(), session);
        view
    }

    pub async fn view(&self, id: Uuid) -> Result<SessionView, AppError> {
        let sessions = self.sessions.lock().await;
        sessions.get(&id).map(Session::view).ok_or_else(|| not_found(id))
    }

    /// Applies one transition under the lock.
    pub async fn update<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Session) -> Result<R, AppError>,
    ) -> Result<R, AppError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        let result = f(session);
        session.touch();
        result
    }

    /// Tears a session down, releasing its media capture.
    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        let mut session = self
            .sessions
            .lock()
            .await
            .remove(&id)
            .ok_or_else(|| not_found(id))?;
        session.teardown();
        Ok(())
    }

    /// Clears the busy flag left by a request that never completed.
    pub async fn abandon(&self, id: Uuid, epoch: u64) {
        if let Some(session) = self.sessions.lock().await.get_mut(&id) {
            session.abandon(epoch);
        }
    }

    /// Discards sessions untouched for longer than `max_idle`, tearing each one down.
    /// Sessions with a call in flight are left for the next sweep.
    pub async fn sweep_idle(&self, now: DateTime<Utc>, max_idle: Duration) -> usize {
        let cutoff = now - max_idle;
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| {
            if session.is_busy() || session.updated_at() >= cutoff {
                return true;
            }
            session.teardown();
            false
        });
        let swept = before - sessions.len();
        if swept > 0 {
            info!("Discarded {swept} idle sessions ({} active)", sessions.len());
        }
        swept
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::machine::SessionPhase;

    #[tokio::test]
    async fn test_create_view_remove() {
        let store = SessionStore::new();
        let view = store.create(SessionKind::Video).await;
        assert_eq!(view.phase, SessionPhase::Setup);
        assert_eq!(store.view(view.id).await.unwrap().kind, SessionKind::Video);

        store.remove(view.id).await.unwrap();
        assert_eq!(store.len().await, 0);
        assert!(matches!(
            store.view(view.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        let a = store.create(SessionKind::Text).await;
        let b = store.create(SessionKind::Text).await;
        store
            .update(a.id, |s| {
                s.restart();
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(store.len().await, 2);
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_update_unknown_session() {
        let store = SessionStore::new();
        let result = store.update(Uuid::new_v4(), |_| Ok(())).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_sweep_discards_only_idle_sessions() {
        let store = SessionStore::new();
        let idle = store.create(SessionKind::Text).await;
        let busy = store.create(SessionKind::Text).await;
        store
            .update(busy.id, |s| {
                s.begin_start(crate::session::machine::SessionConfig {
                    industry: "Finance".to_string(),
                    role: "Financial Analyst".to_string(),
                    language: "English".to_string(),
                })
                .map(|_| ())
            })
            .await
            .unwrap();

        let max_idle = Duration::minutes(30);
        assert_eq!(store.sweep_idle(Utc::now(), max_idle).await, 0);
        assert_eq!(store.len().await, 2);

        let later = Utc::now() + Duration::hours(1);
        assert_eq!(store.sweep_idle(later, max_idle).await, 1);
        assert!(matches!(store.view(idle.id).await, Err(AppError::NotFound(_))));
        assert!(store.view(busy.id).await.unwrap().busy);
    }
}
