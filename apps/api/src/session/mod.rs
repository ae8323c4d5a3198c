//! Guided interview sessions: text, video and voice practice.
//!
//! Each async operation here is: transition under the store lock → model call with
//! the lock released → completing transition under the lock.

use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::ModelCapability;
use crate::pipeline::execute;
use crate::pipeline::feedback::GenerateFeedback;
use crate::pipeline::questions::GenerateQuestions;
use crate::pipeline::video::AnalyzeVideo;
use crate::pipeline::voice::AnalyzeVoice;

pub mod catalog;
pub mod handlers;
pub mod machine;
pub mod store;

use machine::{AnalysisJob, SessionConfig, SessionFeedback, SessionView, SubmissionTicket};
use store::SessionStore;

/// setup → interviewing, generating the session's questions.
pub async fn start(
    store: &SessionStore,
    llm: &dyn ModelCapability,
    id: Uuid,
    config: SessionConfig,
) -> Result<SessionView, AppError> {
    let ticket = store.update(id, |s| s.begin_start(config)).await?;
    let guard = InFlight::new(store, id, ticket.epoch);
    info!(
        "Session {id}: generating {} questions for {} / {}",
        ticket.input.count, ticket.input.category, ticket.input.role
    );

    let result = execute::<GenerateQuestions>(llm, &ticket.input)
        .await
        .map(|output| output.questions);

    let view = store
        .update(id, |s| {
            s.complete_start(ticket, result)?;
            Ok(s.view())
        })
        .await;
    guard.settle();
    view
}

/// Scores a typed answer to the current question.
pub async fn submit_text(
    store: &SessionStore,
    llm: &dyn ModelCapability,
    id: Uuid,
    response: String,
) -> Result<SessionView, AppError> {
    let ticket = store
        .update(id, |s| s.begin_text_submission(response))
        .await?;
    finish_submission(store, llm, id, ticket).await
}

/// Analyzes the finalized recording for the current question.
pub async fn analyze_recording(
    store: &SessionStore,
    llm: &dyn ModelCapability,
    id: Uuid,
) -> Result<SessionView, AppError> {
    let ticket = store.update(id, |s| s.begin_media_submission()).await?;
    finish_submission(store, llm, id, ticket).await
}

async fn finish_submission(
    store: &SessionStore,
    llm: &dyn ModelCapability,
    id: Uuid,
    ticket: SubmissionTicket,
) -> Result<SessionView, AppError> {
    let guard = InFlight::new(store, id, ticket.epoch);
    info!("Session {id}: analyzing answer {}", ticket.index + 1);
    let result = run_job(llm, &ticket.job).await;

    let view = store
        .update(id, |s| {
            s.complete_submission(ticket.epoch, result)?;
            Ok(s.view())
        })
        .await;
    guard.settle();
    view
}

/// Held between a `begin_*` and its `complete_*`. If the request future is dropped
/// first (client disconnect), the session's busy flag is released on drop.
struct InFlight {
    store: SessionStore,
    id: Uuid,
    epoch: u64,
    armed: bool,
}

impl InFlight {
    fn new(store: &SessionStore, id: Uuid, epoch: u64) -> Self {
        Self {
            store: store.clone(),
            id,
            epoch,
            armed: true,
        }
    }

    fn settle(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("Session {}: request dropped before the model call settled", self.id);
        let (store, id, epoch) = (self.store.clone(), self.id, self.epoch);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move { store.abandon(id, epoch).await });
        }
    }
}

async fn run_job(llm: &dyn ModelCapability, job: &AnalysisJob) -> Result<SessionFeedback, AppError> {
    match job {
        AnalysisJob::Text(input) => execute::<GenerateFeedback>(llm, input)
            .await
            .map(SessionFeedback::Text),
        AnalysisJob::Video(input) => execute::<AnalyzeVideo>(llm, input)
            .await
            .map(SessionFeedback::Video),
        AnalysisJob::Voice(input) => execute::<AnalyzeVoice>(llm, input)
            .await
            .map(SessionFeedback::Voice),
    }
}
