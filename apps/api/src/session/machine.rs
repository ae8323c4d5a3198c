//! Guided session state machine: setup → interviewing → finished.
//!
//! Transitions are synchronous and run under the store lock. Model calls happen
//! between a `begin_*` and the matching `complete_*`, with the lock released; the
//! ticket's epoch identifies which incarnation of the session issued the call, so a
//! completion that arrives after a restart or advance is discarded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::media::{CaptureView, MediaCapture, MediaKind};
use crate::pipeline::check_input;
use crate::pipeline::feedback::{FeedbackInput, FeedbackOutput, GenerateFeedback};
use crate::pipeline::questions::QuestionsInput;
use crate::pipeline::video::{AnalyzeVideo, VideoInput, VideoOutput};
use crate::pipeline::voice::{AnalyzeVoice, VoiceInput, VoiceOutput};
use crate::session::catalog::validate_selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Text,
    Video,
    Voice,
}

impl SessionKind {
    pub fn question_count(self) -> u32 {
        match self {
            SessionKind::Text => 5,
            SessionKind::Video | SessionKind::Voice => 3,
        }
    }

    pub fn media_kind(self) -> Option<MediaKind> {
        match self {
            SessionKind::Text => None,
            SessionKind::Video => Some(MediaKind::Video),
            SessionKind::Voice => Some(MediaKind::Audio),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub industry: String,
    pub role: String,
    #[serde(default = "crate::pipeline::default_language")]
    pub language: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionPhase {
    Setup,
    Interviewing { index: usize, total: usize },
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SessionFeedback {
    Text(FeedbackOutput),
    Video(VideoOutput),
    Voice(VoiceOutput),
}

/// Work to run against the model once the lock is released.
#[derive(Debug, Clone)]
pub enum AnalysisJob {
    Text(FeedbackInput),
    Video(VideoInput),
    Voice(VoiceInput),
}

impl AnalysisJob {
    fn check(&self) -> Result<(), AppError> {
        match self {
            AnalysisJob::Text(input) => check_input::<GenerateFeedback>(input),
            AnalysisJob::Video(input) => check_input::<AnalyzeVideo>(input),
            AnalysisJob::Voice(input) => check_input::<AnalyzeVoice>(input),
        }
    }
}

#[derive(Debug)]
pub struct StartTicket {
    pub epoch: u64,
    pub input: QuestionsInput,
    config: SessionConfig,
}

#[derive(Debug)]
pub struct SubmissionTicket {
    pub epoch: u64,
    pub index: usize,
    pub job: AnalysisJob,
}

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    kind: SessionKind,
    phase: SessionPhase,
    config: Option<SessionConfig>,
    questions: Vec<String>,
    feedback: Option<SessionFeedback>,
    busy: bool,
    epoch: u64,
    capture: Option<MediaCapture>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub kind: SessionKind,
    #[serde(flatten)]
    pub phase: SessionPhase,
    pub config: Option<SessionConfig>,
    pub questions: Vec<String>,
    pub current_question: Option<String>,
    pub feedback: Option<SessionFeedback>,
    pub busy: bool,
    pub capture: Option<CaptureView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(kind: SessionKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            phase: SessionPhase::Setup,
            config: None,
            questions: Vec::new(),
            feedback: None,
            busy: false,
            epoch: 0,
            capture: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn feedback(&self) -> Option<&SessionFeedback> {
        self.feedback.as_ref()
    }

    pub fn current_question(&self) -> Option<&str> {
        match self.phase {
            SessionPhase::Interviewing { index, .. } => self.questions.get(index).map(String::as_str),
            _ => None,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // ── setup → interviewing ────────────────────────────────────────────────

    pub fn begin_start(&mut self, config: SessionConfig) -> Result<StartTicket, AppError> {
        if self.phase != SessionPhase::Setup {
            return Err(AppError::InvalidState(
                "The interview has already started. Restart to choose new settings.".to_string(),
            ));
        }
        self.ensure_idle()?;
        validate_selection(&config.industry, &config.role, &config.language)
            .map_err(AppError::Validation)?;

        self.busy = true;
        Ok(StartTicket {
            epoch: self.epoch,
            input: QuestionsInput {
                category: config.industry.clone(),
                role: config.role.clone(),
                count: self.kind.question_count(),
                language: config.language.clone(),
            },
            config,
        })
    }

    /// Enters `interviewing` with the generated questions, or stays in `setup`.
    pub fn complete_start(
        &mut self,
        ticket: StartTicket,
        result: Result<Vec<String>, AppError>,
    ) -> Result<(), AppError> {
        self.ensure_current(ticket.epoch)?;
        self.busy = false;

        let questions = result?;
        if questions.is_empty() {
            return Err(AppError::Llm(
                "Failed to generate interview questions.".to_string(),
            ));
        }

        self.phase = SessionPhase::Interviewing {
            index: 0,
            total: questions.len(),
        };
        self.questions = questions;
        self.config = Some(ticket.config);
        self.feedback = None;
        self.capture = self.kind.media_kind().map(MediaCapture::new);
        Ok(())
    }

    // ── submissions ─────────────────────────────────────────────────────────

    pub fn begin_text_submission(&mut self, response: String) -> Result<SubmissionTicket, AppError> {
        if self.kind != SessionKind::Text {
            return Err(AppError::InvalidState(
                "This session takes recorded answers.".to_string(),
            ));
        }
        let (index, question, config) = self.current_turn()?;
        let job = AnalysisJob::Text(FeedbackInput {
            question,
            response,
            job_description: Some(format!(
                "The user is applying for a {} role in the {} industry.",
                config.role, config.industry
            )),
            resume: None,
            language: config.language,
        });
        self.issue(index, job)
    }

    /// Hands the finalized recording to analysis. Requires a stop with data.
    pub fn begin_media_submission(&mut self) -> Result<SubmissionTicket, AppError> {
        if self.kind == SessionKind::Text {
            return Err(AppError::InvalidState(
                "This session takes typed answers.".to_string(),
            ));
        }
        let (index, question, config) = self.current_turn()?;
        let data_uri = self.capture()?.blob()?.to_data_uri().to_string();

        let job = match self.kind {
            SessionKind::Video => AnalysisJob::Video(VideoInput {
                video_data_uri: data_uri,
                language: config.language,
            }),
            _ => AnalysisJob::Voice(VoiceInput {
                audio_data_uri: data_uri,
                question,
                role: config.role,
                language: config.language,
            }),
        };
        self.issue(index, job)
    }

    /// Holds the feedback on success. On failure the session stays on the same
    /// question with no feedback held.
    pub fn complete_submission(
        &mut self,
        epoch: u64,
        result: Result<SessionFeedback, AppError>,
    ) -> Result<&SessionFeedback, AppError> {
        self.ensure_current(epoch)?;
        self.busy = false;
        let held = self.feedback.insert(result?);
        Ok(&*held)
    }

    // ── navigation ──────────────────────────────────────────────────────────

    pub fn advance(&mut self) -> Result<SessionPhase, AppError> {
        let (index, total) = self.ensure_interviewing()?;
        self.ensure_idle()?;
        if self.feedback.is_none() {
            return Err(AppError::Validation(
                "Submit an answer and receive feedback before moving on.".to_string(),
            ));
        }

        self.feedback = None;
        self.epoch += 1;
        if index + 1 < total {
            self.phase = SessionPhase::Interviewing {
                index: index + 1,
                total,
            };
            if let Some(capture) = self.capture.as_mut() {
                capture.reset();
            }
        } else {
            self.phase = SessionPhase::Finished;
            self.release_capture();
        }
        Ok(self.phase)
    }

    /// Back to `setup` from any state, dropping everything the session held.
    pub fn restart(&mut self) {
        self.phase = SessionPhase::Setup;
        self.config = None;
        self.questions.clear();
        self.feedback = None;
        self.busy = false;
        self.epoch += 1;
        self.release_capture();
    }

    pub fn teardown(&mut self) {
        self.epoch += 1;
        self.busy = false;
        self.release_capture();
    }

    // ── media ───────────────────────────────────────────────────────────────

    /// The live capture of a media session that is interviewing.
    pub fn capture_mut(&mut self) -> Result<&mut MediaCapture, AppError> {
        self.ensure_interviewing()?;
        self.capture
            .as_mut()
            .ok_or_else(|| AppError::InvalidState("This session does not record media.".to_string()))
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            kind: self.kind,
            phase: self.phase,
            config: self.config.clone(),
            questions: self.questions.clone(),
            current_question: self.current_question().map(str::to_string),
            feedback: self.feedback.clone(),
            busy: self.busy,
            capture: self.capture.as_ref().map(MediaCapture::view),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn capture(&self) -> Result<&MediaCapture, AppError> {
        self.capture
            .as_ref()
            .ok_or_else(|| AppError::InvalidState("This session does not record media.".to_string()))
    }

    fn release_capture(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            capture.release();
        }
    }

    /// Releases the busy flag of a call that was abandoned before it settled.
    /// Does nothing once the session has moved on to another epoch.
    pub fn abandon(&mut self, epoch: u64) {
        if epoch == self.epoch {
            self.busy = false;
        }
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Index, question and settings of the turn a new submission would answer.
    fn current_turn(&self) -> Result<(usize, String, SessionConfig), AppError> {
        let (index, _) = self.ensure_interviewing()?;
        self.ensure_idle()?;
        let question = self
            .questions
            .get(index)
            .cloned()
            .ok_or_else(|| AppError::InvalidState("No current question.".to_string()))?;
        let config = self
            .config
            .clone()
            .ok_or_else(|| AppError::InvalidState("Session is not configured.".to_string()))?;
        Ok((index, question, config))
    }

    /// Held feedback is only dropped once the job is known to reach the model.
    fn issue(&mut self, index: usize, job: AnalysisJob) -> Result<SubmissionTicket, AppError> {
        job.check()?;
        self.feedback = None;
        self.busy = true;
        Ok(SubmissionTicket {
            epoch: self.epoch,
            index,
            job,
        })
    }

    fn ensure_interviewing(&self) -> Result<(usize, usize), AppError> {
        match self.phase {
            SessionPhase::Interviewing { index, total } => Ok((index, total)),
            SessionPhase::Setup => Err(AppError::InvalidState(
                "The interview has not started yet.".to_string(),
            )),
            SessionPhase::Finished => Err(AppError::InvalidState(
                "The interview is finished. Restart to practice again.".to_string(),
            )),
        }
    }

    fn ensure_idle(&self) -> Result<(), AppError> {
        if self.busy {
            return Err(AppError::Busy(
                "An analysis is already in progress for this session.".to_string(),
            ));
        }
        Ok(())
    }

    fn ensure_current(&self, epoch: u64) -> Result<(), AppError> {
        if epoch != self.epoch {
            return Err(AppError::InvalidState(
                "The session changed while the request was running.".to_string(),
            ));
        }
        Ok(())
    }
}
