//! Server half of camera/microphone capture.
//!
//! The browser owns the devices; it reports the permission decision and streams the
//! recorder's chunks here. A `MediaCapture` buffers them between explicit start and
//! stop actions and finalizes exactly that interval into one blob.

use serde::Serialize;
use thiserror::Error;

use crate::errors::AppError;

pub mod capture;

pub use capture::{CaptureView, MediaBlob, MediaCapture};

/// Largest recording a capture will buffer. Base64-encoded, it still fits the
/// model's inline-data request limit.
pub const MAX_RECORDING_BYTES: usize = 14 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    /// Container type declared for finalized recordings.
    pub fn mime_type(self) -> &'static str {
        match self {
            MediaKind::Video => "video/webm",
            MediaKind::Audio => "audio/webm",
        }
    }

    pub fn device(self) -> &'static str {
        match self {
            MediaKind::Video => "Camera",
            MediaKind::Audio => "Microphone",
        }
    }

    fn denied_message(self) -> String {
        let device = self.device();
        format!(
            "{device} Access Denied. Please enable {} permissions in your browser settings and restart the session.",
            device.to_lowercase()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Pending,
    Granted,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderState {
    Idle,
    Recording,
    Stopped,
    Released,
}

#[derive(Debug, Error, PartialEq)]
pub enum CaptureError {
    #[error("{} permission has not been reported yet", .0.device())]
    PermissionPending(MediaKind),

    #[error("{} access was denied", .0.device())]
    PermissionDenied(MediaKind),

    #[error("permission has already been reported for this question set")]
    AlreadyReported,

    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("no recording is in progress")]
    NotRecording,

    #[error("record an answer before requesting analysis")]
    NothingRecorded,

    #[error("media capture has been released")]
    Released,

    #[error("the recording is longer than the {} MB limit; stop and record a shorter answer", .0 / (1024 * 1024))]
    TooLarge(usize),
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::PermissionDenied(kind) => AppError::Permission(kind.denied_message()),
            CaptureError::TooLarge(_) => AppError::Validation(err.to_string()),
            other => AppError::InvalidState(other.to_string()),
        }
    }
}
