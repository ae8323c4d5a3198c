use bytes::{Bytes, BytesMut};
use serde::Serialize;
use tracing::debug;

use crate::media::{CaptureError, MediaKind, Permission, RecorderState, MAX_RECORDING_BYTES};
use crate::pipeline::data_uri::DataUri;

/// One finalized recording: every chunk between a start and the following stop.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaBlob {
    pub mime_type: &'static str,
    pub data: Bytes,
}

impl MediaBlob {
    pub fn to_data_uri(&self) -> DataUri {
        DataUri::encode(self.mime_type, &self.data)
    }
}

/// Client-facing snapshot of a capture.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureView {
    pub kind: MediaKind,
    pub mime_type: &'static str,
    pub permission: Permission,
    pub recorder: RecorderState,
    pub buffered_bytes: usize,
    pub recorded_bytes: Option<usize>,
    pub can_analyze: bool,
}

/// Capture for one entry into `interviewing`. Permission is asked once per capture;
/// a new capture (and a new question) comes only from restarting the session.
#[derive(Debug)]
pub struct MediaCapture {
    kind: MediaKind,
    permission: Permission,
    state: RecorderState,
    chunks: Vec<Bytes>,
    blob: Option<MediaBlob>,
}

impl MediaCapture {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            permission: Permission::Pending,
            state: RecorderState::Idle,
            chunks: Vec::new(),
            blob: None,
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Records the browser's decision. Only the first report counts.
    pub fn report_permission(&mut self, granted: bool) -> Result<Permission, CaptureError> {
        self.ensure_live()?;
        if self.permission != Permission::Pending {
            return Err(CaptureError::AlreadyReported);
        }
        self.permission = if granted {
            Permission::Granted
        } else {
            Permission::Denied
        };
        Ok(self.permission)
    }

    /// Starts a recording, discarding anything buffered or finalized before.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        self.ensure_granted()?;
        if self.state == RecorderState::Recording {
            return Err(CaptureError::AlreadyRecording);
        }
        self.chunks.clear();
        self.blob = None;
        self.state = RecorderState::Recording;
        Ok(())
    }

    /// Appends one recorder chunk. Empty chunks are ignored, and a chunk that would
    /// take the buffer past `MAX_RECORDING_BYTES` is refused without being kept.
    /// Returns the number of bytes buffered so far.
    pub fn push_chunk(&mut self, chunk: Bytes) -> Result<usize, CaptureError> {
        self.ensure_granted()?;
        if self.state != RecorderState::Recording {
            return Err(CaptureError::NotRecording);
        }
        if self.buffered_bytes() + chunk.len() > MAX_RECORDING_BYTES {
            return Err(CaptureError::TooLarge(MAX_RECORDING_BYTES));
        }
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
        Ok(self.buffered_bytes())
    }

    /// Finalizes the buffered chunks into one blob. Returns `None` when nothing was
    /// recorded, in which case analysis stays disabled.
    pub fn stop(&mut self) -> Result<Option<&MediaBlob>, CaptureError> {
        self.ensure_granted()?;
        if self.state != RecorderState::Recording {
            return Err(CaptureError::NotRecording);
        }

        let mut data = BytesMut::with_capacity(self.buffered_bytes());
        for chunk in self.chunks.drain(..) {
            data.extend_from_slice(&chunk);
        }
        self.state = RecorderState::Stopped;
        self.blob = (!data.is_empty()).then(|| MediaBlob {
            mime_type: self.kind.mime_type(),
            data: data.freeze(),
        });
        debug!(
            "{} recording stopped: {} bytes",
            self.kind.device(),
            self.blob.as_ref().map_or(0, |b| b.data.len())
        );
        Ok(self.blob.as_ref())
    }

    pub fn can_analyze(&self) -> bool {
        self.permission == Permission::Granted
            && self.state == RecorderState::Stopped
            && self.blob.is_some()
    }

    /// The finalized recording, if analysis is possible.
    pub fn blob(&self) -> Result<&MediaBlob, CaptureError> {
        self.ensure_granted()?;
        match (&self.state, &self.blob) {
            (RecorderState::Stopped, Some(blob)) => Ok(blob),
            _ => Err(CaptureError::NothingRecorded),
        }
    }

    /// Drops any recording so the next question starts clean. Permission is kept.
    pub fn reset(&mut self) {
        if self.state == RecorderState::Released {
            return;
        }
        self.chunks.clear();
        self.blob = None;
        self.state = RecorderState::Idle;
    }

    /// Drops the buffer for good. Every later operation fails.
    pub fn release(&mut self) {
        self.chunks = Vec::new();
        self.blob = None;
        self.state = RecorderState::Released;
    }

    pub fn view(&self) -> CaptureView {
        CaptureView {
            kind: self.kind,
            mime_type: self.kind.mime_type(),
            permission: self.permission,
            recorder: self.state,
            buffered_bytes: self.buffered_bytes(),
            recorded_bytes: self.blob.as_ref().map(|b| b.data.len()),
            can_analyze: self.can_analyze(),
        }
    }

    fn buffered_bytes(&self) -> usize {
        self.chunks.iter().map(Bytes::len).sum()
    }

    fn ensure_live(&self) -> Result<(), CaptureError> {
        if self.state == RecorderState::Released {
            return Err(CaptureError::Released);
        }
        Ok(())
    }

    fn ensure_granted(&self) -> Result<(), CaptureError> {
        self.ensure_live()?;
        match self.permission {
            Permission::Granted => Ok(()),
            Permission::Pending => Err(CaptureError::PermissionPending(self.kind)),
            Permission::Denied => Err(CaptureError::PermissionDenied(self.kind)),
        }
    }
}
