//! Data URIs: `data:<mime>;base64,<payload>`, the self-describing encoding used to
//! hand uploaded documents and recorded media to a capability.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use thiserror::Error;

use crate::llm_client::MediaPart;

#[derive(Debug, Error, PartialEq)]
pub enum DataUriError {
    #[error("must start with 'data:'")]
    MissingScheme,

    #[error("must declare a MIME type")]
    MissingMimeType,

    #[error("must use base64 encoding")]
    NotBase64,

    #[error("payload is empty")]
    EmptyPayload,

    #[error("payload is not valid base64")]
    InvalidPayload,
}

/// A parsed, validated base64 data URI.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUri {
    mime_type: String,
    payload: String,
}

impl DataUri {
    /// Encodes raw bytes under the given MIME type.
    pub fn encode(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            payload: BASE64_STANDARD.encode(bytes),
        }
    }

    /// Parses and validates a data URI. The payload must be non-empty base64.
    pub fn parse(uri: &str) -> Result<Self, DataUriError> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or(DataUriError::MissingScheme)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUriError::NotBase64)?;

        let mut params = header.split(';');
        let mime_type = params.next().unwrap_or_default().trim();
        if mime_type.is_empty() || !mime_type.contains('/') {
            return Err(DataUriError::MissingMimeType);
        }
        // Parameters such as `codecs=vp8` may precede the base64 marker.
        if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(DataUriError::NotBase64);
        }

        let payload = payload.trim();
        if payload.is_empty() {
            return Err(DataUriError::EmptyPayload);
        }
        BASE64_STANDARD
            .decode(payload)
            .map_err(|_| DataUriError::InvalidPayload)?;

        Ok(Self {
            mime_type: mime_type.to_ascii_lowercase(),
            payload: payload.to_string(),
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Approximate decoded size in bytes, used for log lines and prompt references.
    pub fn decoded_len(&self) -> usize {
        let padding = self.payload.chars().rev().take_while(|c| *c == '=').count();
        (self.payload.len() / 4) * 3 - padding.min(2)
    }

    /// Short human-readable reference substituted into prompt templates.
    pub fn reference(&self) -> String {
        format!("[attached {} media, {} bytes]", self.mime_type, self.decoded_len())
    }

    pub fn to_media_part(&self) -> MediaPart {
        MediaPart {
            mime_type: self.mime_type.clone(),
            data: self.payload.clone(),
        }
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.payload)
    }
}
