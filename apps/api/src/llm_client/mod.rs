/// LLM Client: the single point of entry for all model calls in the coach API.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// Capabilities talk to the model through the `ModelCapability` trait; `LlmClient`
/// is the production implementation.
///
/// Model: gemini-2.0-flash (hardcoded, do not make configurable to prevent drift)
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

/// Base URL of the Gemini models endpoint. Overridable through `GEMINI_API_URL`.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// The model used for all LLM calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "gemini-2.0-flash";
const MAX_OUTPUT_TOKENS: u32 = 4096;
const TEMPERATURE: f32 = 0.4;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Response violates output schema: {0}")]
    Schema(String),
}

/// Binary media attached to a prompt, already base64-encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaPart {
    pub mime_type: String,
    pub data: String,
}

/// Everything the model boundary needs for one call: the rendered prompt,
/// an optional embedded media part, and the declared output schema.
#[derive(Debug, Clone)]
pub struct CapabilityRequest {
    pub system: String,
    pub prompt: String,
    pub media: Option<MediaPart>,
    pub response_schema: serde_json::Value,
}

/// The black-box model boundary. Given a request it returns the raw text the
/// model produced, or an error. Carried in `AppState` as `Arc<dyn ModelCapability>`.
#[async_trait]
pub trait ModelCapability: Send + Sync {
    async fn generate(&self, request: &CapabilityRequest) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: &'a str,
    response_schema: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first candidate's first text part.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.iter().find_map(|p| p.text.as_deref()))
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// The single LLM client used by all capabilities.
/// Wraps the Gemini `generateContent` API with structured output.
/// Calls are never retried: every failure goes back to the user, who resubmits.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, MODEL)
    }

    /// Makes a single call to the Gemini API, returning the full response object.
    pub async fn call(&self, request: &CapabilityRequest) -> Result<LlmResponse, LlmError> {
        let body = build_request_body(request);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let llm_response: LlmResponse = response.json().await?;

        if let Some(usage) = &llm_response.usage_metadata {
            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        Ok(llm_response)
    }
}

#[async_trait]
impl ModelCapability for LlmClient {
    async fn generate(&self, request: &CapabilityRequest) -> Result<String, LlmError> {
        let response = self.call(request).await?;
        if let Some(reason) = response
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
        {
            debug!("LLM finish reason: {reason}");
        }
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

fn build_request_body(request: &CapabilityRequest) -> GeminiRequest<'_> {
    let mut parts = vec![GeminiPart::Text {
        text: &request.prompt,
    }];
    if let Some(media) = &request.media {
        parts.push(GeminiPart::InlineData {
            inline_data: InlineData {
                mime_type: &media.mime_type,
                data: &media.data,
            },
        });
    }

    GeminiRequest {
        system_instruction: GeminiContent {
            role: None,
            parts: vec![GeminiPart::Text {
                text: &request.system,
            }],
        },
        contents: vec![GeminiContent {
            role: Some("user"),
            parts,
        }],
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
            max_output_tokens: MAX_OUTPUT_TOKENS,
            response_mime_type: "application/json",
            response_schema: &request.response_schema,
        },
    }
}

/// Deserializes model text as JSON, tolerating markdown code fences.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let text = strip_json_fences(text);
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    serde_json::from_str(text).map_err(LlmError::Parse)
}

/// Removes a markdown code fence around the reply, whatever its info string
/// (`json`, `JSON` or none). Replies are always objects, so the body starts at `{`.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };
    let body = body.trim_start_matches(|c: char| c.is_ascii_alphanumeric()).trim();
    body.strip_suffix("```").map(str::trim_end).unwrap_or(body)
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_json_fenced_feedback_reply() {
        let text = "```JSON\n{\"feedback\": \"Clear.\", \"score\": 81, \"areas_for_improvement\": \"Pace.\"}\n```";
        let value: serde_json::Value = parse_json(text).unwrap();
        assert_eq!(value["score"], 81);
    }

    #[test]
    fn test_parse_json_bare_fence_on_one_line() {
        let value: serde_json::Value =
            parse_json("```{\"questions\": [\"Why us?\"]}```").unwrap();
        assert_eq!(value["questions"][0], "Why us?");
    }

    #[test]
    fn test_parse_json_unfenced_reply() {
        let value: serde_json::Value =
            parse_json("  {\"confidence_score\": 64, \"non_verbal_feedback\": \"Steady.\"}\n").unwrap();
        assert_eq!(value["confidence_score"], 64);
    }

    #[test]
    fn test_parse_json_prose_is_parse_error() {
        let result: Result<serde_json::Value, _> = parse_json("Here is your feedback: great job!");
        assert!(matches!(result, Err(LlmError::Parse(_))));
    }

    #[test]
    fn test_parse_json_empty_is_empty_content() {
        let result: Result<serde_json::Value, _> = parse_json("   ");
        assert!(matches!(result, Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_request_body_includes_media_and_schema() {
        let request = CapabilityRequest {
            system: "system".to_string(),
            prompt: "analyze this".to_string(),
            media: Some(MediaPart {
                mime_type: "audio/webm".to_string(),
                data: "AAEC".to_string(),
            }),
            response_schema: json!({"type": "OBJECT"}),
        };
        let body = serde_json::to_value(build_request_body(&request)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "system");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "analyze this");
        assert_eq!(
            body["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "audio/webm"
        );
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["data"], "AAEC");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_request_body_without_media_has_single_part() {
        let request = CapabilityRequest {
            system: "system".to_string(),
            prompt: "questions please".to_string(),
            media: None,
            response_schema: json!({}),
        };
        let body = serde_json::to_value(build_request_body(&request)).unwrap();
        assert_eq!(body["contents"][0]["parts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_response_text_extraction() {
        let response: LlmResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"text": "{\"questions\": []}"}], "role": "model"},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4}
        }))
        .unwrap();
        assert_eq!(response.text(), Some("{\"questions\": []}"));
        assert_eq!(response.usage_metadata.unwrap().prompt_token_count, 12);
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let response: LlmResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert!(response.text().is_none());
    }
}
