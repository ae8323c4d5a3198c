//! Validated Prompt Pipeline.
//!
//! Flow for every capability: validate input → render template → call model →
//! validate output. All model calls go through `llm_client::ModelCapability`.
//! Nothing is retried and nothing is returned partially.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{parse_json, CapabilityRequest, LlmError, ModelCapability};
use crate::pipeline::data_uri::DataUri;
use crate::pipeline::schema::{InputSchema, OutputSchema};

pub mod cover_letter;
pub mod data_uri;
pub mod feedback;
pub mod handlers;
pub mod prompts;
pub mod questions;
pub mod resume;
pub mod schema;
pub mod video;
pub mod voice;

/// Default language for every capability that produces user-facing text.
pub const DEFAULT_LANGUAGE: &str = "English";

pub fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input did not conform to the capability's input schema.
    /// No external call was made.
    #[error("{0}")]
    Validation(String),

    /// The model call failed or its reply did not conform to the output schema.
    #[error("external service error: {0}")]
    External(#[from] LlmError),
}

/// One model-backed capability: an input schema, an output schema and a template.
pub trait Capability {
    type Input: Serialize + Sync;
    type Output: DeserializeOwned + Send;

    /// Stable name used in logs.
    const NAME: &'static str;
    /// User-facing message when the capability fails.
    const FAILURE_MESSAGE: &'static str;
    const INPUT: &'static InputSchema;
    const OUTPUT: &'static OutputSchema;

    /// Renders the prompt. `media` is the parsed data URI returned by `media`, if any.
    fn render(input: &Self::Input, media: Option<&DataUri>) -> String;

    /// The data URI to embed in the request, if the capability takes media.
    fn media(_input: &Self::Input) -> Option<&str> {
        None
    }

    /// Checks constraints the output schema cannot express (counts, uniqueness).
    fn check_output(_input: &Self::Input, _output: &Self::Output) -> Result<(), String> {
        Ok(())
    }
}

/// Checks an input against the capability's input schema without calling the model.
pub fn validate<C: Capability>(input: &C::Input) -> Result<(), PipelineError> {
    let value = serde_json::to_value(input)
        .map_err(|e| PipelineError::Validation(format!("input could not be encoded: {e}")))?;
    C::INPUT.validate(&value).map_err(PipelineError::Validation)
}

/// Runs a capability end to end.
pub async fn run<C: Capability>(
    llm: &dyn ModelCapability,
    input: &C::Input,
) -> Result<C::Output, PipelineError> {
    validate::<C>(input)?;

    let media = C::media(input)
        .map(DataUri::parse)
        .transpose()
        .map_err(|e| PipelineError::Validation(format!("invalid media: {e}")))?;

    let request = CapabilityRequest {
        system: JSON_ONLY_SYSTEM.to_string(),
        prompt: C::render(input, media.as_ref()),
        media: media.as_ref().map(DataUri::to_media_part),
        response_schema: C::OUTPUT.response_schema(),
    };

    if let Some(m) = &media {
        info!(
            "Running {} with {} media ({} bytes)",
            C::NAME,
            m.mime_type(),
            m.decoded_len()
        );
    } else {
        info!("Running {}", C::NAME);
    }

    let text = llm.generate(&request).await?;
    debug!("{} raw reply: {} chars", C::NAME, text.len());

    let mut reply: Value = parse_json(&text)?;
    C::OUTPUT.validate(&mut reply).map_err(LlmError::Schema)?;
    let output: C::Output = serde_json::from_value(reply).map_err(LlmError::Parse)?;
    C::check_output(input, &output).map_err(LlmError::Schema)?;

    Ok(output)
}

/// `validate` with the action wrapper's error mapping.
pub fn check_input<C: Capability>(input: &C::Input) -> Result<(), AppError> {
    validate::<C>(input).map_err(|e| AppError::Validation(e.to_string()))
}

/// Action wrapper: runs a capability and translates failures into `AppError`,
/// replacing external failure details with the capability's user-facing message.
pub async fn execute<C: Capability>(
    llm: &dyn ModelCapability,
    input: &C::Input,
) -> Result<C::Output, AppError> {
    run::<C>(llm, input).await.map_err(|e| match e {
        PipelineError::Validation(message) => AppError::Validation(message),
        PipelineError::External(err) => {
            warn!("{} failed: {err}", C::NAME);
            AppError::Llm(C::FAILURE_MESSAGE.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedCapability;
    use crate::pipeline::cover_letter::{AnalyzeCoverLetter, CoverLetterInput};
    use serde_json::json;

    fn letter(len: usize) -> CoverLetterInput {
        CoverLetterInput {
            cover_letter_text: "a".repeat(len),
        }
    }

    fn good_reply() -> Value {
        json!({
            "structure_feedback": "Clear opening.",
            "clarity_feedback": "Concise.",
            "keyword_optimization_feedback": "Mention Rust.",
            "overall_score": 81
        })
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_model() {
        let llm = ScriptedCapability::new().reply(good_reply());
        let result = run::<AnalyzeCoverLetter>(&llm, &letter(99)).await;
        assert!(matches!(result, Err(PipelineError::Validation(_))));
        assert_eq!(llm.calls(), 0);
    }

    #[test]
    fn test_check_input_uses_field_message() {
        match check_input::<AnalyzeCoverLetter>(&letter(42)) {
            Err(AppError::Validation(message)) => assert_eq!(
                message,
                "Please enter at least 100 characters for a meaningful analysis."
            ),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(check_input::<AnalyzeCoverLetter>(&letter(100)).is_ok());
    }

    #[tokio::test]
    async fn test_valid_input_reaches_model_with_schema() {
        let llm = ScriptedCapability::new().reply(good_reply());
        let output = run::<AnalyzeCoverLetter>(&llm, &letter(100)).await.unwrap();
        assert_eq!(output.overall_score, 81);
        assert_eq!(llm.calls(), 1);

        let request = llm.last_request().unwrap();
        assert_eq!(request.system, JSON_ONLY_SYSTEM);
        assert!(request.media.is_none());
        assert_eq!(
            request.response_schema["properties"]["overall_score"]["type"],
            "INTEGER"
        );
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_external_error() {
        let llm = ScriptedCapability::new().reply_text("Sure! Here is my feedback...");
        let result = run::<AnalyzeCoverLetter>(&llm, &letter(150)).await;
        assert!(matches!(
            result,
            Err(PipelineError::External(LlmError::Parse(_)))
        ));
    }

    #[tokio::test]
    async fn test_out_of_range_score_is_external_error() {
        let mut reply = good_reply();
        reply["overall_score"] = json!(101);
        let llm = ScriptedCapability::new().reply(reply);
        let result = run::<AnalyzeCoverLetter>(&llm, &letter(150)).await;
        assert!(matches!(
            result,
            Err(PipelineError::External(LlmError::Schema(_)))
        ));
    }

    #[tokio::test]
    async fn test_fenced_reply_is_accepted() {
        let text = format!("```json\n{}\n```", good_reply());
        let llm = ScriptedCapability::new().reply_text(&text);
        assert!(run::<AnalyzeCoverLetter>(&llm, &letter(150)).await.is_ok());
    }

    #[tokio::test]
    async fn test_execute_maps_failures() {
        let llm = ScriptedCapability::new().fail();
        match execute::<AnalyzeCoverLetter>(&llm, &letter(150)).await {
            Err(AppError::Llm(message)) => assert_eq!(message, "Failed to analyze cover letter."),
            other => panic!("expected Llm error, got {other:?}"),
        }

        let llm = ScriptedCapability::new();
        match execute::<AnalyzeCoverLetter>(&llm, &letter(10)).await {
            Err(AppError::Validation(message)) => {
                assert!(message.contains("at least 100 characters"))
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
