//! generate-feedback: scores a typed answer to an interview question.

use serde::{Deserialize, Serialize};

use crate::llm_client::prompts::{LANGUAGE_INSTRUCTION, SCORE_INSTRUCTION};
use crate::pipeline::data_uri::DataUri;
use crate::pipeline::prompts::{render, FEEDBACK_PROMPT_TEMPLATE};
use crate::pipeline::schema::{FieldSpec, InputSchema, OutputField, OutputKind, OutputSchema};
use crate::pipeline::{default_language, Capability};

/// Shortest answer accepted for feedback.
pub const MIN_RESPONSE_CHARS: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackInput {
    pub question: String,
    pub response: String,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub resume: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackOutput {
    pub feedback: String,
    pub score: u8,
    pub areas_for_improvement: String,
}

const FEEDBACK_INPUT: InputSchema = InputSchema {
    fields: &[
        FieldSpec::text("question"),
        FieldSpec::text("response")
            .min_chars(MIN_RESPONSE_CHARS)
            .with_message("Please provide a more detailed response."),
        FieldSpec::optional_text("job_description"),
        FieldSpec::optional_text("resume"),
        FieldSpec::text("language"),
    ],
};

const FEEDBACK_OUTPUT: OutputSchema = OutputSchema {
    fields: &[
        OutputField {
            name: "feedback",
            kind: OutputKind::Text,
            description: "Structured feedback on the response.",
        },
        OutputField {
            name: "score",
            kind: OutputKind::Score,
            description: "Score of the response between 0 and 100.",
        },
        OutputField {
            name: "areas_for_improvement",
            kind: OutputKind::Text,
            description: "Specific areas for improvement.",
        },
    ],
};

pub struct GenerateFeedback;

impl Capability for GenerateFeedback {
    type Input = FeedbackInput;
    type Output = FeedbackOutput;

    const NAME: &'static str = "generate-feedback";
    const FAILURE_MESSAGE: &'static str = "Failed to generate feedback.";
    const INPUT: &'static InputSchema = &FEEDBACK_INPUT;
    const OUTPUT: &'static OutputSchema = &FEEDBACK_OUTPUT;

    fn render(input: &FeedbackInput, _media: Option<&DataUri>) -> String {
        render(
            FEEDBACK_PROMPT_TEMPLATE,
            &[
                ("language", Some(input.language.as_str())),
                ("question", Some(input.question.as_str())),
                ("response", Some(input.response.as_str())),
                ("job_description", non_blank(&input.job_description)),
                ("resume", non_blank(&input.resume)),
                ("score_instruction", Some(SCORE_INSTRUCTION)),
                ("language_instruction", Some(LANGUAGE_INSTRUCTION)),
            ],
        )
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedCapability;
    use crate::pipeline::{run, PipelineError};
    use serde_json::json;

    fn input() -> FeedbackInput {
        FeedbackInput {
            question: "Tell me about a conflict on your team.".to_string(),
            response: "We disagreed on the release plan, so I set up a short design review."
                .to_string(),
            job_description: Some(
                "The user is applying for a Software Engineer role in the Technology industry."
                    .to_string(),
            ),
            resume: None,
            language: "French".to_string(),
        }
    }

    #[test]
    fn test_render_omits_absent_resume() {
        let prompt = GenerateFeedback::render(&input(), None);
        assert!(prompt.contains("Language: French"));
        assert!(prompt.contains("Job Description: The user is applying for a Software Engineer"));
        assert!(!prompt.contains("Resume:"));
    }

    #[test]
    fn test_render_omits_blank_job_description() {
        let mut input = input();
        input.job_description = Some("   ".to_string());
        let prompt = GenerateFeedback::render(&input, None);
        assert!(!prompt.contains("Job Description:"));
    }

    #[tokio::test]
    async fn test_short_response_rejected() {
        let mut input = input();
        input.response = "Too short.".to_string();
        let llm = ScriptedCapability::new();
        match run::<GenerateFeedback>(&llm, &input).await {
            Err(PipelineError::Validation(message)) => {
                assert_eq!(message, "Please provide a more detailed response.")
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_feedback_parsed() {
        let llm = ScriptedCapability::new().reply(json!({
            "feedback": "Good use of a concrete example.",
            "score": 78,
            "areas_for_improvement": "Quantify the outcome."
        }));
        let output = run::<GenerateFeedback>(&llm, &input()).await.unwrap();
        assert_eq!(output.score, 78);
        assert!(output.score <= 100);
    }

    #[tokio::test]
    async fn test_missing_score_is_external_error() {
        let llm = ScriptedCapability::new().reply(json!({
            "feedback": "Fine.",
            "areas_for_improvement": "More detail."
        }));
        assert!(matches!(
            run::<GenerateFeedback>(&llm, &input()).await,
            Err(PipelineError::External(_))
        ));
    }
}
