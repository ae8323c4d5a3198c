//! analyze-cover-letter: structure, clarity and keyword feedback plus an overall score.

use serde::{Deserialize, Serialize};

use crate::llm_client::prompts::SCORE_INSTRUCTION;
use crate::pipeline::data_uri::DataUri;
use crate::pipeline::prompts::{render, COVER_LETTER_PROMPT_TEMPLATE};
use crate::pipeline::schema::{FieldSpec, InputSchema, OutputField, OutputKind, OutputSchema};
use crate::pipeline::Capability;

pub const MIN_COVER_LETTER_CHARS: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverLetterInput {
    pub cover_letter_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverLetterOutput {
    pub structure_feedback: String,
    pub clarity_feedback: String,
    pub keyword_optimization_feedback: String,
    pub overall_score: u8,
}

const COVER_LETTER_INPUT: InputSchema = InputSchema {
    fields: &[FieldSpec::text("cover_letter_text")
        .min_chars(MIN_COVER_LETTER_CHARS)
        .with_message("Please enter at least 100 characters for a meaningful analysis.")],
};

const COVER_LETTER_OUTPUT: OutputSchema = OutputSchema {
    fields: &[
        OutputField {
            name: "structure_feedback",
            kind: OutputKind::Text,
            description: "Feedback on the structure of the cover letter.",
        },
        OutputField {
            name: "clarity_feedback",
            kind: OutputKind::Text,
            description: "Feedback on the clarity of the cover letter.",
        },
        OutputField {
            name: "keyword_optimization_feedback",
            kind: OutputKind::Text,
            description: "Feedback on the keyword optimization of the cover letter.",
        },
        OutputField {
            name: "overall_score",
            kind: OutputKind::Score,
            description: "Overall quality of the cover letter, 0 to 100.",
        },
    ],
};

pub struct AnalyzeCoverLetter;

impl Capability for AnalyzeCoverLetter {
    type Input = CoverLetterInput;
    type Output = CoverLetterOutput;

    const NAME: &'static str = "analyze-cover-letter";
    const FAILURE_MESSAGE: &'static str = "Failed to analyze cover letter.";
    const INPUT: &'static InputSchema = &COVER_LETTER_INPUT;
    const OUTPUT: &'static OutputSchema = &COVER_LETTER_OUTPUT;

    fn render(input: &CoverLetterInput, _media: Option<&DataUri>) -> String {
        render(
            COVER_LETTER_PROMPT_TEMPLATE,
            &[
                ("cover_letter_text", Some(input.cover_letter_text.as_str())),
                ("score_instruction", Some(SCORE_INSTRUCTION)),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedCapability;
    use crate::pipeline::{run, PipelineError};
    use serde_json::json;

    fn reply() -> serde_json::Value {
        json!({
            "structure_feedback": "Opens with a hook, closes with a call to action.",
            "clarity_feedback": "Second paragraph runs long.",
            "keyword_optimization_feedback": "Add 'distributed systems'.",
            "overall_score": 74
        })
    }

    #[tokio::test]
    async fn test_99_chars_rejected_with_minimum_length_message() {
        let llm = ScriptedCapability::new().reply(reply());
        let input = CoverLetterInput {
            cover_letter_text: "x".repeat(99),
        };
        match run::<AnalyzeCoverLetter>(&llm, &input).await {
            Err(PipelineError::Validation(message)) => {
                assert_eq!(
                    message,
                    "Please enter at least 100 characters for a meaningful analysis."
                )
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_100_chars_reaches_model() {
        let llm = ScriptedCapability::new().reply(reply());
        let input = CoverLetterInput {
            cover_letter_text: "x".repeat(100),
        };
        let output = run::<AnalyzeCoverLetter>(&llm, &input).await.unwrap();
        assert_eq!(llm.calls(), 1);
        assert!(output.overall_score <= 100);
        assert!(llm
            .last_request()
            .unwrap()
            .prompt
            .contains(&"x".repeat(100)));
    }
}
