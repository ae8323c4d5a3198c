//! analyze-resume: section-by-section rewrite suggestions for an uploaded resume.

use serde::{Deserialize, Serialize};

use crate::pipeline::data_uri::DataUri;
use crate::pipeline::prompts::{render, RESUME_PROMPT_TEMPLATE};
use crate::pipeline::schema::{FieldSpec, InputSchema, OutputField, OutputKind, OutputSchema};
use crate::pipeline::Capability;

/// Document types accepted for resume analysis.
pub const RESUME_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeInput {
    pub resume_data_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionImprovement {
    pub section: String,
    pub original_text: String,
    pub improved_text: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeOutput {
    pub overall_feedback: String,
    pub suggested_improvements: Vec<SectionImprovement>,
}

const RESUME_INPUT: InputSchema = InputSchema {
    fields: &[FieldSpec::data_uri("resume_data_uri", RESUME_MIME_TYPES)
        .with_message("Please upload a resume file (PDF, DOC or DOCX).")],
};

const IMPROVEMENT_FIELDS: &[OutputField] = &[
    OutputField {
        name: "section",
        kind: OutputKind::Text,
        description: "The resume section being improved (e.g. 'Experience', 'Summary').",
    },
    OutputField {
        name: "original_text",
        kind: OutputKind::Text,
        description: "A brief quote of the original text that needs improvement.",
    },
    OutputField {
        name: "improved_text",
        kind: OutputKind::Text,
        description: "The rewritten, improved version of the text.",
    },
    OutputField {
        name: "explanation",
        kind: OutputKind::Text,
        description: "Why the improved text is better.",
    },
];

const RESUME_OUTPUT: OutputSchema = OutputSchema {
    fields: &[
        OutputField {
            name: "overall_feedback",
            kind: OutputKind::Text,
            description: "High-level summary of strengths and areas for improvement.",
        },
        OutputField {
            name: "suggested_improvements",
            kind: OutputKind::ObjectList {
                fields: IMPROVEMENT_FIELDS,
                min_items: 1,
            },
            description: "Specific, actionable improvements for different sections.",
        },
    ],
};

pub struct AnalyzeResume;

impl Capability for AnalyzeResume {
    type Input = ResumeInput;
    type Output = ResumeOutput;

    const NAME: &'static str = "analyze-resume";
    const FAILURE_MESSAGE: &'static str = "Failed to analyze resume.";
    const INPUT: &'static InputSchema = &RESUME_INPUT;
    const OUTPUT: &'static OutputSchema = &RESUME_OUTPUT;

    fn render(_input: &ResumeInput, media: Option<&DataUri>) -> String {
        let reference = media.map(DataUri::reference);
        render(
            RESUME_PROMPT_TEMPLATE,
            &[("resume", reference.as_deref())],
        )
    }

    fn media(input: &ResumeInput) -> Option<&str> {
        Some(input.resume_data_uri.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedCapability;
    use crate::pipeline::{run, PipelineError};
    use serde_json::json;

    fn pdf_input() -> ResumeInput {
        ResumeInput {
            resume_data_uri: DataUri::encode("application/pdf", b"%PDF-1.7 resume").to_string(),
        }
    }

    #[tokio::test]
    async fn test_document_sent_as_media() {
        let llm = ScriptedCapability::new().reply(json!({
            "overall_feedback": "Strong experience section, weak summary.",
            "suggested_improvements": [{
                "section": "Professional Summary",
                "original_text": "Hard-working engineer.",
                "improved_text": "Backend engineer who cut API latency 40% across 3 services.",
                "explanation": "Quantifies achievements with metrics."
            }]
        }));
        let output = run::<AnalyzeResume>(&llm, &pdf_input()).await.unwrap();
        assert_eq!(output.suggested_improvements.len(), 1);

        let request = llm.last_request().unwrap();
        let media = request.media.unwrap();
        assert_eq!(media.mime_type, "application/pdf");
        assert!(request.prompt.contains("[attached application/pdf media"));
        assert!(!request.prompt.contains(&media.data));
    }

    #[tokio::test]
    async fn test_image_upload_rejected() {
        let input = ResumeInput {
            resume_data_uri: DataUri::encode("image/png", &[137, 80, 78, 71]).to_string(),
        };
        let llm = ScriptedCapability::new();
        assert!(matches!(
            run::<AnalyzeResume>(&llm, &input).await,
            Err(PipelineError::Validation(_))
        ));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_incomplete_improvement_is_external_error() {
        let llm = ScriptedCapability::new().reply(json!({
            "overall_feedback": "Fine.",
            "suggested_improvements": [{"section": "Skills", "original_text": "Rust"}]
        }));
        assert!(matches!(
            run::<AnalyzeResume>(&llm, &pdf_input()).await,
            Err(PipelineError::External(_))
        ));
    }
}
