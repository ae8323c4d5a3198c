//! analyze-video: non-verbal delivery feedback and a confidence score.

use serde::{Deserialize, Serialize};

use crate::llm_client::prompts::{LANGUAGE_INSTRUCTION, SCORE_INSTRUCTION};
use crate::pipeline::data_uri::DataUri;
use crate::pipeline::prompts::{render, VIDEO_PROMPT_TEMPLATE};
use crate::pipeline::schema::{FieldSpec, InputSchema, OutputField, OutputKind, OutputSchema};
use crate::pipeline::{default_language, Capability};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInput {
    pub video_data_uri: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoOutput {
    pub non_verbal_feedback: String,
    pub confidence_score: u8,
}

const VIDEO_INPUT: InputSchema = InputSchema {
    fields: &[
        FieldSpec::data_uri("video_data_uri", &["video/"]),
        FieldSpec::text("language"),
    ],
};

const VIDEO_OUTPUT: OutputSchema = OutputSchema {
    fields: &[
        OutputField {
            name: "non_verbal_feedback",
            kind: OutputKind::Text,
            description: "Feedback on facial expressions, posture and eye contact.",
        },
        OutputField {
            name: "confidence_score",
            kind: OutputKind::Score,
            description: "Confidence score between 0 and 100.",
        },
    ],
};

pub struct AnalyzeVideo;

impl Capability for AnalyzeVideo {
    type Input = VideoInput;
    type Output = VideoOutput;

    const NAME: &'static str = "analyze-video";
    const FAILURE_MESSAGE: &'static str = "Failed to analyze video.";
    const INPUT: &'static InputSchema = &VIDEO_INPUT;
    const OUTPUT: &'static OutputSchema = &VIDEO_OUTPUT;

    fn render(input: &VideoInput, media: Option<&DataUri>) -> String {
        let reference = media.map(DataUri::reference);
        render(
            VIDEO_PROMPT_TEMPLATE,
            &[
                ("language", Some(input.language.as_str())),
                ("video", reference.as_deref()),
                ("score_instruction", Some(SCORE_INSTRUCTION)),
                ("language_instruction", Some(LANGUAGE_INSTRUCTION)),
            ],
        )
    }

    fn media(input: &VideoInput) -> Option<&str> {
        Some(input.video_data_uri.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedCapability;
    use crate::pipeline::{run, PipelineError};
    use serde_json::json;

    fn webm() -> VideoInput {
        VideoInput {
            video_data_uri: DataUri::encode("video/webm", &[0x1a, 0x45, 0xdf, 0xa3]).to_string(),
            language: "Arabic".to_string(),
        }
    }

    #[tokio::test]
    async fn test_video_attached_and_scored() {
        let llm = ScriptedCapability::new().reply(json!({
            "non_verbal_feedback": "Steady eye contact, slouched posture.",
            "confidence_score": 66.6
        }));
        let output = run::<AnalyzeVideo>(&llm, &webm()).await.unwrap();
        assert_eq!(output.confidence_score, 67);

        let request = llm.last_request().unwrap();
        assert_eq!(request.media.unwrap().mime_type, "video/webm");
        assert!(request.prompt.contains("Language: Arabic"));
        assert!(request.prompt.contains("[attached video/webm media, 4 bytes]"));
    }

    #[tokio::test]
    async fn test_audio_rejected() {
        let input = VideoInput {
            video_data_uri: DataUri::encode("audio/webm", &[1, 2, 3]).to_string(),
            language: "English".to_string(),
        };
        let llm = ScriptedCapability::new();
        assert!(matches!(
            run::<AnalyzeVideo>(&llm, &input).await,
            Err(PipelineError::Validation(_))
        ));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_negative_score_is_external_error() {
        let llm = ScriptedCapability::new().reply(json!({
            "non_verbal_feedback": "Hard to see.",
            "confidence_score": -5
        }));
        assert!(matches!(
            run::<AnalyzeVideo>(&llm, &webm()).await,
            Err(PipelineError::External(_))
        ));
    }
}
