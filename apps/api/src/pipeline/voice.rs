//! analyze-voice: speech delivery and pronunciation feedback with a clarity score.

use serde::{Deserialize, Serialize};

use crate::llm_client::prompts::{LANGUAGE_INSTRUCTION, SCORE_INSTRUCTION};
use crate::pipeline::data_uri::DataUri;
use crate::pipeline::prompts::{render, VOICE_PROMPT_TEMPLATE};
use crate::pipeline::schema::{FieldSpec, InputSchema, OutputField, OutputKind, OutputSchema};
use crate::pipeline::{default_language, Capability};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceInput {
    pub audio_data_uri: String,
    pub question: String,
    pub role: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceOutput {
    pub speech_feedback: String,
    pub clarity_score: u8,
}

const VOICE_INPUT: InputSchema = InputSchema {
    fields: &[
        FieldSpec::data_uri("audio_data_uri", &["audio/"]),
        FieldSpec::text("question"),
        FieldSpec::text("role"),
        FieldSpec::text("language"),
    ],
};

const VOICE_OUTPUT: OutputSchema = OutputSchema {
    fields: &[
        OutputField {
            name: "speech_feedback",
            kind: OutputKind::Text,
            description: "Feedback on content, delivery, pronunciation and accent.",
        },
        OutputField {
            name: "clarity_score",
            kind: OutputKind::Score,
            description: "Holistic clarity score between 0 and 100.",
        },
    ],
};

pub struct AnalyzeVoice;

impl Capability for AnalyzeVoice {
    type Input = VoiceInput;
    type Output = VoiceOutput;

    const NAME: &'static str = "analyze-voice";
    const FAILURE_MESSAGE: &'static str = "Failed to analyze voice.";
    const INPUT: &'static InputSchema = &VOICE_INPUT;
    const OUTPUT: &'static OutputSchema = &VOICE_OUTPUT;

    fn render(input: &VoiceInput, media: Option<&DataUri>) -> String {
        let reference = media.map(DataUri::reference);
        render(
            VOICE_PROMPT_TEMPLATE,
            &[
                ("role", Some(input.role.as_str())),
                ("question", Some(input.question.as_str())),
                ("language", Some(input.language.as_str())),
                ("audio", reference.as_deref()),
                ("score_instruction", Some(SCORE_INSTRUCTION)),
                ("language_instruction", Some(LANGUAGE_INSTRUCTION)),
            ],
        )
    }

    fn media(input: &VoiceInput) -> Option<&str> {
        Some(input.audio_data_uri.as_str())
    }
}
