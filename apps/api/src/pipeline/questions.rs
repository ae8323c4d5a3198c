//! generate-interview-questions: an ordered list of questions for a category and role.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::llm_client::prompts::LANGUAGE_INSTRUCTION;
use crate::pipeline::data_uri::DataUri;
use crate::pipeline::prompts::{render, QUESTIONS_PROMPT_TEMPLATE};
use crate::pipeline::schema::{FieldSpec, InputSchema, OutputField, OutputKind, OutputSchema};
use crate::pipeline::{default_language, Capability};

pub const DEFAULT_QUESTION_COUNT: u32 = 5;
pub const MAX_QUESTION_COUNT: u32 = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionsInput {
    #[serde(alias = "industry")]
    pub category: String,
    pub role: String,
    #[serde(default = "default_count", alias = "num_questions")]
    pub count: u32,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_count() -> u32 {
    DEFAULT_QUESTION_COUNT
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionsOutput {
    pub questions: Vec<String>,
}

const QUESTIONS_INPUT: InputSchema = InputSchema {
    fields: &[
        FieldSpec::text("category").with_message("Please select an industry."),
        FieldSpec::text("role").with_message("Please select a role."),
        FieldSpec::integer("count", 1, MAX_QUESTION_COUNT as i64),
        FieldSpec::text("language").with_message("Please select a language."),
    ],
};

const QUESTIONS_OUTPUT: OutputSchema = OutputSchema {
    fields: &[OutputField {
        name: "questions",
        kind: OutputKind::TextList { min_items: 1 },
        description: "Interview questions relevant to the industry and role, in order.",
    }],
};

pub struct GenerateQuestions;

impl Capability for GenerateQuestions {
    type Input = QuestionsInput;
    type Output = QuestionsOutput;

    const NAME: &'static str = "generate-interview-questions";
    const FAILURE_MESSAGE: &'static str = "Failed to generate interview questions.";
    const INPUT: &'static InputSchema = &QUESTIONS_INPUT;
    const OUTPUT: &'static OutputSchema = &QUESTIONS_OUTPUT;

    fn render(input: &QuestionsInput, _media: Option<&DataUri>) -> String {
        let count = input.count.to_string();
        let prompt = render(
            QUESTIONS_PROMPT_TEMPLATE,
            &[
                ("count", Some(count.as_str())),
                ("category", Some(input.category.as_str())),
                ("role", Some(input.role.as_str())),
                ("language", Some(input.language.as_str())),
            ],
        );
        format!("{prompt}\n\n{LANGUAGE_INSTRUCTION}")
    }

    fn check_output(input: &QuestionsInput, output: &QuestionsOutput) -> Result<(), String> {
        if output.questions.len() != input.count as usize {
            return Err(format!(
                "expected {} questions, got {}",
                input.count,
                output.questions.len()
            ));
        }
        let mut seen = HashSet::new();
        for question in &output.questions {
            if !seen.insert(question.trim().to_lowercase()) {
                return Err(format!("duplicate question: {question:?}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedCapability;
    use crate::pipeline::{run, PipelineError};
    use serde_json::json;

    fn technology_input() -> QuestionsInput {
        serde_json::from_value(json!({
            "category": "Technology",
            "role": "Software Engineer"
        }))
        .unwrap()
    }

    fn five_questions() -> serde_json::Value {
        json!({"questions": [
            "Tell me about a system you designed.",
            "How do you approach code review?",
            "Describe a production incident you handled.",
            "How do you decide between two libraries?",
            "What does good testing look like to you?"
        ]})
    }

    #[test]
    fn test_defaults_applied() {
        let input = technology_input();
        assert_eq!(input.count, 5);
        assert_eq!(input.language, "English");
    }

    #[test]
    fn test_industry_alias_accepted() {
        let input: QuestionsInput = serde_json::from_value(json!({
            "industry": "Finance",
            "role": "Auditor",
            "num_questions": 3
        }))
        .unwrap();
        assert_eq!(input.category, "Finance");
        assert_eq!(input.count, 3);
    }

    #[test]
    fn test_render_substitutes_fields() {
        let prompt = GenerateQuestions::render(&technology_input(), None);
        assert!(prompt.contains("Generate 5 interview questions"));
        assert!(prompt.contains("Industry: Technology"));
        assert!(prompt.contains("Role: Software Engineer"));
        assert!(prompt.contains("Language: English"));
    }

    #[tokio::test]
    async fn test_five_distinct_questions() {
        let llm = ScriptedCapability::new().reply(five_questions());
        let output = run::<GenerateQuestions>(&llm, &technology_input())
            .await
            .unwrap();
        assert_eq!(output.questions.len(), 5);
        let distinct: HashSet<_> = output.questions.iter().collect();
        assert_eq!(distinct.len(), 5);
        assert!(output.questions.iter().all(|q| !q.trim().is_empty()));
    }

    #[tokio::test]
    async fn test_wrong_count_rejected() {
        let llm = ScriptedCapability::new().reply(json!({"questions": ["Only one?"]}));
        let result = run::<GenerateQuestions>(&llm, &technology_input()).await;
        assert!(matches!(result, Err(PipelineError::External(_))));
    }

    #[tokio::test]
    async fn test_duplicates_rejected() {
        let mut reply = five_questions();
        reply["questions"][4] = json!("tell me about a system you designed. ");
        let llm = ScriptedCapability::new().reply(reply);
        let result = run::<GenerateQuestions>(&llm, &technology_input()).await;
        assert!(matches!(result, Err(PipelineError::External(_))));
    }

    #[tokio::test]
    async fn test_blank_role_rejected_before_call() {
        let mut input = technology_input();
        input.role = String::new();
        let llm = ScriptedCapability::new().reply(five_questions());
        match run::<GenerateQuestions>(&llm, &input).await {
            Err(PipelineError::Validation(message)) => assert_eq!(message, "Please select a role."),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(llm.calls(), 0);
    }
}
