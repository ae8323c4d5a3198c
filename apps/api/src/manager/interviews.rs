use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;

/// Form submitted by a hiring manager. Question rows may be blank.
#[derive(Debug, Clone, Deserialize)]
pub struct InterviewDraft {
    pub title: String,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterviewTemplate {
    pub id: Uuid,
    pub title: String,
    pub job_description: Option<String>,
    pub questions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl InterviewDraft {
    /// Trims everything, drops blank question rows, and requires a title plus at
    /// least one question.
    pub fn into_template(self) -> Result<InterviewTemplate, AppError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation(
                "Please give the interview a title.".to_string(),
            ));
        }

        let questions: Vec<String> = self
            .questions
            .iter()
            .map(|q| q.trim())
            .filter(|q| !q.is_empty())
            .map(str::to_string)
            .collect();
        if questions.is_empty() {
            return Err(AppError::Validation(
                "Please add at least one question.".to_string(),
            ));
        }

        let job_description = self
            .job_description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(InterviewTemplate {
            id: Uuid::new_v4(),
            title,
            job_description,
            questions,
            created_at: Utc::now(),
        })
    }
}

/// Interviews created in manager mode, newest last.
#[derive(Clone, Default)]
pub struct InterviewStore {
    interviews: Arc<RwLock<Vec<InterviewTemplate>>>,
}

impl InterviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, template: InterviewTemplate) -> InterviewTemplate {
        self.interviews.write().await.push(template.clone());
        template
    }

    pub async fn list(&self) -> Vec<InterviewTemplate> {
        self.interviews.read().await.clone()
    }
}
