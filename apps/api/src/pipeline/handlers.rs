use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::info;

use crate::errors::AppError;
use crate::pipeline::cover_letter::{AnalyzeCoverLetter, CoverLetterInput, CoverLetterOutput};
use crate::pipeline::data_uri::DataUri;
use crate::pipeline::execute;
use crate::pipeline::feedback::{FeedbackInput, FeedbackOutput, GenerateFeedback};
use crate::pipeline::questions::{GenerateQuestions, QuestionsInput, QuestionsOutput};
use crate::pipeline::resume::{AnalyzeResume, ResumeInput, ResumeOutput};
use crate::pipeline::video::{AnalyzeVideo, VideoInput, VideoOutput};
use crate::pipeline::voice::{AnalyzeVoice, VoiceInput, VoiceOutput};
use crate::state::AppState;

/// Upload types and the extensions that imply them when the browser sends no usable
/// content type.
const UPLOAD_TYPES: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
];

/// POST /api/v1/questions
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    Json(req): Json<QuestionsInput>,
) -> Result<Json<QuestionsOutput>, AppError> {
    let output = execute::<GenerateQuestions>(state.llm.as_ref(), &req).await?;
    Ok(Json(output))
}

/// POST /api/v1/feedback
pub async fn handle_generate_feedback(
    State(state): State<AppState>,
    Json(req): Json<FeedbackInput>,
) -> Result<Json<FeedbackOutput>, AppError> {
    let output = execute::<GenerateFeedback>(state.llm.as_ref(), &req).await?;
    Ok(Json(output))
}

/// POST /api/v1/resume/analyze
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    Json(req): Json<ResumeInput>,
) -> Result<Json<ResumeOutput>, AppError> {
    let output = execute::<AnalyzeResume>(state.llm.as_ref(), &req).await?;
    Ok(Json(output))
}

/// POST /api/v1/resume/upload
/// Multipart form with a single `file` field (PDF, DOC or DOCX).
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ResumeOutput>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid upload: {e}")))?;

        let mime_type = upload_mime_type(content_type.as_deref(), file_name.as_deref())
            .ok_or_else(|| {
                AppError::Validation("Please upload a PDF, DOC or DOCX file.".to_string())
            })?;
        if bytes.is_empty() {
            return Err(AppError::Validation("The uploaded file is empty.".to_string()));
        }

        info!(
            "Resume upload: {} ({mime_type}, {} bytes)",
            file_name.as_deref().unwrap_or("unnamed"),
            bytes.len()
        );
        let req = ResumeInput {
            resume_data_uri: DataUri::encode(mime_type, &bytes).to_string(),
        };
        let output = execute::<AnalyzeResume>(state.llm.as_ref(), &req).await?;
        return Ok(Json(output));
    }

    Err(AppError::Validation("Please upload a resume file.".to_string()))
}

/// POST /api/v1/cover-letter/analyze
pub async fn handle_analyze_cover_letter(
    State(state): State<AppState>,
    Json(req): Json<CoverLetterInput>,
) -> Result<Json<CoverLetterOutput>, AppError> {
    let output = execute::<AnalyzeCoverLetter>(state.llm.as_ref(), &req).await?;
    Ok(Json(output))
}

/// POST /api/v1/video/analyze
pub async fn handle_analyze_video(
    State(state): State<AppState>,
    Json(req): Json<VideoInput>,
) -> Result<Json<VideoOutput>, AppError> {
    let output = execute::<AnalyzeVideo>(state.llm.as_ref(), &req).await?;
    Ok(Json(output))
}

/// POST /api/v1/voice/analyze
pub async fn handle_analyze_voice(
    State(state): State<AppState>,
    Json(req): Json<VoiceInput>,
) -> Result<Json<VoiceOutput>, AppError> {
    let output = execute::<AnalyzeVoice>(state.llm.as_ref(), &req).await?;
    Ok(Json(output))
}

/// Resolves the document type from the declared content type, then the file extension.
fn upload_mime_type(content_type: Option<&str>, file_name: Option<&str>) -> Option<&'static str> {
    if let Some(declared) = content_type {
        let declared = declared.trim().to_ascii_lowercase();
        if let Some((_, mime)) = UPLOAD_TYPES.iter().find(|(_, mime)| *mime == declared) {
            return Some(*mime);
        }
    }
    let extension = file_name?.rsplit_once('.')?.1.to_ascii_lowercase();
    UPLOAD_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_type_from_content_type() {
        assert_eq!(
            upload_mime_type(Some("application/pdf"), Some("cv")),
            Some("application/pdf")
        );
    }

    #[test]
    fn test_upload_type_from_extension() {
        assert_eq!(
            upload_mime_type(Some("application/octet-stream"), Some("Jane_CV.DOCX")),
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        );
        assert_eq!(upload_mime_type(None, Some("cv.doc")), Some("application/msword"));
    }

    #[test]
    fn test_upload_type_rejects_images() {
        assert_eq!(upload_mime_type(Some("image/png"), Some("cv.png")), None);
        assert_eq!(upload_mime_type(None, Some("no_extension")), None);
    }
}
