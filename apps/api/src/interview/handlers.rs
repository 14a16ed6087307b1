use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::interview::resume::extract_resume;
use crate::models::interview::{Interview, InterviewSummary, QuestionView, UserInputs};
use crate::models::report::ReportView;
use crate::state::AppState;

/// Path and body ids that do not parse are treated as unknown ids.
fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound(format!("{what} not found")))
}

/// Accumulates the multipart fields of a create request.
#[derive(Default)]
struct CreateInterviewForm {
    resume: Option<ResumeUpload>,
    job_title: Option<String>,
    years_of_experience: Option<String>,
    key_skills: Option<String>,
    target_role: Option<String>,
    industry_focus: Option<String>,
}

struct ResumeUpload {
    filename: String,
    content_type: Option<String>,
    data: Bytes,
}

impl CreateInterviewForm {
    /// Stores a text field; unknown field names are ignored.
    fn set_text(&mut self, name: &str, value: String) {
        let slot = match name {
            "jobTitle" => &mut self.job_title,
            "yearsOfExperience" => &mut self.years_of_experience,
            "keySkills" => &mut self.key_skills,
            "targetRole" => &mut self.target_role,
            "industryFocus" => &mut self.industry_focus,
            _ => return,
        };
        *slot = Some(value);
    }

    fn into_parts(self) -> Result<(ResumeUpload, UserInputs), AppError> {
        let resume = self
            .resume
            .ok_or_else(|| AppError::Validation("Resume file is required".to_string()))?;
        let inputs = UserInputs {
            job_title: self.job_title.unwrap_or_default(),
            years_of_experience: self.years_of_experience.unwrap_or_default(),
            key_skills: self.key_skills.unwrap_or_default(),
            target_role: self.target_role.unwrap_or_default(),
            industry_focus: self.industry_focus.unwrap_or_default(),
        };
        inputs.validate()?;
        Ok((resume, inputs))
    }
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {e}"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInterviewResponse {
    pub message: &'static str,
    pub interview_id: Uuid,
}

/// POST /api/interviews
pub async fn handle_create_interview(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CreateInterviewResponse>), AppError> {
    let mut form = CreateInterviewForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "resume" {
            let filename = field.file_name().unwrap_or("resume.pdf").to_string();
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.map_err(multipart_error)?;
            form.resume = Some(ResumeUpload {
                filename,
                content_type,
                data,
            });
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            form.set_text(&name, value);
        }
    }

    let (upload, inputs) = form.into_parts()?;
    let resume = extract_resume(upload.filename, upload.content_type.as_deref(), upload.data).await?;
    let interview = state
        .lifecycle
        .create(user.user_id, resume, inputs)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateInterviewResponse {
            message: "Interview created successfully",
            interview_id: interview.id,
        }),
    ))
}

/// GET /api/interviews
pub async fn handle_list_interviews(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<InterviewSummary>>, AppError> {
    Ok(Json(state.lifecycle.list(user.user_id).await?))
}

/// GET /api/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Interview>, AppError> {
    let id = parse_id(&id, "Interview")?;
    Ok(Json(state.lifecycle.get(id, user.user_id).await?))
}

#[derive(Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<QuestionView>,
}

/// GET /api/interviews/:id/questions
pub async fn handle_get_questions(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<QuestionsResponse>, AppError> {
    let id = parse_id(&id, "Interview")?;
    let questions = state.lifecycle.questions(id, user.user_id).await?;
    Ok(Json(QuestionsResponse { questions }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub question_id: Option<String>,
    pub answer_text: Option<String>,
}

#[derive(Serialize)]
pub struct AnswerResponse {
    pub message: &'static str,
    pub analysis: String,
}

/// POST /api/interviews/:id/answers
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let present = |field: Option<String>| field.filter(|value| !value.trim().is_empty());
    let (Some(question_id), Some(answer_text)) =
        (present(req.question_id), present(req.answer_text))
    else {
        return Err(AppError::Validation(
            "Question ID and answer text are required".to_string(),
        ));
    };
    let interview_id = parse_id(&id, "Interview")?;
    let question_id = parse_id(&question_id, "Question")?;

    let analysis = state
        .lifecycle
        .record_answer(interview_id, user.user_id, question_id, &answer_text)
        .await?;

    Ok(Json(AnswerResponse {
        message: "Answer submitted successfully",
        analysis,
    }))
}

/// GET /api/interviews/:id/report
pub async fn handle_get_report(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ReportView>, AppError> {
    let id = parse_id(&id, "Interview")?;
    let report = state.reports.get_or_build(id, user.user_id).await?;
    Ok(Json(report.into()))
}
