use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Clamps a model-supplied score into the 0–100 range. Non-finite input becomes 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionFeedback {
    pub question: String,
    pub answer: String,
    pub feedback: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovedAnswer {
    pub question: String,
    pub original_answer: String,
    pub improved_answer: String,
}

/// The scored report for one interview. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub user_id: Uuid,
    pub overall_score: f64,
    pub accuracy: f64,
    pub areas_of_improvement: Vec<String>,
    pub grammatical_improvements: Vec<String>,
    pub technical_improvements: Vec<String>,
    pub question_feedback: Vec<QuestionFeedback>,
    pub improved_answers: Vec<ImprovedAnswer>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReportRow {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub user_id: Uuid,
    pub overall_score: f64,
    pub accuracy: f64,
    pub areas_of_improvement: Vec<String>,
    pub grammatical_improvements: Vec<String>,
    pub technical_improvements: Vec<String>,
    pub question_feedback: Json<Vec<QuestionFeedback>>,
    pub improved_answers: Json<Vec<ImprovedAnswer>>,
    pub generated_at: DateTime<Utc>,
}

impl From<ReportRow> for Report {
    fn from(row: ReportRow) -> Self {
        Self {
            id: row.id,
            interview_id: row.interview_id,
            user_id: row.user_id,
            overall_score: row.overall_score,
            accuracy: row.accuracy,
            areas_of_improvement: row.areas_of_improvement,
            grammatical_improvements: row.grammatical_improvements,
            technical_improvements: row.technical_improvements,
            question_feedback: row.question_feedback.0,
            improved_answers: row.improved_answers.0,
            generated_at: row.generated_at,
        }
    }
}

/// The report as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub overall_score: f64,
    pub accuracy: f64,
    pub areas_of_improvement: Vec<String>,
    pub grammatical_improvements: Vec<String>,
    pub technical_improvements: Vec<String>,
    pub question_answers: Vec<QuestionFeedback>,
    pub improved_answers: Vec<ImprovedAnswer>,
}

impl From<Report> for ReportView {
    fn from(report: Report) -> Self {
        Self {
            overall_score: report.overall_score,
            accuracy: report.accuracy,
            areas_of_improvement: report.areas_of_improvement,
            grammatical_improvements: report.grammatical_improvements,
            technical_improvements: report.technical_improvements,
            question_answers: report.question_feedback,
            improved_answers: report.improved_answers,
        }
    }
}
