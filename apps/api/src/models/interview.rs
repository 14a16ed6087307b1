//! Interview domain model and its lifecycle state machine.
//!
//! The status of an interview is a pure function of its question set. It is
//! recomputed after every mutation and has no setter, so it cannot drift from
//! the answers it summarises.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterviewStatus {
    Pending,
    InProgress,
    Completed,
}

impl InterviewStatus {
    /// Derives the status from answer counts.
    pub fn derive(answered: usize, total: usize) -> Self {
        if answered == total {
            InterviewStatus::Completed
        } else if answered == 0 {
            InterviewStatus::Pending
        } else {
            InterviewStatus::InProgress
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::Pending => "pending",
            InterviewStatus::InProgress => "in-progress",
            InterviewStatus::Completed => "completed",
        }
    }
}

/// The five free-text fields a candidate supplies alongside the résumé.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInputs {
    pub job_title: String,
    pub years_of_experience: String,
    pub key_skills: String,
    pub target_role: String,
    pub industry_focus: String,
}

impl UserInputs {
    /// Every field is required and must contain something other than whitespace.
    pub fn validate(&self) -> Result<(), AppError> {
        let fields = [
            ("jobTitle", &self.job_title),
            ("yearsOfExperience", &self.years_of_experience),
            ("keySkills", &self.key_skills),
            ("targetRole", &self.target_role),
            ("industryFocus", &self.industry_focus),
        ];
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "All fields are required (missing: {})",
                missing.join(", ")
            )))
        }
    }
}

/// Résumé captured once at interview creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeSnapshot {
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    pub answer: Option<String>,
    pub answered_at: Option<DateTime<Utc>>,
}

impl Question {
    pub fn unanswered(text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            answer: None,
            answered_at: None,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }
}

/// A question paired with its stored answer, in interview order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume: ResumeSnapshot,
    pub user_inputs: UserInputs,
    questions: Vec<Question>,
    status: InterviewStatus,
    pub started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    pub report_id: Option<Uuid>,
}

impl Interview {
    /// Starts a fresh interview with every question unanswered.
    pub fn start(
        user_id: Uuid,
        resume: ResumeSnapshot,
        user_inputs: UserInputs,
        question_texts: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let questions = question_texts.into_iter().map(Question::unanswered).collect();
        Self::restore(
            Uuid::new_v4(),
            user_id,
            resume,
            user_inputs,
            questions,
            now,
            None,
            None,
        )
    }

    /// Rebuilds an interview from storage. The status is recomputed from the
    /// questions rather than trusted from the stored column.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid,
        user_id: Uuid,
        resume: ResumeSnapshot,
        user_inputs: UserInputs,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
        report_id: Option<Uuid>,
    ) -> Self {
        let mut interview = Self {
            id,
            user_id,
            resume,
            user_inputs,
            questions,
            status: InterviewStatus::Pending,
            started_at,
            completed_at,
            report_id,
        };
        interview.status = interview.derived_status();
        interview
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn status(&self) -> InterviewStatus {
        self.status
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn answered_count(&self) -> usize {
        self.questions.iter().filter(|q| q.is_answered()).count()
    }

    pub fn all_answered(&self) -> bool {
        self.questions.iter().all(Question::is_answered)
    }

    fn derived_status(&self) -> InterviewStatus {
        InterviewStatus::derive(self.answered_count(), self.questions.len())
    }

    /// Looks up a question that is still open for an answer.
    pub fn open_question(&self, question_id: Uuid) -> Result<&Question, AppError> {
        self.questions
            .iter()
            .find(|q| q.id == question_id && !q.is_answered())
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))
    }

    /// Stores `answer` against an open question and advances the status.
    ///
    /// `completed_at` is stamped only on the first transition into `completed`.
    /// On error the interview is left untouched.
    pub fn record_answer(
        &mut self,
        question_id: Uuid,
        answer: String,
        now: DateTime<Utc>,
    ) -> Result<InterviewStatus, AppError> {
        self.open_question(question_id)?;
        if let Some(question) = self.questions.iter_mut().find(|q| q.id == question_id) {
            question.answer = Some(answer);
            question.answered_at = Some(now);
        }

        self.status = self.derived_status();
        if self.status == InterviewStatus::Completed && self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
        Ok(self.status)
    }

    /// Question/answer pairs in interview order. Unanswered questions yield an empty answer;
    /// callers building reports check `all_answered` first.
    pub fn qa_pairs(&self) -> Vec<QaPair> {
        self.questions
            .iter()
            .map(|q| QaPair {
                question: q.text.clone(),
                answer: q.answer.clone().unwrap_or_default(),
            })
            .collect()
    }

    pub fn summary(&self) -> InterviewSummary {
        InterviewSummary {
            id: self.id,
            resume_filename: self.resume.filename.clone(),
            user_inputs: self.user_inputs.clone(),
            questions: self
                .questions
                .iter()
                .map(|q| QuestionView {
                    id: q.id,
                    text: q.text.clone(),
                })
                .collect(),
            status: self.status,
            started_at: self.started_at,
            completed_at: self.completed_at,
            report_id: self.report_id,
        }
    }
}

/// A question as shown to the candidate during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub id: Uuid,
    pub text: String,
}

/// List-view of an interview: résumé content and answers are left out.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSummary {
    pub id: Uuid,
    pub resume_filename: String,
    pub user_inputs: UserInputs,
    pub questions: Vec<QuestionView>,
    pub status: InterviewStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub report_id: Option<Uuid>,
}

#[derive(Debug, Clone, FromRow)]
pub struct InterviewRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_filename: String,
    pub resume_content: String,
    pub job_title: String,
    pub years_of_experience: String,
    pub key_skills: String,
    pub target_role: String,
    pub industry_focus: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub report_id: Option<Uuid>,
}

#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub text: String,
    pub answer: Option<String>,
    pub answered_at: Option<DateTime<Utc>>,
}

impl InterviewRow {
    pub fn into_interview(self, questions: Vec<QuestionRow>) -> Interview {
        let questions = questions
            .into_iter()
            .map(|q| Question {
                id: q.id,
                text: q.text,
                answer: q.answer,
                answered_at: q.answered_at,
            })
            .collect();
        Interview::restore(
            self.id,
            self.user_id,
            ResumeSnapshot {
                filename: self.resume_filename,
                content: self.resume_content,
            },
            UserInputs {
                job_title: self.job_title,
                years_of_experience: self.years_of_experience,
                key_skills: self.key_skills,
                target_role: self.target_role,
                industry_focus: self.industry_focus,
            },
            questions,
            self.started_at,
            self.completed_at,
            self.report_id,
        )
    }
}
