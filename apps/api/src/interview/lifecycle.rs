//! Interview Lifecycle: creation, answering and owner-scoped reads.
//!
//! Flow for `create`: validate → question generator (deadline + fallback) →
//! persist as `pending`. Flow for `record_answer`: load owned interview →
//! check the question is open → answer analyzer (deadline + fallback) →
//! apply to the state machine → persist conditionally.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::coach::InterviewCoach;
use crate::interview::fallback::{analysis_or_fallback, questions_or_fallback};
use crate::interview::store::InterviewStore;
use crate::models::interview::{
    Interview, InterviewSummary, QuestionView, ResumeSnapshot, UserInputs,
};

pub struct InterviewLifecycle {
    store: Arc<dyn InterviewStore>,
    coach: Arc<dyn InterviewCoach>,
    ai_timeout: Duration,
}

impl InterviewLifecycle {
    pub fn new(
        store: Arc<dyn InterviewStore>,
        coach: Arc<dyn InterviewCoach>,
        ai_timeout: Duration,
    ) -> Self {
        Self {
            store,
            coach,
            ai_timeout,
        }
    }

    /// Creates an interview for `owner`. Never fails because of the AI: an
    /// unavailable question generator yields the static question list.
    pub async fn create(
        &self,
        owner: Uuid,
        resume: ResumeSnapshot,
        inputs: UserInputs,
    ) -> Result<Interview, AppError> {
        if resume.content.trim().is_empty() {
            return Err(AppError::Validation(
                "Resume contains no extractable text".to_string(),
            ));
        }
        inputs.validate()?;

        let questions =
            questions_or_fallback(self.coach.as_ref(), self.ai_timeout, &resume.content, &inputs)
                .await;

        let interview = Interview::start(owner, resume, inputs, questions, Utc::now());
        self.store.insert_interview(&interview).await?;

        info!(
            "Created interview {} with {} questions for user {}",
            interview.id,
            interview.questions().len(),
            owner
        );
        Ok(interview)
    }

    /// Records an answer and returns the analysis that was stored for it.
    pub async fn record_answer(
        &self,
        interview_id: Uuid,
        owner: Uuid,
        question_id: Uuid,
        answer_text: &str,
    ) -> Result<String, AppError> {
        if answer_text.trim().is_empty() {
            return Err(AppError::Validation(
                "Question ID and answer text are required".to_string(),
            ));
        }

        let mut interview = self.get(interview_id, owner).await?;
        interview.open_question(question_id)?;

        // The analyzer sees only the answer, not the question it responds to.
        let analysis =
            analysis_or_fallback(self.coach.as_ref(), self.ai_timeout, answer_text).await;

        interview.record_answer(question_id, analysis.clone(), Utc::now())?;
        let status = self.store.save_answer(&interview, question_id).await?;

        info!(
            "Recorded answer for question {} of interview {} (status: {})",
            question_id,
            interview_id,
            status.as_str()
        );
        Ok(analysis)
    }

    pub async fn get(&self, interview_id: Uuid, owner: Uuid) -> Result<Interview, AppError> {
        self.store
            .find_interview(interview_id, owner)
            .await?
            .ok_or_else(|| AppError::NotFound("Interview not found".to_string()))
    }

    pub async fn list(&self, owner: Uuid) -> Result<Vec<InterviewSummary>, AppError> {
        self.store.list_interviews(owner).await
    }

    pub async fn questions(
        &self,
        interview_id: Uuid,
        owner: Uuid,
    ) -> Result<Vec<QuestionView>, AppError> {
        let interview = self.get(interview_id, owner).await?;
        Ok(interview
            .questions()
            .iter()
            .map(|q| QuestionView {
                id: q.id,
                text: q.text.clone(),
            })
            .collect())
    }
}
