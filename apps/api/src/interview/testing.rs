//! In-memory store and scripted coaches for service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::coach::{InterviewCoach, ReportDraft};
use crate::interview::store::InterviewStore;
use crate::llm_client::LlmError;
use crate::models::interview::{Interview, InterviewStatus, InterviewSummary, QaPair, UserInputs};
use crate::models::report::Report;

/// Mirrors the conditional-write behaviour of `PgInterviewStore`.
#[derive(Default)]
pub struct MemoryStore {
    interviews: Mutex<Vec<Interview>>,
    reports: Mutex<HashMap<Uuid, Report>>,
}

impl MemoryStore {
    pub fn interview_count(&self) -> usize {
        self.interviews.lock().unwrap().len()
    }

    pub fn report_count(&self) -> usize {
        self.reports.lock().unwrap().len()
    }

    pub fn stored(&self, id: Uuid) -> Option<Interview> {
        self.interviews
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id)
            .cloned()
    }
}

#[async_trait]
impl InterviewStore for MemoryStore {
    async fn insert_interview(&self, interview: &Interview) -> Result<(), AppError> {
        self.interviews.lock().unwrap().push(interview.clone());
        Ok(())
    }

    async fn find_interview(&self, id: Uuid, owner: Uuid) -> Result<Option<Interview>, AppError> {
        Ok(self
            .interviews
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id && i.user_id == owner)
            .cloned())
    }

    async fn list_interviews(&self, owner: Uuid) -> Result<Vec<InterviewSummary>, AppError> {
        Ok(self
            .interviews
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|i| i.user_id == owner)
            .map(Interview::summary)
            .collect())
    }

    async fn save_answer(
        &self,
        interview: &Interview,
        question_id: Uuid,
    ) -> Result<InterviewStatus, AppError> {
        let question = interview
            .questions()
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;
        let (answer, answered_at) = match (&question.answer, question.answered_at) {
            (Some(answer), Some(at)) => (answer.clone(), at),
            _ => return Err(AppError::NotFound("Question not found".to_string())),
        };

        let mut interviews = self.interviews.lock().unwrap();
        let stored = interviews
            .iter_mut()
            .find(|i| i.id == interview.id && i.user_id == interview.user_id)
            .ok_or_else(|| AppError::NotFound("Interview not found".to_string()))?;
        stored.record_answer(question_id, answer, answered_at)
    }

    async fn find_report(&self, interview_id: Uuid) -> Result<Option<Report>, AppError> {
        Ok(self.reports.lock().unwrap().get(&interview_id).cloned())
    }

    async fn insert_report(&self, report: &Report) -> Result<Report, AppError> {
        let stored = self
            .reports
            .lock()
            .unwrap()
            .entry(report.interview_id)
            .or_insert_with(|| report.clone())
            .clone();

        let mut interviews = self.interviews.lock().unwrap();
        if let Some(interview) = interviews.iter_mut().find(|i| i.id == stored.interview_id) {
            interview.report_id.get_or_insert(stored.id);
        }
        Ok(stored)
    }
}

/// Deterministic coach. Records how often each report-side call is made.
pub struct ScriptedCoach {
    questions: Vec<String>,
    report_feedback: Option<usize>,
    improved: Option<Vec<String>>,
    report_delay: Duration,
    pub report_calls: AtomicUsize,
    pub improve_calls: AtomicUsize,
}

impl Default for ScriptedCoach {
    fn default() -> Self {
        Self {
            questions: vec![
                "Walk me through your last project.".to_string(),
                "How does the borrow checker prevent data races?".to_string(),
            ],
            report_feedback: None,
            improved: None,
            report_delay: Duration::ZERO,
            report_calls: AtomicUsize::new(0),
            improve_calls: AtomicUsize::new(0),
        }
    }
}

impl ScriptedCoach {
    pub fn with_questions(questions: Vec<String>) -> Self {
        Self {
            questions,
            ..Self::default()
        }
    }

    /// Forces the report to carry exactly `count` feedback entries and scores.
    pub fn with_report_feedback(mut self, count: usize) -> Self {
        self.report_feedback = Some(count);
        self
    }

    pub fn with_improved(mut self, improved: Vec<String>) -> Self {
        self.improved = Some(improved);
        self
    }

    pub fn with_report_delay(mut self, delay: Duration) -> Self {
        self.report_delay = delay;
        self
    }
}

#[async_trait]
impl InterviewCoach for ScriptedCoach {
    async fn generate_questions(
        &self,
        _resume_text: &str,
        _inputs: &UserInputs,
    ) -> Result<Vec<String>, LlmError> {
        Ok(self.questions.clone())
    }

    async fn analyze_answer(&self, answer_text: &str) -> Result<String, LlmError> {
        Ok(format!("Analysis: {answer_text}"))
    }

    async fn generate_report(
        &self,
        pairs: &[QaPair],
        _resume_text: &str,
        _inputs: &UserInputs,
    ) -> Result<ReportDraft, LlmError> {
        self.report_calls.fetch_add(1, Ordering::SeqCst);
        if !self.report_delay.is_zero() {
            tokio::time::sleep(self.report_delay).await;
        }
        let count = self.report_feedback.unwrap_or(pairs.len());
        Ok(ReportDraft {
            overall_score: 91.0,
            accuracy: 88.0,
            areas_of_improvement: vec!["Lead with the outcome".to_string()],
            grammatical_improvements: vec![],
            technical_improvements: vec!["Mention lifetimes explicitly".to_string()],
            question_feedback: (0..count).map(|i| format!("Feedback {i}")).collect(),
            question_scores: (0..count).map(|i| 150.0 - (i as f64) * 60.0).collect(),
        })
    }

    async fn improve_answers(&self, pairs: &[QaPair]) -> Result<Vec<String>, LlmError> {
        self.improve_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.improved.clone().unwrap_or_else(|| {
            pairs
                .iter()
                .map(|qa| format!("Better: {}", qa.answer))
                .collect()
        }))
    }
}

/// Coach whose every call fails.
pub struct FailingCoach;

#[async_trait]
impl InterviewCoach for FailingCoach {
    async fn generate_questions(
        &self,
        _resume_text: &str,
        _inputs: &UserInputs,
    ) -> Result<Vec<String>, LlmError> {
        Err(LlmError::EmptyContent)
    }

    async fn analyze_answer(&self, _answer_text: &str) -> Result<String, LlmError> {
        Err(LlmError::Api {
            status: 503,
            message: "overloaded".to_string(),
        })
    }

    async fn generate_report(
        &self,
        _pairs: &[QaPair],
        _resume_text: &str,
        _inputs: &UserInputs,
    ) -> Result<ReportDraft, LlmError> {
        Err(LlmError::Api {
            status: 500,
            message: "internal".to_string(),
        })
    }

    async fn improve_answers(&self, _pairs: &[QaPair]) -> Result<Vec<String>, LlmError> {
        Err(LlmError::EmptyContent)
    }
}

/// Coach that never answers.
pub struct StalledCoach;

#[async_trait]
impl InterviewCoach for StalledCoach {
    async fn generate_questions(
        &self,
        _resume_text: &str,
        _inputs: &UserInputs,
    ) -> Result<Vec<String>, LlmError> {
        std::future::pending().await
    }

    async fn analyze_answer(&self, _answer_text: &str) -> Result<String, LlmError> {
        std::future::pending().await
    }

    async fn generate_report(
        &self,
        _pairs: &[QaPair],
        _resume_text: &str,
        _inputs: &UserInputs,
    ) -> Result<ReportDraft, LlmError> {
        std::future::pending().await
    }

    async fn improve_answers(&self, _pairs: &[QaPair]) -> Result<Vec<String>, LlmError> {
        std::future::pending().await
    }
}
