//! Interview Coach: the AI collaborators of an interview, behind one trait.
//!
//! `AppState` carries an `Arc<dyn InterviewCoach>`; the default backend is
//! `LlmCoach`. Implementations report failure through `LlmError` and are never
//! expected to fall back themselves. See `interview::fallback`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::interview::prompts::{
    ANALYSIS_PROMPT_TEMPLATE, ANALYSIS_SYSTEM, IMPROVE_PROMPT_TEMPLATE, QUESTIONS_PROMPT_TEMPLATE,
    QUESTIONS_SYSTEM, REPORT_PROMPT_TEMPLATE,
};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{parse_json_output, LlmClient, LlmError};
use crate::models::interview::{QaPair, UserInputs};

/// Question lists recovered from a numbered-text reply are cut to this length.
const MAX_RECOVERED_QUESTIONS: usize = 10;

/// Structured assessment returned by the report generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDraft {
    pub overall_score: f64,
    pub accuracy: f64,
    #[serde(default)]
    pub areas_of_improvement: Vec<String>,
    #[serde(default)]
    pub grammatical_improvements: Vec<String>,
    #[serde(default)]
    pub technical_improvements: Vec<String>,
    pub question_feedback: Vec<String>,
    pub question_scores: Vec<f64>,
}

impl ReportDraft {
    /// Per-question arrays must line up one-to-one with the question set.
    pub fn check_alignment(&self, expected: usize) -> Result<(), LlmError> {
        for actual in [self.question_feedback.len(), self.question_scores.len()] {
            if actual != expected {
                return Err(LlmError::Misaligned { expected, actual });
            }
        }
        Ok(())
    }
}

#[async_trait]
pub trait InterviewCoach: Send + Sync {
    /// Ordered interview questions for a résumé and the candidate's inputs.
    async fn generate_questions(
        &self,
        resume_text: &str,
        inputs: &UserInputs,
    ) -> Result<Vec<String>, LlmError>;

    /// Free-text analysis of a single answer. Receives the answer only.
    async fn analyze_answer(&self, answer_text: &str) -> Result<String, LlmError>;

    async fn generate_report(
        &self,
        pairs: &[QaPair],
        resume_text: &str,
        inputs: &UserInputs,
    ) -> Result<ReportDraft, LlmError>;

    /// One improved answer per pair, in pair order.
    async fn improve_answers(&self, pairs: &[QaPair]) -> Result<Vec<String>, LlmError>;
}

/// Claude-backed coach.
pub struct LlmCoach {
    llm: LlmClient,
}

impl LlmCoach {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl InterviewCoach for LlmCoach {
    async fn generate_questions(
        &self,
        resume_text: &str,
        inputs: &UserInputs,
    ) -> Result<Vec<String>, LlmError> {
        let prompt = QUESTIONS_PROMPT_TEMPLATE
            .replace("{resume_text}", resume_text)
            .replace("{job_title}", &inputs.job_title)
            .replace("{years_of_experience}", &inputs.years_of_experience)
            .replace("{key_skills}", &inputs.key_skills)
            .replace("{target_role}", &inputs.target_role)
            .replace("{industry_focus}", &inputs.industry_focus);

        let text = self.llm.call_text(&prompt, QUESTIONS_SYSTEM).await?;
        parse_question_list(&text)
    }

    async fn analyze_answer(&self, answer_text: &str) -> Result<String, LlmError> {
        let prompt = ANALYSIS_PROMPT_TEMPLATE.replace("{answer_text}", answer_text);
        self.llm.call_text(&prompt, ANALYSIS_SYSTEM).await
    }

    async fn generate_report(
        &self,
        pairs: &[QaPair],
        resume_text: &str,
        inputs: &UserInputs,
    ) -> Result<ReportDraft, LlmError> {
        let prompt = REPORT_PROMPT_TEMPLATE
            .replace("{resume_text}", resume_text)
            .replace("{inputs_json}", &serde_json::to_string(inputs)?)
            .replace("{qa_json}", &serde_json::to_string(pairs)?)
            .replace("{count}", &pairs.len().to_string());

        self.llm.call_json(&prompt, JSON_ONLY_SYSTEM).await
    }

    async fn improve_answers(&self, pairs: &[QaPair]) -> Result<Vec<String>, LlmError> {
        let prompt = IMPROVE_PROMPT_TEMPLATE
            .replace("{qa_json}", &serde_json::to_string(pairs)?)
            .replace("{count}", &pairs.len().to_string());

        self.llm.call_json(&prompt, JSON_ONLY_SYSTEM).await
    }
}

/// Reads a question list from model output.
///
/// A JSON array of strings is taken as-is. Anything else is treated as a
/// numbered list (`1. …`, `2. …`) and the first ten items are kept.
pub fn parse_question_list(text: &str) -> Result<Vec<String>, LlmError> {
    let questions: Vec<String> = match parse_json_output::<Vec<String>>(text) {
        Ok(list) => list
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect(),
        Err(_) => split_numbered_list(text)
            .into_iter()
            .take(MAX_RECOVERED_QUESTIONS)
            .collect(),
    };

    if questions.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(questions)
}

/// Splits text on `<digits>.<whitespace>` markers.
fn split_numbered_list(text: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_ascii_digit() && (i == 0 || !chars[i - 1].is_alphanumeric()) {
            let mut j = i;
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            if j + 1 < chars.len() && chars[j] == '.' && chars[j + 1].is_whitespace() {
                items.push(std::mem::take(&mut current));
                i = j + 2;
                continue;
            }
        }
        current.push(chars[i]);
        i += 1;
    }
    items.push(current);

    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
