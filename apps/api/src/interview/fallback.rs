//! AI boundary: every coach call runs under a deadline, and any failure is
//! logged and replaced by static output. Nothing in here returns an error.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::interview::coach::{InterviewCoach, ReportDraft};
use crate::llm_client::LlmError;
use crate::models::interview::{QaPair, UserInputs};

pub const FALLBACK_QUESTIONS: [&str; 10] = [
    "Tell me about your background and experience.",
    "What are your key technical skills?",
    "Describe a challenging project you worked on recently.",
    "How do you stay updated with the latest technologies?",
    "What is your approach to problem-solving?",
    "How do you handle tight deadlines?",
    "Describe your experience working in teams.",
    "What are your career goals?",
    "Why are you interested in this role?",
    "Do you have any questions for me?",
];

pub const FALLBACK_ANALYSIS: &str = "Error analyzing answer. Please try again.";

pub const FALLBACK_OVERALL_SCORE: f64 = 75.0;
pub const FALLBACK_ACCURACY: f64 = 80.0;
pub const FALLBACK_QUESTION_FEEDBACK: &str = "Good answer, but could be more specific.";

const FALLBACK_AREAS: [&str; 3] = [
    "Be more specific with technical examples",
    "Provide more quantifiable achievements",
    "Improve conciseness in responses",
];
const FALLBACK_GRAMMAR: [&str; 3] = [
    "Watch for run-on sentences",
    "Use more professional terminology",
    "Maintain consistent tense throughout answers",
];
const FALLBACK_TECHNICAL: [&str; 3] = [
    "Deepen knowledge of industry-specific tools",
    "Strengthen understanding of technical concepts",
    "Practice explaining technical solutions more clearly",
];

/// Awaits `call` for at most `limit`, mapping an elapsed deadline to `LlmError::Timeout`.
pub async fn with_deadline<T, F>(limit: Duration, call: F) -> Result<T, LlmError>
where
    F: Future<Output = Result<T, LlmError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(LlmError::Timeout(limit)),
    }
}

pub fn fallback_questions() -> Vec<String> {
    FALLBACK_QUESTIONS.iter().map(|q| q.to_string()).collect()
}

/// Canned report for `count` questions; each question scores uniformly in [70, 100).
pub fn fallback_report(count: usize) -> ReportDraft {
    let mut rng = rand::thread_rng();
    ReportDraft {
        overall_score: FALLBACK_OVERALL_SCORE,
        accuracy: FALLBACK_ACCURACY,
        areas_of_improvement: FALLBACK_AREAS.iter().map(|s| s.to_string()).collect(),
        grammatical_improvements: FALLBACK_GRAMMAR.iter().map(|s| s.to_string()).collect(),
        technical_improvements: FALLBACK_TECHNICAL.iter().map(|s| s.to_string()).collect(),
        question_feedback: vec![FALLBACK_QUESTION_FEEDBACK.to_string(); count],
        question_scores: (0..count)
            .map(|_| f64::from(rng.gen_range(70u32..100)))
            .collect(),
    }
}

pub fn fallback_improved_answers(pairs: &[QaPair]) -> Vec<String> {
    pairs
        .iter()
        .map(|qa| {
            format!(
                "Improved version of: \"{}\". This answer now includes more specific examples, \
                 quantifiable results, and demonstrates both technical expertise and soft skills.",
                qa.answer
            )
        })
        .collect()
}

pub async fn questions_or_fallback(
    coach: &dyn InterviewCoach,
    limit: Duration,
    resume_text: &str,
    inputs: &UserInputs,
) -> Vec<String> {
    let result = with_deadline(limit, coach.generate_questions(resume_text, inputs)).await;
    match result {
        Ok(questions) if !questions.is_empty() => questions,
        Ok(_) => {
            warn!("Question generator returned no questions, using fallback list");
            fallback_questions()
        }
        Err(e) => {
            warn!("Question generation failed, using fallback list: {e}");
            fallback_questions()
        }
    }
}

pub async fn analysis_or_fallback(
    coach: &dyn InterviewCoach,
    limit: Duration,
    answer_text: &str,
) -> String {
    match with_deadline(limit, coach.analyze_answer(answer_text)).await {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!("Answer analysis failed, using fallback text: {e}");
            FALLBACK_ANALYSIS.to_string()
        }
    }
}

pub async fn report_or_fallback(
    coach: &dyn InterviewCoach,
    limit: Duration,
    pairs: &[QaPair],
    resume_text: &str,
    inputs: &UserInputs,
) -> ReportDraft {
    let result = with_deadline(limit, coach.generate_report(pairs, resume_text, inputs))
        .await
        .and_then(|draft| draft.check_alignment(pairs.len()).map(|_| draft));
    match result {
        Ok(draft) => draft,
        Err(e) => {
            warn!("Report generation failed, using fallback report: {e}");
            fallback_report(pairs.len())
        }
    }
}

pub async fn improved_answers_or_fallback(
    coach: &dyn InterviewCoach,
    limit: Duration,
    pairs: &[QaPair],
) -> Vec<String> {
    let result = with_deadline(limit, coach.improve_answers(pairs))
        .await
        .and_then(|improved| {
            if improved.len() == pairs.len() {
                Ok(improved)
            } else {
                Err(LlmError::Misaligned {
                    expected: pairs.len(),
                    actual: improved.len(),
                })
            }
        });
    match result {
        Ok(improved) => improved,
        Err(e) => {
            warn!("Answer improvement failed, using templated answers: {e}");
            fallback_improved_answers(pairs)
        }
    }
}
