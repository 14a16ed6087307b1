//! Report Cache/Builder: at most one report per interview.
//!
//! Steps:
//! 1. Load the owned interview and re-check that every question is answered.
//! 2. Return the stored report if there is one.
//! 3. Take the per-interview build lock and check again.
//! 4. Report generator + answer improver (deadline + fallback each).
//! 5. Zip positionally with the Q&A pairs, clamp scores.
//! 6. Conditional insert; the stored report is returned either way.
//!
//! The in-process lock keeps concurrent requests in one process from paying for
//! duplicate AI calls. The unique constraint behind `insert_report` covers
//! everything else.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::coach::{InterviewCoach, ReportDraft};
use crate::interview::fallback::{improved_answers_or_fallback, report_or_fallback};
use crate::interview::store::InterviewStore;
use crate::models::interview::{Interview, QaPair};
use crate::models::report::{clamp_score, ImprovedAnswer, QuestionFeedback, Report};

type BuildLock = Arc<tokio::sync::Mutex<()>>;

/// A request's handle on an interview's build lock. Dropping it, including when
/// the request is cancelled mid-build, removes the map entry once no other
/// request holds the lock.
struct BuildSlot<'a> {
    in_flight: &'a Mutex<HashMap<Uuid, BuildLock>>,
    interview_id: Uuid,
    lock: BuildLock,
}

impl Drop for BuildSlot<'_> {
    fn drop(&mut self) {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // One handle in the map, one here.
        if Arc::strong_count(&self.lock) <= 2 {
            in_flight.remove(&self.interview_id);
        }
    }
}

pub struct ReportBuilder {
    store: Arc<dyn InterviewStore>,
    coach: Arc<dyn InterviewCoach>,
    ai_timeout: Duration,
    in_flight: Mutex<HashMap<Uuid, BuildLock>>,
}

impl ReportBuilder {
    pub fn new(
        store: Arc<dyn InterviewStore>,
        coach: Arc<dyn InterviewCoach>,
        ai_timeout: Duration,
    ) -> Self {
        Self {
            store,
            coach,
            ai_timeout,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_or_build(&self, interview_id: Uuid, owner: Uuid) -> Result<Report, AppError> {
        let interview = self
            .store
            .find_interview(interview_id, owner)
            .await?
            .ok_or_else(|| AppError::NotFound("Interview not found".to_string()))?;

        if !interview.all_answered() {
            return Err(AppError::Validation(
                "Not all questions have been answered".to_string(),
            ));
        }

        if let Some(report) = self.store.find_report(interview.id).await? {
            return Ok(report);
        }

        let slot = self.claim(interview.id);
        let _guard = slot.lock.lock().await;
        match self.store.find_report(interview.id).await? {
            Some(report) => Ok(report),
            None => self.build(&interview).await,
        }
    }

    async fn build(&self, interview: &Interview) -> Result<Report, AppError> {
        let pairs = interview.qa_pairs();
        info!(
            "Building report for interview {} ({} questions)",
            interview.id,
            pairs.len()
        );

        let draft = report_or_fallback(
            self.coach.as_ref(),
            self.ai_timeout,
            &pairs,
            &interview.resume.content,
            &interview.user_inputs,
        )
        .await;
        let improved =
            improved_answers_or_fallback(self.coach.as_ref(), self.ai_timeout, &pairs).await;

        let report = assemble_report(interview, &pairs, draft, improved)?;
        self.store.insert_report(&report).await
    }

    fn claim(&self, interview_id: Uuid) -> BuildSlot<'_> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let lock = in_flight.entry(interview_id).or_default().clone();
        BuildSlot {
            in_flight: &self.in_flight,
            interview_id,
            lock,
        }
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        self.in_flight.lock().unwrap().len()
    }
}

/// Zips generator output onto the Q&A pairs by position.
///
/// The fallback layer has already enforced one entry per pair; a mismatch here
/// is reported as an internal error rather than silently truncated.
fn assemble_report(
    interview: &Interview,
    pairs: &[QaPair],
    draft: ReportDraft,
    improved: Vec<String>,
) -> Result<Report, AppError> {
    let n = pairs.len();
    if draft.question_feedback.len() != n
        || draft.question_scores.len() != n
        || improved.len() != n
    {
        return Err(AppError::Internal(anyhow::anyhow!(
            "report output misaligned for interview {}: {} pairs, {} feedback, {} scores, {} improved",
            interview.id,
            n,
            draft.question_feedback.len(),
            draft.question_scores.len(),
            improved.len()
        )));
    }

    let question_feedback = pairs
        .iter()
        .zip(draft.question_feedback)
        .zip(draft.question_scores)
        .map(|((qa, feedback), score)| QuestionFeedback {
            question: qa.question.clone(),
            answer: qa.answer.clone(),
            feedback,
            score: clamp_score(score),
        })
        .collect();

    let improved_answers = pairs
        .iter()
        .zip(improved)
        .map(|(qa, improved_answer)| ImprovedAnswer {
            question: qa.question.clone(),
            original_answer: qa.answer.clone(),
            improved_answer,
        })
        .collect();

    Ok(Report {
        id: Uuid::new_v4(),
        interview_id: interview.id,
        user_id: interview.user_id,
        overall_score: clamp_score(draft.overall_score),
        accuracy: clamp_score(draft.accuracy),
        areas_of_improvement: draft.areas_of_improvement,
        grammatical_improvements: draft.grammatical_improvements,
        technical_improvements: draft.technical_improvements,
        question_feedback,
        improved_answers,
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::interview::fallback::FALLBACK_QUESTION_FEEDBACK;
    use crate::interview::lifecycle::InterviewLifecycle;
    use crate::interview::testing::{FailingCoach, MemoryStore, ScriptedCoach, StalledCoach};
    use crate::models::interview::tests::{sample_inputs, sample_resume};

    const LIMIT: Duration = Duration::from_secs(5);

    /// Creates an interview through the lifecycle and answers `answered` of its questions.
    async fn interview_with_answers(store: &Arc<MemoryStore>, answered: usize) -> (Uuid, Uuid) {
        let lifecycle =
            InterviewLifecycle::new(store.clone(), Arc::new(ScriptedCoach::default()), LIMIT);
        let owner = Uuid::new_v4();
        let interview = lifecycle
            .create(owner, sample_resume(), sample_inputs())
            .await
            .unwrap();
        for question in interview.questions().iter().take(answered) {
            lifecycle
                .record_answer(interview.id, owner, question.id, "My answer")
                .await
                .unwrap();
        }
        (interview.id, owner)
    }

    #[tokio::test]
    async fn test_builds_aligned_report_and_links_it() {
        let store = Arc::new(MemoryStore::default());
        let (interview_id, owner) = interview_with_answers(&store, 2).await;
        let builder = ReportBuilder::new(store.clone(), Arc::new(ScriptedCoach::default()), LIMIT);

        let report = builder.get_or_build(interview_id, owner).await.unwrap();

        assert_eq!(report.interview_id, interview_id);
        assert_eq!(report.user_id, owner);
        assert_eq!(report.overall_score, 91.0);
        assert_eq!(report.question_feedback.len(), 2);
        assert_eq!(
            report.question_feedback[0].question,
            "Walk me through your last project."
        );
        assert_eq!(report.question_feedback[0].answer, "Analysis: My answer");
        assert_eq!(report.question_feedback[0].feedback, "Feedback 0");
        // 150 from the model is clamped.
        assert_eq!(report.question_feedback[0].score, 100.0);
        assert_eq!(report.question_feedback[1].score, 90.0);
        assert_eq!(
            report.improved_answers[1].improved_answer,
            "Better: Analysis: My answer"
        );
        assert_eq!(
            report.improved_answers[1].original_answer,
            "Analysis: My answer"
        );
        assert_eq!(
            store.stored(interview_id).unwrap().report_id,
            Some(report.id)
        );
    }

    #[tokio::test]
    async fn test_second_call_returns_identical_report() {
        let store = Arc::new(MemoryStore::default());
        let (interview_id, owner) = interview_with_answers(&store, 2).await;
        let coach = Arc::new(ScriptedCoach::default());
        let builder = ReportBuilder::new(store.clone(), coach.clone(), LIMIT);

        let first = builder.get_or_build(interview_id, owner).await.unwrap();
        let second = builder.get_or_build(interview_id, owner).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(coach.report_calls.load(Ordering::SeqCst), 1);
        assert_eq!(coach.improve_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.report_count(), 1);
    }

    #[tokio::test]
    async fn test_unanswered_questions_block_report() {
        let store = Arc::new(MemoryStore::default());
        let (interview_id, owner) = interview_with_answers(&store, 1).await;
        let builder = ReportBuilder::new(store.clone(), Arc::new(ScriptedCoach::default()), LIMIT);

        let err = builder.get_or_build(interview_id, owner).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.report_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_or_foreign_interview_is_not_found() {
        let store = Arc::new(MemoryStore::default());
        let (interview_id, _owner) = interview_with_answers(&store, 2).await;
        let builder = ReportBuilder::new(store.clone(), Arc::new(ScriptedCoach::default()), LIMIT);

        assert!(matches!(
            builder.get_or_build(interview_id, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            builder.get_or_build(Uuid::new_v4(), Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_generator_failure_yields_fallback_report() {
        let store = Arc::new(MemoryStore::default());
        let (interview_id, owner) = interview_with_answers(&store, 2).await;
        let builder = ReportBuilder::new(store.clone(), Arc::new(FailingCoach), LIMIT);

        let report = builder.get_or_build(interview_id, owner).await.unwrap();

        assert_eq!(report.overall_score, 75.0);
        assert_eq!(report.accuracy, 80.0);
        assert_eq!(report.question_feedback.len(), 2);
        for feedback in &report.question_feedback {
            assert_eq!(feedback.feedback, FALLBACK_QUESTION_FEEDBACK);
            assert!((70.0..100.0).contains(&feedback.score));
        }
        assert!(report.improved_answers[0]
            .improved_answer
            .starts_with("Improved version of: \"Analysis: My answer\"."));
    }

    #[tokio::test]
    async fn test_concurrent_builds_persist_one_report() {
        let store = Arc::new(MemoryStore::default());
        let (interview_id, owner) = interview_with_answers(&store, 2).await;
        let coach =
            Arc::new(ScriptedCoach::default().with_report_delay(Duration::from_millis(50)));
        let builder = Arc::new(ReportBuilder::new(store.clone(), coach.clone(), LIMIT));

        let a = tokio::spawn({
            let builder = builder.clone();
            async move { builder.get_or_build(interview_id, owner).await }
        });
        let b = tokio::spawn({
            let builder = builder.clone();
            async move { builder.get_or_build(interview_id, owner).await }
        });
        let first = a.await.unwrap().unwrap();
        let second = b.await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(store.report_count(), 1);
        assert_eq!(coach.report_calls.load(Ordering::SeqCst), 1);
        assert_eq!(builder.in_flight_len(), 0);
    }

    #[tokio::test]
    async fn test_separate_builders_still_persist_one_report() {
        let store = Arc::new(MemoryStore::default());
        let (interview_id, owner) = interview_with_answers(&store, 2).await;
        let coach =
            Arc::new(ScriptedCoach::default().with_report_delay(Duration::from_millis(50)));
        let first_node = ReportBuilder::new(store.clone(), coach.clone(), LIMIT);
        let second_node = ReportBuilder::new(store.clone(), coach.clone(), LIMIT);

        let (first, second) = tokio::join!(
            first_node.get_or_build(interview_id, owner),
            second_node.get_or_build(interview_id, owner)
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_eq!(first, second);
        assert_eq!(store.report_count(), 1);
        assert_eq!(store.stored(interview_id).unwrap().report_id, Some(first.id));
    }

    #[tokio::test]
    async fn test_cancelled_build_releases_its_lock_entry() {
        let store = Arc::new(MemoryStore::default());
        let (interview_id, owner) = interview_with_answers(&store, 2).await;
        let builder = ReportBuilder::new(store.clone(), Arc::new(StalledCoach), LIMIT);

        let outcome = tokio::time::timeout(
            Duration::from_millis(20),
            builder.get_or_build(interview_id, owner),
        )
        .await;

        assert!(outcome.is_err());
        assert_eq!(builder.in_flight_len(), 0);
        assert_eq!(store.report_count(), 0);

        // A later request can still build.
        let retry = ReportBuilder::new(store.clone(), Arc::new(ScriptedCoach::default()), LIMIT);
        retry.get_or_build(interview_id, owner).await.unwrap();
        assert_eq!(store.report_count(), 1);
    }

    #[test]
    fn test_waiting_request_keeps_entry_until_it_finishes() {
        let builder = ReportBuilder::new(
            Arc::new(MemoryStore::default()),
            Arc::new(StalledCoach),
            LIMIT,
        );
        let interview_id = Uuid::new_v4();

        let holder = builder.claim(interview_id);
        let waiter = builder.claim(interview_id);
        drop(holder);
        assert_eq!(builder.in_flight_len(), 1);
        drop(waiter);
        assert_eq!(builder.in_flight_len(), 0);
    }

    #[test]
    fn test_assemble_rejects_misaligned_output() {
        let interview = Interview::start(
            Uuid::new_v4(),
            sample_resume(),
            sample_inputs(),
            vec!["Q1".into(), "Q2".into()],
            Utc::now(),
        );
        let pairs = interview.qa_pairs();
        let draft = crate::interview::fallback::fallback_report(2);
        let err = assemble_report(&interview, &pairs, draft, vec!["only one".into()]).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
