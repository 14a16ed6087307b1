//! Interview persistence.
//!
//! `InterviewStore` is the seam between the lifecycle/report services and the
//! database. Writes that race with other requests are conditional, so the
//! database remains the arbiter:
//! - an answer only lands on a question whose `answer IS NULL`;
//! - status and `completed_at` are recomputed from the stored rows while the
//!   interview row is locked;
//! - a report insert is `ON CONFLICT (interview_id) DO NOTHING`, and the stored
//!   report is what every caller gets back.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::{
    Interview, InterviewRow, InterviewStatus, InterviewSummary, QuestionRow,
};
use crate::models::report::{Report, ReportRow};

#[async_trait]
pub trait InterviewStore: Send + Sync {
    async fn insert_interview(&self, interview: &Interview) -> Result<(), AppError>;

    /// Owner-scoped lookup: an interview belonging to someone else is `None`.
    async fn find_interview(&self, id: Uuid, owner: Uuid) -> Result<Option<Interview>, AppError>;

    /// Newest first.
    async fn list_interviews(&self, owner: Uuid) -> Result<Vec<InterviewSummary>, AppError>;

    /// Persists the answer `interview` now holds for `question_id` and returns the
    /// stored status. Fails with `NotFound` if the question was answered meanwhile.
    async fn save_answer(
        &self,
        interview: &Interview,
        question_id: Uuid,
    ) -> Result<InterviewStatus, AppError>;

    async fn find_report(&self, interview_id: Uuid) -> Result<Option<Report>, AppError>;

    /// Inserts `report` unless one already exists for its interview, links it to
    /// the interview, and returns whichever report is stored.
    async fn insert_report(&self, report: &Report) -> Result<Report, AppError>;
}

pub struct PgInterviewStore {
    pool: PgPool,
}

impl PgInterviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn questions_for(&self, interview_ids: &[Uuid]) -> Result<Vec<QuestionRow>, AppError> {
        Ok(sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, interview_id, text, answer, answered_at
            FROM interview_questions
            WHERE interview_id = ANY($1)
            ORDER BY interview_id, position
            "#,
        )
        .bind(interview_ids)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl InterviewStore for PgInterviewStore {
    async fn insert_interview(&self, interview: &Interview) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO interviews
                (id, user_id, resume_filename, resume_content, job_title, years_of_experience,
                 key_skills, target_role, industry_focus, status, started_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(interview.id)
        .bind(interview.user_id)
        .bind(&interview.resume.filename)
        .bind(&interview.resume.content)
        .bind(&interview.user_inputs.job_title)
        .bind(&interview.user_inputs.years_of_experience)
        .bind(&interview.user_inputs.key_skills)
        .bind(&interview.user_inputs.target_role)
        .bind(&interview.user_inputs.industry_focus)
        .bind(interview.status().as_str())
        .bind(interview.started_at)
        .execute(&mut *tx)
        .await?;

        for (position, question) in interview.questions().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO interview_questions (id, interview_id, position, text)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(question.id)
            .bind(interview.id)
            .bind(position as i32)
            .bind(&question.text)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(
            "Inserted interview {} with {} questions for user {}",
            interview.id,
            interview.questions().len(),
            interview.user_id
        );
        Ok(())
    }

    async fn find_interview(&self, id: Uuid, owner: Uuid) -> Result<Option<Interview>, AppError> {
        let row = sqlx::query_as::<_, InterviewRow>(
            "SELECT * FROM interviews WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let questions = self.questions_for(&[row.id]).await?;
        Ok(Some(row.into_interview(questions)))
    }

    async fn list_interviews(&self, owner: Uuid) -> Result<Vec<InterviewSummary>, AppError> {
        let rows = sqlx::query_as::<_, InterviewRow>(
            "SELECT * FROM interviews WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut by_interview: HashMap<Uuid, Vec<QuestionRow>> = HashMap::new();
        for question in self.questions_for(&ids).await? {
            by_interview
                .entry(question.interview_id)
                .or_default()
                .push(question);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let questions = by_interview.remove(&row.id).unwrap_or_default();
                row.into_interview(questions).summary()
            })
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

        let mut tx = self.pool.begin().await?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM interviews WHERE id = $1 AND user_id = $2 FOR UPDATE")
                .bind(interview.id)
                .bind(interview.user_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(AppError::NotFound("Interview not found".to_string()));
        }

        let updated = sqlx::query(
            r#"
            UPDATE interview_questions
            SET answer = $1, answered_at = $2
            WHERE id = $3 AND interview_id = $4 AND answer IS NULL
            "#,
        )
        .bind(question.answer.as_deref())
        .bind(question.answered_at)
        .bind(question_id)
        .bind(interview.id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Question not found".to_string()));
        }

        let (total, answered): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(answer) FROM interview_questions WHERE interview_id = $1",
        )
        .bind(interview.id)
        .fetch_one(&mut *tx)
        .await?;
        let status = InterviewStatus::derive(answered as usize, total as usize);

        sqlx::query(
            r#"
            UPDATE interviews
            SET status = $1,
                completed_at = CASE WHEN $1 = 'completed' THEN COALESCE(completed_at, $2)
                                    ELSE completed_at END
            WHERE id = $3
            "#,
        )
        .bind(status.as_str())
        .bind(interview.completed_at().unwrap_or_else(Utc::now))
        .bind(interview.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(status)
    }

    async fn find_report(&self, interview_id: Uuid) -> Result<Option<Report>, AppError> {
        let row =
            sqlx::query_as::<_, ReportRow>("SELECT * FROM reports WHERE interview_id = $1")
                .bind(interview_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Report::from))
    }

    async fn insert_report(&self, report: &Report) -> Result<Report, AppError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO reports
                (id, interview_id, user_id, overall_score, accuracy, areas_of_improvement,
                 grammatical_improvements, technical_improvements, question_feedback,
                 improved_answers, generated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (interview_id) DO NOTHING
            "#,
        )
        .bind(report.id)
        .bind(report.interview_id)
        .bind(report.user_id)
        .bind(report.overall_score)
        .bind(report.accuracy)
        .bind(&report.areas_of_improvement)
        .bind(&report.grammatical_improvements)
        .bind(&report.technical_improvements)
        .bind(Json(&report.question_feedback))
        .bind(Json(&report.improved_answers))
        .bind(report.generated_at)
        .execute(&mut *tx)
        .await?;

        let stored: Report =
            sqlx::query_as::<_, ReportRow>("SELECT * FROM reports WHERE interview_id = $1")
                .bind(report.interview_id)
                .fetch_one(&mut *tx)
                .await?
                .into();

        sqlx::query("UPDATE interviews SET report_id = $1 WHERE id = $2 AND report_id IS NULL")
            .bind(stored.id)
            .bind(stored.interview_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if inserted.rows_affected() == 0 {
            info!(
                "Report for interview {} already existed, returning stored report {}",
                report.interview_id, stored.id
            );
        } else {
            info!(
                "Persisted report {} for interview {}",
                stored.id, stored.interview_id
            );
        }
        Ok(stored)
    }
}
