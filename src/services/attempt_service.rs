use crate::dto::student_dto::{
    AttemptOutcomeResponse, DashboardEntry, StudentDashboardResponse, TakeTestResponse,
};
use crate::dto::teacher_dto::{TestResultRow, TestResultsResponse};
use crate::error::{Error, Result};
use crate::models::attempt::Attempt;
use crate::models::grading_scheme::grade_for;
use crate::models::question::PublicQuestion;
use crate::models::student_answer::StudentAnswer;
use crate::models::test::Test;
use crate::services::grading_scheme_service::GradingSchemeService;
use crate::services::grading_service::{AnswerRecord, GradingService};
use crate::services::test_service::TestService;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

/// Mean of the given percentages rounded to two decimals, 0 when empty.
pub fn average_percentage(percentages: &[i32]) -> f64 {
    if percentages.is_empty() {
        return 0.0;
    }
    let sum: i64 = percentages.iter().map(|p| *p as i64).sum();
    let mean = sum as f64 / percentages.len() as f64;
    (mean * 100.0).round() / 100.0
}

#[derive(Debug, FromRow)]
struct DashboardRow {
    test_id: Uuid,
    title: String,
    grading_scheme_id: Option<Uuid>,
    percentage: i32,
    submitted_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ResultRow {
    student_id: Uuid,
    username: String,
    raw_score: f64,
    percentage: i32,
    submitted_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AttemptService {
    pool: PgPool,
    tests: TestService,
    schemes: GradingSchemeService,
}

impl AttemptService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tests: TestService::new(pool.clone()),
            schemes: GradingSchemeService::new(pool.clone()),
            pool,
        }
    }

    async fn find_attempt(&self, test_id: Uuid, student_id: Uuid) -> Result<Option<Attempt>> {
        let attempt = sqlx::query_as::<_, Attempt>(
            r#"SELECT * FROM attempts WHERE test_id = $1 AND student_id = $2"#,
        )
        .bind(test_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attempt)
    }

    /// A test can be taken while it is active and only once per student.
    pub async fn ensure_can_take(&self, test: &Test, student_id: Uuid) -> Result<()> {
        if !test.is_active {
            return Err(Error::Forbidden("This test is not active".to_string()));
        }
        if self.find_attempt(test.id, student_id).await?.is_some() {
            return Err(Error::Conflict("You have already taken this test".to_string()));
        }
        Ok(())
    }

    pub async fn start(&self, test_id: Uuid, student_id: Uuid) -> Result<TakeTestResponse> {
        let test = self.tests.get_test_by_id(test_id).await?;
        self.ensure_can_take(&test, student_id).await?;
        let questions = self.tests.load_questions(test.id).await?;

        Ok(TakeTestResponse {
            id: test.id,
            title: test.title,
            description: test.description,
            time_limit_minutes: test.time_limit_minutes,
            questions: questions.iter().map(PublicQuestion::from).collect(),
        })
    }

    pub async fn submit(
        &self,
        test_id: Uuid,
        student_id: Uuid,
        answers: &HashMap<i64, JsonValue>,
    ) -> Result<AttemptOutcomeResponse> {
        let test = self.tests.get_test_by_id(test_id).await?;
        self.ensure_can_take(&test, student_id).await?;

        let questions = self.tests.load_questions(test.id).await?;
        let scheme = self.schemes.scheme_for(test.grading_scheme_id).await?;
        let graded = GradingService::grade_submission(&questions, answers, scheme.as_ref());
        let outcome = graded.outcome;

        let mut tx = self.pool.begin().await?;
        let attempt = sqlx::query_as::<_, Attempt>(
            r#"
            INSERT INTO attempts (
                id, test_id, student_id, raw_score, question_count, percentage, fully_correct
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(test.id)
        .bind(student_id)
        .bind(outcome.raw_score)
        .bind(outcome.question_count as i32)
        .bind(outcome.percentage)
        .bind(outcome.fully_correct as i32)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| match Error::from(err) {
            Error::Conflict(_) => Error::Conflict("You have already taken this test".to_string()),
            other => other,
        })?;

        Self::insert_answers(&mut tx, &attempt, &graded.records).await?;
        tx.commit().await?;

        tracing::info!(
            attempt_id = %attempt.id,
            test_id = %test.id,
            percentage = outcome.percentage,
            grade = %outcome.grade,
            "test submitted"
        );

        Ok(AttemptOutcomeResponse {
            attempt_id: attempt.id,
            test_id: test.id,
            title: test.title,
            submitted_at: attempt.submitted_at,
            outcome,
        })
    }

    async fn insert_answers(
        tx: &mut Transaction<'_, Postgres>,
        attempt: &Attempt,
        records: &[AnswerRecord],
    ) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO student_answers (attempt_id, student_id, test_id, question_id, selected_option_id, answer_text, is_correct, score) ",
        );
        builder.push_values(records, |mut row, record| {
            row.push_bind(attempt.id)
                .push_bind(attempt.student_id)
                .push_bind(attempt.test_id)
                .push_bind(record.question_id)
                .push_bind(record.selected_option_id)
                .push_bind(record.answer_text.clone())
                .push_bind(record.is_correct)
                .push_bind(record.score);
        });
        builder.build().execute(&mut **tx).await?;
        Ok(())
    }

    /// Re-renders a past submission from its stored answers.
    pub async fn result(&self, test_id: Uuid, student_id: Uuid) -> Result<AttemptOutcomeResponse> {
        let test = self.tests.get_test_by_id(test_id).await?;
        let attempt = self
            .find_attempt(test.id, student_id)
            .await?
            .ok_or_else(|| Error::NotFound("You have not taken this test".to_string()))?;

        let rows = sqlx::query_as::<_, StudentAnswer>(
            r#"SELECT * FROM student_answers WHERE attempt_id = $1 ORDER BY id"#,
        )
        .bind(attempt.id)
        .fetch_all(&self.pool)
        .await?;

        let questions = self.tests.load_questions(test.id).await?;
        let scheme = self.schemes.scheme_for(test.grading_scheme_id).await?;
        let outcome = GradingService::rebuild_outcome(&questions, &rows, scheme.as_ref());

        Ok(AttemptOutcomeResponse {
            attempt_id: attempt.id,
            test_id: test.id,
            title: test.title,
            submitted_at: attempt.submitted_at,
            outcome,
        })
    }

    pub async fn student_dashboard(&self, student_id: Uuid) -> Result<StudentDashboardResponse> {
        let rows = sqlx::query_as::<_, DashboardRow>(
            r#"
            SELECT a.test_id, t.title, t.grading_scheme_id, a.percentage, a.submitted_at
            FROM attempts a
            JOIN tests t ON t.id = a.test_id
            WHERE a.student_id = $1
            ORDER BY a.submitted_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        let scheme_ids: Vec<Uuid> = rows.iter().filter_map(|r| r.grading_scheme_id).collect();
        let schemes = self.schemes.schemes_by_id(&scheme_ids).await?;
        let percentages: Vec<i32> = rows.iter().map(|r| r.percentage).collect();

        let attempts: Vec<DashboardEntry> = rows
            .into_iter()
            .map(|row| {
                let scheme = row.grading_scheme_id.and_then(|id| schemes.get(&id));
                DashboardEntry {
                    test_id: row.test_id,
                    title: row.title,
                    percentage: row.percentage,
                    grade: grade_for(row.percentage, scheme),
                    submitted_at: row.submitted_at,
                }
            })
            .collect();

        Ok(StudentDashboardResponse {
            total_tests: attempts.len(),
            avg_percentage: average_percentage(&percentages),
            attempts,
        })
    }

    /// Per-student results of a test, newest first. Only the owner may see them.
    pub async fn test_results(&self, test_id: Uuid, creator_id: Uuid) -> Result<TestResultsResponse> {
        let test = self.tests.get_owned_test(test_id, creator_id).await?;
        let scheme = self.schemes.scheme_for(test.grading_scheme_id).await?;

        let rows = sqlx::query_as::<_, ResultRow>(
            r#"
            SELECT a.student_id, u.username, a.raw_score, a.percentage, a.submitted_at
            FROM attempts a
            JOIN users u ON u.id = a.student_id
            WHERE a.test_id = $1
            ORDER BY a.submitted_at DESC
            "#,
        )
        .bind(test.id)
        .fetch_all(&self.pool)
        .await?;

        let results = rows
            .into_iter()
            .map(|row| TestResultRow {
                student_id: row.student_id,
                username: row.username,
                raw_score: row.raw_score,
                percentage: row.percentage,
                grade: grade_for(row.percentage, scheme.as_ref()),
                submitted_at: row.submitted_at,
            })
            .collect();

        Ok(TestResultsResponse {
            test_id: test.id,
            title: test.title,
            results,
        })
    }
}
