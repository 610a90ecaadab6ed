use crate::dto::teacher_dto::{
    CreateOption, CreateQuestion, CreateTestPayload, RecentTest, TeacherTestSummary,
};
use crate::error::{Error, Result};
use crate::models::question::{AnswerOption, Question, QuestionWithOptions};
use crate::models::test::Test;
use crate::models::user::Role;
use crate::services::grading_scheme_service::{
    template_name, GradingSchemeService, SchemeParams, PER_TEST_SCHEME_NAME,
};
use crate::utils::token::generate_test_code;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

const CODE_ATTEMPTS: usize = 100;
const RECENT_TESTS_LIMIT: i64 = 3;
const PRACTICE_POOL_SIZE: i64 = 10;
const PRACTICE_TIME_LIMIT_MINUTES: i32 = 10;

/// An option ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOption {
    pub text: String,
    pub is_correct: bool,
}

/// A question row ready to be inserted.
#[derive(Debug, Clone, Copy)]
struct NewQuestion<'a> {
    text: &'a str,
    is_text_answer: bool,
    is_multiple_choice: bool,
    correct_text_answer: Option<&'a str>,
    image_url: Option<&'a str>,
}

/// Trims an authored image link; blank means no image.
pub fn image_url(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|url| !url.is_empty())
}

/// Applies the authoring rules for choice options: blank text becomes `Option <n>`, a
/// single-select question keeps only its last correct flag, and a question with no
/// correct option gets its first one marked correct.
pub fn normalize_options(is_multiple_choice: bool, options: &[CreateOption]) -> Vec<NewOption> {
    let mut normalized: Vec<NewOption> = options
        .iter()
        .enumerate()
        .map(|(idx, o)| NewOption {
            text: match o.text.trim() {
                "" => format!("Option {}", idx + 1),
                text => text.to_string(),
            },
            is_correct: o.is_correct,
        })
        .collect();

    if !is_multiple_choice {
        if let Some(last) = normalized.iter().rposition(|o| o.is_correct) {
            for (idx, option) in normalized.iter_mut().enumerate() {
                option.is_correct = idx == last;
            }
        }
    }

    if !normalized.iter().any(|o| o.is_correct) {
        if let Some(first) = normalized.first_mut() {
            first.is_correct = true;
        }
    }

    normalized
}

/// Keeps the first occurrence of each question id, in order.
pub fn unique_question_ids(ids: &[i64]) -> Vec<i64> {
    let mut unique = Vec::new();
    for id in ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    unique
}

#[derive(Clone)]
pub struct TestService {
    pool: PgPool,
}

impl TestService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_test(
        &self,
        payload: CreateTestPayload,
        creator_id: Uuid,
        creator_username: &str,
    ) -> Result<Test> {
        let params = match payload.load_template_id {
            Some(template_id) => {
                let template = GradingSchemeService::new(self.pool.clone())
                    .get_template(template_id, creator_id)
                    .await?;
                SchemeParams::from_template(&template)
            }
            None => SchemeParams::from_payload(&payload)?,
        };
        let scheme_name = if payload.save_as_template {
            template_name(payload.template_name.as_deref(), creator_username, Utc::now())
        } else {
            PER_TEST_SCHEME_NAME.to_string()
        };

        let mut tx = self.pool.begin().await?;
        let scheme = GradingSchemeService::insert_scheme(
            &mut tx,
            creator_id,
            &scheme_name,
            payload.save_as_template,
            &params,
        )
        .await?;

        let test = Self::insert_test(
            &mut tx,
            payload.title.trim(),
            &payload.description,
            payload.time_limit,
            creator_id,
            Some(scheme.id),
            false,
        )
        .await?;

        let mut position = 0;
        for question in payload.questions.iter().filter(|q| !q.text.trim().is_empty()) {
            Self::insert_authored_question(&mut tx, test.id, position, question).await?;
            position += 1;
        }

        tx.commit().await?;
        tracing::info!(test_id = %test.id, code = %test.code, questions = position, "test created");
        Ok(test)
    }

    async fn unique_code(tx: &mut Transaction<'_, Postgres>) -> Result<String> {
        for _ in 0..CODE_ATTEMPTS {
            let code = generate_test_code();
            let taken: bool =
                sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM tests WHERE code = $1)"#)
                    .bind(&code)
                    .fetch_one(&mut **tx)
                    .await?;
            if !taken {
                return Ok(code);
            }
        }
        Err(Error::Internal("Could not generate a unique test code".to_string()))
    }

    async fn insert_test(
        tx: &mut Transaction<'_, Postgres>,
        title: &str,
        description: &str,
        time_limit_minutes: i32,
        creator_id: Uuid,
        grading_scheme_id: Option<Uuid>,
        is_personalized: bool,
    ) -> Result<Test> {
        let code = Self::unique_code(tx).await?;
        let test = sqlx::query_as::<_, Test>(
            r#"
            INSERT INTO tests (
                id, title, description, code, time_limit_minutes,
                is_active, is_personalized, creator_id, grading_scheme_id
            )
            VALUES ($1, $2, $3, $4, $5, TRUE, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(description)
        .bind(code)
        .bind(time_limit_minutes)
        .bind(is_personalized)
        .bind(creator_id)
        .bind(grading_scheme_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(test)
    }

    async fn insert_question(
        tx: &mut Transaction<'_, Postgres>,
        test_id: Uuid,
        position: i32,
        question: &NewQuestion<'_>,
    ) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO questions (
                test_id, position, text, is_text_answer, is_multiple_choice,
                correct_text_answer, image_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(test_id)
        .bind(position)
        .bind(question.text)
        .bind(question.is_text_answer)
        .bind(question.is_multiple_choice)
        .bind(question.correct_text_answer)
        .bind(question.image_url)
        .fetch_one(&mut **tx)
        .await?;
        Ok(id)
    }

    async fn insert_options(
        tx: &mut Transaction<'_, Postgres>,
        question_id: i64,
        options: &[NewOption],
    ) -> Result<()> {
        for (position, option) in options.iter().enumerate() {
            sqlx::query(
                r#"INSERT INTO options (question_id, position, text, is_correct) VALUES ($1, $2, $3, $4)"#,
            )
            .bind(question_id)
            .bind(position as i32)
            .bind(&option.text)
            .bind(option.is_correct)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    async fn insert_authored_question(
        tx: &mut Transaction<'_, Postgres>,
        test_id: Uuid,
        position: i32,
        question: &CreateQuestion,
    ) -> Result<()> {
        let correct_text = if question.is_text_answer {
            Some(question.correct_text_answer.as_deref().unwrap_or_default())
        } else {
            question.correct_text_answer.as_deref()
        };
        let new_question = NewQuestion {
            text: question.text.trim(),
            is_text_answer: question.is_text_answer,
            is_multiple_choice: question.is_multiple_choice,
            correct_text_answer: correct_text,
            image_url: image_url(question.image_url.as_deref()),
        };
        let question_id = Self::insert_question(tx, test_id, position, &new_question).await?;

        if !question.is_text_answer {
            let options = normalize_options(question.is_multiple_choice, &question.options);
            Self::insert_options(tx, question_id, &options).await?;
        }
        Ok(())
    }

    /// Copies questions and their options verbatim into another test.
    async fn copy_questions(
        tx: &mut Transaction<'_, Postgres>,
        test_id: Uuid,
        questions: &[QuestionWithOptions],
    ) -> Result<()> {
        for (position, source) in questions.iter().enumerate() {
            let q = &source.question;
            let new_question = NewQuestion {
                text: &q.text,
                is_text_answer: q.is_text_answer,
                is_multiple_choice: q.is_multiple_choice,
                correct_text_answer: q.correct_text_answer.as_deref(),
                image_url: q.image_url.as_deref(),
            };
            let question_id =
                Self::insert_question(tx, test_id, position as i32, &new_question).await?;
            let options: Vec<NewOption> = source
                .options
                .iter()
                .map(|o| NewOption {
                    text: o.text.clone(),
                    is_correct: o.is_correct,
                })
                .collect();
            Self::insert_options(tx, question_id, &options).await?;
        }
        Ok(())
    }

    pub async fn get_test_by_id(&self, test_id: Uuid) -> Result<Test> {
        let test = sqlx::query_as::<_, Test>(r#"SELECT * FROM tests WHERE id = $1"#)
            .bind(test_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(test)
    }

    pub async fn get_owned_test(&self, test_id: Uuid, creator_id: Uuid) -> Result<Test> {
        sqlx::query_as::<_, Test>(r#"SELECT * FROM tests WHERE id = $1 AND creator_id = $2"#)
            .bind(test_id)
            .bind(creator_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Test not found".to_string()))
    }

    /// Looks a test up by its share code, ignoring case and surrounding whitespace.
    pub async fn get_test_by_code(&self, code: &str) -> Result<Test> {
        let code = code.trim().to_uppercase();
        sqlx::query_as::<_, Test>(r#"SELECT * FROM tests WHERE code = $1"#)
            .bind(&code)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("No test with this code".to_string()))
    }

    pub async fn load_questions(&self, test_id: Uuid) -> Result<Vec<QuestionWithOptions>> {
        let questions = sqlx::query_as::<_, Question>(
            r#"SELECT * FROM questions WHERE test_id = $1 ORDER BY position, id"#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        self.attach_options(questions).await
    }

    /// Loads questions by id, returned in the order of `ids`.
    pub async fn load_questions_by_ids(&self, ids: &[i64]) -> Result<Vec<QuestionWithOptions>> {
        let questions = sqlx::query_as::<_, Question>(
            r#"SELECT * FROM questions WHERE id = ANY($1)"#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        let mut loaded = self.attach_options(questions).await?;
        loaded.sort_by_key(|q| ids.iter().position(|id| *id == q.question.id));
        Ok(loaded)
    }

    async fn attach_options(&self, questions: Vec<Question>) -> Result<Vec<QuestionWithOptions>> {
        let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
        let options = if ids.is_empty() {
            Vec::new()
        } else {
            sqlx::query_as::<_, AnswerOption>(
                r#"SELECT * FROM options WHERE question_id = ANY($1) ORDER BY position, id"#,
            )
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?
        };

        let mut by_question: HashMap<i64, Vec<AnswerOption>> = HashMap::new();
        for option in options {
            by_question.entry(option.question_id).or_default().push(option);
        }

        Ok(questions
            .into_iter()
            .map(|question| QuestionWithOptions {
                options: by_question.remove(&question.id).unwrap_or_default(),
                question,
            })
            .collect())
    }

    pub async fn toggle_active(&self, test_id: Uuid, creator_id: Uuid) -> Result<Test> {
        let test = sqlx::query_as::<_, Test>(
            r#"
            UPDATE tests SET is_active = NOT is_active
            WHERE id = $1 AND creator_id = $2
            RETURNING *
            "#,
        )
        .bind(test_id)
        .bind(creator_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Test not found".to_string()))?;

        tracing::info!(test_id = %test.id, is_active = test.is_active, "test availability changed");
        Ok(test)
    }

    pub async fn list_teacher_tests(&self, creator_id: Uuid) -> Result<Vec<TeacherTestSummary>> {
        let rows = sqlx::query_as::<_, TeacherTestSummary>(
            r#"
            SELECT
                t.id, t.title, t.code, t.is_active, t.is_personalized, t.created_at,
                COUNT(a.id) AS student_count,
                AVG(a.percentage)::DOUBLE PRECISION AS avg_percentage
            FROM tests t
            LEFT JOIN attempts a ON a.test_id = t.id
            WHERE t.creator_id = $1
            GROUP BY t.id
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Students see the newest active tests; teachers their own newest tests.
    pub async fn recent_tests(&self, user_id: Uuid, role: Role) -> Result<Vec<RecentTest>> {
        let rows = sqlx::query_as::<_, RecentTest>(
            r#"
            SELECT
                t.id, t.title, t.code, t.time_limit_minutes, t.is_active,
                COUNT(DISTINCT a.student_id) AS student_count
            FROM tests t
            LEFT JOIN attempts a ON a.test_id = t.id
            WHERE CASE WHEN $2 THEN t.creator_id = $1 ELSE t.is_active AND NOT t.is_personalized END
            GROUP BY t.id
            ORDER BY t.created_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(role == Role::Teacher)
        .bind(RECENT_TESTS_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Builds a personalized test from the questions the student most recently missed.
    ///
    /// The pool is the student's last ten answer rows that were wrong or only partly
    /// right, one entry per question.
    pub async fn create_practice_test(
        &self,
        student_id: Uuid,
        student_username: &str,
        num_questions: usize,
    ) -> Result<Test> {
        let recent_misses: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT question_id FROM student_answers
            WHERE student_id = $1 AND (is_correct = FALSE OR score < 1)
            ORDER BY id DESC
            LIMIT $2
            "#,
        )
        .bind(student_id)
        .bind(PRACTICE_POOL_SIZE)
        .fetch_all(&self.pool)
        .await?;

        let candidates = unique_question_ids(&recent_misses);
        if candidates.len() < num_questions {
            return Err(Error::BadRequest(format!(
                "Not enough missed questions to build a test: only {} available. Take more tests or ask for fewer questions.",
                candidates.len()
            )));
        }

        let questions = self
            .load_questions_by_ids(&candidates[..num_questions])
            .await?;

        let mut tx = self.pool.begin().await?;
        let test = Self::insert_test(
            &mut tx,
            &format!("Personalized test for {}", student_username),
            "Built from your most recent incorrect answers to help you work on weak spots.",
            PRACTICE_TIME_LIMIT_MINUTES,
            student_id,
            None,
            true,
        )
        .await?;
        Self::copy_questions(&mut tx, test.id, &questions).await?;
        tx.commit().await?;

        tracing::info!(test_id = %test.id, questions = questions.len(), "practice test created");
        Ok(test)
    }
}
