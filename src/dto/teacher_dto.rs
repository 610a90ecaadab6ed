use crate::models::grading_scheme::{Grade, GradingScheme, GradingType};
use crate::models::question::QuestionWithOptions;
use crate::models::test::Test;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

fn default_grading_type() -> GradingType {
    GradingType::NonDifferentiated
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOption {
    #[serde(default)]
    #[validate(length(max = 255))]
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateQuestion {
    pub text: String,
    #[serde(default)]
    pub is_text_answer: bool,
    #[serde(default)]
    pub is_multiple_choice: bool,
    pub correct_text_answer: Option<String>,
    #[validate(length(max = 2048))]
    pub image_url: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub options: Vec<CreateOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTestPayload {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 1, message = "Time limit must be at least 1 minute"))]
    pub time_limit: i32,
    #[serde(default = "default_grading_type")]
    pub grading_type: GradingType,
    #[validate(range(min = 0, max = 100))]
    pub threshold_2: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub threshold_3: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub threshold_4: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub threshold_5: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub pass_threshold: Option<i32>,
    #[serde(default)]
    pub save_as_template: bool,
    #[validate(length(max = 255))]
    pub template_name: Option<String>,
    pub load_template_id: Option<Uuid>,
    #[serde(default)]
    #[validate(nested)]
    pub questions: Vec<CreateQuestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedTestResponse {
    pub id: Uuid,
    pub code: String,
    pub title: String,
}

impl From<&Test> for CreatedTestResponse {
    fn from(test: &Test) -> Self {
        Self {
            id: test.id,
            code: test.code.clone(),
            title: test.title.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TestDetailResponse {
    #[serde(flatten)]
    pub test: Test,
    pub grading_scheme: Option<GradingScheme>,
    pub questions: Vec<QuestionWithOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeacherTestSummary {
    pub id: Uuid,
    pub title: String,
    pub code: String,
    pub is_active: bool,
    pub is_personalized: bool,
    pub created_at: DateTime<Utc>,
    pub student_count: i64,
    pub avg_percentage: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestResultRow {
    pub student_id: Uuid,
    pub username: String,
    pub raw_score: f64,
    pub percentage: i32,
    pub grade: Grade,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestResultsResponse {
    pub test_id: Uuid,
    pub title: String,
    pub results: Vec<TestResultRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecentTest {
    pub id: Uuid,
    pub title: String,
    pub code: String,
    pub time_limit_minutes: i32,
    pub is_active: bool,
    pub student_count: i64,
}
