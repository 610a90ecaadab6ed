use crate::models::grading_scheme::Grade;
use crate::models::question::PublicQuestion;
use crate::services::grading_service::TestOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

fn default_num_questions() -> i32 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LookupTestRequest {
    #[validate(length(min = 1, max = 32))]
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LookupTestResponse {
    pub test_id: Uuid,
    pub title: String,
    pub time_limit_minutes: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TakeTestResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub time_limit_minutes: i32,
    pub questions: Vec<PublicQuestion>,
}

/// Raw answers keyed by question id: a string for text questions, an option id or a
/// list of option ids for choice questions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitAnswersRequest {
    #[serde(default)]
    pub answers: HashMap<i64, JsonValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptOutcomeResponse {
    pub attempt_id: Uuid,
    pub test_id: Uuid,
    pub title: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: TestOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardEntry {
    pub test_id: Uuid,
    pub title: String,
    pub percentage: i32,
    pub grade: Grade,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentDashboardResponse {
    pub attempts: Vec<DashboardEntry>,
    pub total_tests: usize,
    pub avg_percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PracticeTestRequest {
    #[serde(default = "default_num_questions")]
    #[validate(range(min = 1, max = 20, message = "Number of questions must be between 1 and 20"))]
    pub num_questions: i32,
}
