use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One student's submission of one test. Unique per (student, test).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attempt {
    pub id: Uuid,
    pub test_id: Uuid,
    pub student_id: Uuid,
    pub raw_score: f64,
    pub question_count: i32,
    pub percentage: i32,
    pub fully_correct: i32,
    pub submitted_at: DateTime<Utc>,
}
