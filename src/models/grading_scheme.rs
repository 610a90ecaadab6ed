use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Percentage needed to pass when a test carries no grading scheme.
pub const DEFAULT_PASS_THRESHOLD: i32 = 60;

pub const DEFAULT_THRESHOLD_2: i32 = 40;
pub const DEFAULT_THRESHOLD_3: i32 = 60;
pub const DEFAULT_THRESHOLD_4: i32 = 80;
pub const DEFAULT_THRESHOLD_5: i32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "grading_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GradingType {
    Differentiated,
    NonDifferentiated,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GradingScheme {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub name: String,
    pub is_template: bool,
    pub grading_type: GradingType,
    pub threshold_2: i32,
    pub threshold_3: i32,
    pub threshold_4: i32,
    pub threshold_5: i32,
    pub pass_threshold: i32,
    pub created_at: DateTime<Utc>,
}

/// Categorical result of mapping a percentage through a grading scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "2")]
    Two,
    Pass,
    Fail,
}

impl Grade {
    pub fn label(&self) -> &'static str {
        match self {
            Grade::Five => "5",
            Grade::Four => "4",
            Grade::Three => "3",
            Grade::Two => "2",
            Grade::Pass => "Pass",
            Grade::Fail => "Fail",
        }
    }

    fn pass_fail(percentage: i32, threshold: i32) -> Self {
        if percentage >= threshold {
            Grade::Pass
        } else {
            Grade::Fail
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl GradingScheme {
    /// Maps a percentage to a grade.
    ///
    /// Differentiated thresholds are checked 5, 4, 3, 2 in that order and the first one
    /// met wins. They are used exactly as configured, so a scheme authored out of order
    /// still resolves by that descending walk.
    pub fn grade_for(&self, percentage: i32) -> Grade {
        match self.grading_type {
            GradingType::Differentiated => {
                if percentage >= self.threshold_5 {
                    Grade::Five
                } else if percentage >= self.threshold_4 {
                    Grade::Four
                } else if percentage >= self.threshold_3 {
                    Grade::Three
                } else if percentage >= self.threshold_2 {
                    Grade::Two
                } else {
                    Grade::Fail
                }
            }
            GradingType::NonDifferentiated => Grade::pass_fail(percentage, self.pass_threshold),
        }
    }
}

/// Grades a percentage with an optional scheme, falling back to the default pass mark.
pub fn grade_for(percentage: i32, scheme: Option<&GradingScheme>) -> Grade {
    match scheme {
        Some(scheme) => scheme.grade_for(percentage),
        None => Grade::pass_fail(percentage, DEFAULT_PASS_THRESHOLD),
    }
}
