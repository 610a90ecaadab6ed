use crate::dto::teacher_dto::CreateTestPayload;
use crate::error::{Error, Result};
use crate::models::grading_scheme::{
    GradingScheme, GradingType, DEFAULT_PASS_THRESHOLD, DEFAULT_THRESHOLD_2, DEFAULT_THRESHOLD_3,
    DEFAULT_THRESHOLD_4, DEFAULT_THRESHOLD_5,
};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

/// Name given to the per-test scheme row when it is not saved as a template.
pub const PER_TEST_SCHEME_NAME: &str = "My settings";

/// Scheme parameters before they are stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemeParams {
    pub grading_type: GradingType,
    pub threshold_2: i32,
    pub threshold_3: i32,
    pub threshold_4: i32,
    pub threshold_5: i32,
    pub pass_threshold: i32,
}

impl SchemeParams {
    pub fn from_template(template: &GradingScheme) -> Self {
        Self {
            grading_type: template.grading_type,
            threshold_2: template.threshold_2,
            threshold_3: template.threshold_3,
            threshold_4: template.threshold_4,
            threshold_5: template.threshold_5,
            pass_threshold: template.pass_threshold,
        }
    }

    /// A pass/fail scheme must name its pass mark; missing differentiated thresholds take
    /// the defaults.
    pub fn from_payload(payload: &CreateTestPayload) -> Result<Self> {
        if payload.grading_type == GradingType::NonDifferentiated
            && payload.pass_threshold.is_none()
        {
            return Err(Error::BadRequest(
                "A pass threshold is required for pass/fail grading".to_string(),
            ));
        }
        Ok(Self {
            grading_type: payload.grading_type,
            threshold_2: payload.threshold_2.unwrap_or(DEFAULT_THRESHOLD_2),
            threshold_3: payload.threshold_3.unwrap_or(DEFAULT_THRESHOLD_3),
            threshold_4: payload.threshold_4.unwrap_or(DEFAULT_THRESHOLD_4),
            threshold_5: payload.threshold_5.unwrap_or(DEFAULT_THRESHOLD_5),
            pass_threshold: payload.pass_threshold.unwrap_or(DEFAULT_PASS_THRESHOLD),
        })
    }
}

pub fn template_name(requested: Option<&str>, username: &str, now: DateTime<Utc>) -> String {
    match requested.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => name.to_string(),
        None => format!("Template_{}_{}", username, now.format("%Y%m%d")),
    }
}

#[derive(Clone)]
pub struct GradingSchemeService {
    pool: PgPool,
}

impl GradingSchemeService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_scheme(&self, scheme_id: Uuid) -> Result<GradingScheme> {
        let scheme = sqlx::query_as::<_, GradingScheme>(
            r#"SELECT * FROM grading_schemes WHERE id = $1"#,
        )
        .bind(scheme_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(scheme)
    }

    pub async fn scheme_for(&self, scheme_id: Option<Uuid>) -> Result<Option<GradingScheme>> {
        match scheme_id {
            Some(id) => Ok(Some(self.get_scheme(id).await?)),
            None => Ok(None),
        }
    }

    pub async fn schemes_by_id(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, GradingScheme>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, GradingScheme>(
            r#"SELECT * FROM grading_schemes WHERE id = ANY($1)"#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|s| (s.id, s)).collect())
    }

    pub async fn list_templates(&self, creator_id: Uuid) -> Result<Vec<GradingScheme>> {
        let rows = sqlx::query_as::<_, GradingScheme>(
            r#"
            SELECT * FROM grading_schemes
            WHERE creator_id = $1 AND is_template = TRUE
            ORDER BY created_at DESC
            "#,
        )
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_template(&self, template_id: Uuid, creator_id: Uuid) -> Result<GradingScheme> {
        sqlx::query_as::<_, GradingScheme>(
            r#"SELECT * FROM grading_schemes WHERE id = $1 AND creator_id = $2 AND is_template = TRUE"#,
        )
        .bind(template_id)
        .bind(creator_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Grading template not found".to_string()))
    }

    pub async fn insert_scheme(
        tx: &mut Transaction<'_, Postgres>,
        creator_id: Uuid,
        name: &str,
        is_template: bool,
        params: &SchemeParams,
    ) -> Result<GradingScheme> {
        let scheme = sqlx::query_as::<_, GradingScheme>(
            r#"
            INSERT INTO grading_schemes (
                id, creator_id, name, is_template, grading_type,
                threshold_2, threshold_3, threshold_4, threshold_5, pass_threshold
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(creator_id)
        .bind(name)
        .bind(is_template)
        .bind(params.grading_type)
        .bind(params.threshold_2)
        .bind(params.threshold_3)
        .bind(params.threshold_4)
        .bind(params.threshold_5)
        .bind(params.pass_threshold)
        .fetch_one(&mut **tx)
        .await?;
        Ok(scheme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn payload(grading_type: GradingType, pass_threshold: Option<i32>) -> CreateTestPayload {
        CreateTestPayload {
            title: "Algebra".into(),
            description: String::new(),
            time_limit: 20,
            grading_type,
            threshold_2: None,
            threshold_3: Some(55),
            threshold_4: None,
            threshold_5: None,
            pass_threshold,
            save_as_template: false,
            template_name: None,
            load_template_id: None,
            questions: Vec::new(),
        }
    }

    #[test]
    fn pass_fail_scheme_requires_threshold() {
        let err = SchemeParams::from_payload(&payload(GradingType::NonDifferentiated, None));
        assert!(matches!(err, Err(Error::BadRequest(_))));
    }

    #[test]
    fn differentiated_scheme_fills_missing_thresholds() {
        let params =
            SchemeParams::from_payload(&payload(GradingType::Differentiated, None)).unwrap();
        assert_eq!(params.threshold_2, DEFAULT_THRESHOLD_2);
        assert_eq!(params.threshold_3, 55);
        assert_eq!(params.threshold_5, DEFAULT_THRESHOLD_5);
        assert_eq!(params.pass_threshold, DEFAULT_PASS_THRESHOLD);
    }

    #[test]
    fn template_name_falls_back_to_username_and_date() {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap();
        assert_eq!(template_name(None, "olga", now), "Template_olga_20250309");
        assert_eq!(template_name(Some("  "), "olga", now), "Template_olga_20250309");
        assert_eq!(template_name(Some(" Finals "), "olga", now), "Finals");
    }
}
