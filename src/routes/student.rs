use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::student_dto::{
    AttemptOutcomeResponse, LookupTestRequest, LookupTestResponse, PracticeTestRequest,
    StudentDashboardResponse, SubmitAnswersRequest, TakeTestResponse,
};
use crate::dto::teacher_dto::CreatedTestResponse;
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::AppState;

#[axum::debug_handler]
pub async fn lookup_test(
    State(state): State<AppState>,
    Json(payload): Json<LookupTestRequest>,
) -> Result<Json<LookupTestResponse>> {
    payload.validate()?;
    let test = state.test_service.get_test_by_code(&payload.code).await?;
    if !test.is_active {
        return Err(Error::Forbidden("This test is not active".to_string()));
    }
    Ok(Json(LookupTestResponse {
        test_id: test.id,
        title: test.title,
        time_limit_minutes: test.time_limit_minutes,
    }))
}

#[axum::debug_handler]
pub async fn start_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<TakeTestResponse>> {
    let test = state.attempt_service.start(id, claims.user_id()?).await?;
    Ok(Json(test))
}

#[axum::debug_handler]
pub async fn submit_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitAnswersRequest>,
) -> Result<Json<AttemptOutcomeResponse>> {
    let outcome = state
        .attempt_service
        .submit(id, claims.user_id()?, &payload.answers)
        .await?;
    Ok(Json(outcome))
}

#[axum::debug_handler]
pub async fn test_result(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<AttemptOutcomeResponse>> {
    let outcome = state.attempt_service.result(id, claims.user_id()?).await?;
    Ok(Json(outcome))
}

#[axum::debug_handler]
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<StudentDashboardResponse>> {
    let dashboard = state
        .attempt_service
        .student_dashboard(claims.user_id()?)
        .await?;
    Ok(Json(dashboard))
}

#[axum::debug_handler]
pub async fn create_practice_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PracticeTestRequest>,
) -> Result<Response> {
    payload.validate()?;
    let test = state
        .test_service
        .create_practice_test(
            claims.user_id()?,
            &claims.username,
            payload.num_questions as usize,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedTestResponse::from(&test))).into_response())
}
