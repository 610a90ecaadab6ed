use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::teacher_dto::{
    CreateTestPayload, CreatedTestResponse, TeacherTestSummary, TestDetailResponse,
    TestResultsResponse,
};
use crate::error::Result;
use crate::middleware::auth::Claims;
use crate::models::grading_scheme::GradingScheme;
use crate::models::test::Test;
use crate::AppState;

#[axum::debug_handler]
pub async fn create_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateTestPayload>,
) -> Result<Response> {
    payload.validate()?;
    let teacher_id = claims.user_id()?;
    let test = state
        .test_service
        .create_test(payload, teacher_id, &claims.username)
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedTestResponse::from(&test))).into_response())
}

#[axum::debug_handler]
pub async fn list_grading_templates(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<GradingScheme>>> {
    let templates = state
        .grading_scheme_service
        .list_templates(claims.user_id()?)
        .await?;
    Ok(Json(templates))
}

#[axum::debug_handler]
pub async fn list_tests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<TeacherTestSummary>>> {
    let tests = state
        .test_service
        .list_teacher_tests(claims.user_id()?)
        .await?;
    Ok(Json(tests))
}

#[axum::debug_handler]
pub async fn get_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<TestDetailResponse>> {
    let test = state
        .test_service
        .get_owned_test(id, claims.user_id()?)
        .await?;
    let grading_scheme = state
        .grading_scheme_service
        .scheme_for(test.grading_scheme_id)
        .await?;
    let questions = state.test_service.load_questions(test.id).await?;
    Ok(Json(TestDetailResponse {
        test,
        grading_scheme,
        questions,
    }))
}

#[axum::debug_handler]
pub async fn toggle_active(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Test>> {
    let test = state
        .test_service
        .toggle_active(id, claims.user_id()?)
        .await?;
    Ok(Json(test))
}

#[axum::debug_handler]
pub async fn test_results(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<TestResultsResponse>> {
    let results = state
        .attempt_service
        .test_results(id, claims.user_id()?)
        .await?;
    Ok(Json(results))
}
