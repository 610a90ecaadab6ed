use axum::{extract::State, response::Json, Extension};

use crate::dto::teacher_dto::RecentTest;
use crate::error::Result;
use crate::middleware::auth::Claims;
use crate::models::user::Role;
use crate::AppState;

#[axum::debug_handler]
pub async fn recent_tests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<RecentTest>>> {
    let role = if claims.has_role(Role::Teacher) {
        Role::Teacher
    } else {
        Role::Student
    };
    let tests = state
        .test_service
        .recent_tests(claims.user_id()?, role)
        .await?;
    Ok(Json(tests))
}
