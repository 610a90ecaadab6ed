use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use validator::Validate;

use crate::config::get_config;
use crate::dto::auth_dto::{AuthResponse, LoginRequest, RegisterRequest};
use crate::error::Result;
use crate::models::user::User;
use crate::utils::token::issue_token;
use crate::AppState;

fn auth_response(user: User) -> Result<AuthResponse> {
    let config = get_config();
    let token = issue_token(&user, &config.jwt_secret, config.jwt_ttl_hours)?;
    Ok(AuthResponse { token, user })
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response> {
    payload.validate()?;
    let user = state.user_service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(auth_response(user)?)).into_response())
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    payload.validate()?;
    let user = state
        .user_service
        .authenticate(&payload.username, &payload.password)
        .await?;
    tracing::info!(user_id = %user.id, "user logged in");
    Ok(Json(auth_response(user)?))
}

/// Tokens are stateless; the client discards its copy.
#[axum::debug_handler]
pub async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}
