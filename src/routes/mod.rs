pub mod auth;
pub mod common;
pub mod health;
pub mod student;
pub mod teacher;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{auth as guards, rate_limit};
use crate::AppState;

pub fn build_router(state: AppState, rps: u32) -> Router {
    let auth_api = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login));

    let teacher_api = Router::new()
        .route(
            "/api/teacher/tests",
            get(teacher::list_tests).post(teacher::create_test),
        )
        .route("/api/teacher/tests/:id", get(teacher::get_test))
        .route(
            "/api/teacher/tests/:id/toggle-active",
            post(teacher::toggle_active),
        )
        .route("/api/teacher/tests/:id/results", get(teacher::test_results))
        .route(
            "/api/teacher/grading-schemes",
            get(teacher::list_grading_templates),
        )
        .layer(from_fn(guards::require_teacher));

    let student_api = Router::new()
        .route("/api/student/tests/lookup", post(student::lookup_test))
        .route("/api/student/tests/:id/start", get(student::start_test))
        .route("/api/student/tests/:id/submit", post(student::submit_test))
        .route("/api/student/tests/:id/result", get(student::test_result))
        .route("/api/student/dashboard", get(student::dashboard))
        .route(
            "/api/student/practice-tests",
            post(student::create_practice_test),
        )
        .layer(from_fn(guards::require_student));

    let shared_api = Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/tests/recent", get(common::recent_tests))
        .layer(from_fn(guards::require_bearer_auth));

    let api = Router::new()
        .merge(auth_api)
        .merge(teacher_api)
        .merge(student_api)
        .merge(shared_api)
        .layer(from_fn_with_state(
            rate_limit::RateLimiter::new(rps),
            rate_limit::rps_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
