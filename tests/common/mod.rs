#![allow(dead_code)]

use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

/// Builds the full application against `DATABASE_URL`, or `None` when no database is
/// configured so the calling test can skip.
pub async fn app() -> Option<Router> {
    dotenvy::dotenv().ok();
    if env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping database-backed test");
        return None;
    }
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("JWT_SECRET", "test_secret_key");
    env::set_var("API_RPS", "1000");
    let _ = quiz_backend::config::init_config();

    let pool = quiz_backend::database::pool::create_pool()
        .await
        .expect("pool");
    quiz_backend::database::pool::run_migrations(&pool)
        .await
        .expect("migrations");

    let rps = quiz_backend::config::get_config().api_rps;
    Some(quiz_backend::routes::build_router(
        quiz_backend::AppState::new(pool),
        rps,
    ))
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };
    (status, json)
}

pub fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, &Uuid::new_v4().simple().to_string()[..12])
}

/// Registers a user and returns (token, username).
pub async fn register(app: &Router, role: &str) -> (String, String) {
    let username = unique_name(role);
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "s3cret-pass",
            "password_confirm": "s3cret-pass",
            "role": role,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    let token = body["token"].as_str().expect("token").to_string();
    (token, username)
}

/// Finds the id of the option with `text` within a question of a teacher test detail.
pub fn option_id(question: &JsonValue, text: &str) -> i64 {
    question["options"]
        .as_array()
        .expect("options")
        .iter()
        .find(|o| o["text"] == text)
        .and_then(|o| o["id"].as_i64())
        .expect("option id")
}
