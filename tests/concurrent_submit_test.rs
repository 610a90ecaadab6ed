mod common;

use axum::http::{Method, StatusCode};
use common::{app, register, send};
use serde_json::json;

const SUBMITTERS: usize = 8;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_record_one_attempt() {
    let Some(app) = app().await else { return };

    let (teacher, _) = register(&app, "teacher").await;
    let (student, _) = register(&app, "student").await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/teacher/tests",
        Some(&teacher),
        Some(json!({
            "title": "Speed round",
            "time_limit": 5,
            "grading_type": "differentiated",
            "questions": [
                { "text": "5 * 5?", "is_text_answer": true, "correct_text_answer": "25" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!(
        "/api/student/tests/{}/submit",
        created["id"].as_str().unwrap()
    );

    let handles: Vec<_> = (0..SUBMITTERS)
        .map(|_| {
            let app = app.clone();
            let uri = uri.clone();
            let student = student.clone();
            tokio::spawn(async move {
                send(
                    &app,
                    Method::POST,
                    &uri,
                    Some(&student),
                    Some(json!({ "answers": {} })),
                )
                .await
            })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        match status {
            StatusCode::OK => accepted += 1,
            StatusCode::CONFLICT => {
                assert_eq!(body["error"], "You have already taken this test")
            }
            other => panic!("unexpected status {}: {}", other, body),
        }
    }
    assert_eq!(accepted, 1);

    let (status, dashboard) = send(
        &app,
        Method::GET,
        "/api/student/dashboard",
        Some(&student),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["total_tests"], 1);
}
