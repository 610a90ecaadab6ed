mod common;

use axum::http::{Method, StatusCode};
use common::{app, option_id, register, send};
use serde_json::json;

#[tokio::test]
async fn practice_test_is_built_from_missed_questions() {
    let Some(app) = app().await else { return };

    let (teacher, _) = register(&app, "teacher").await;
    let (student, student_name) = register(&app, "student").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/student/practice-tests",
        Some(&student),
        Some(json!({ "num_questions": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/student/practice-tests",
        Some(&student),
        Some(json!({ "num_questions": 21 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/teacher/tests",
        Some(&teacher),
        Some(json!({
            "title": "Arithmetic",
            "time_limit": 10,
            "grading_type": "differentiated",
            "questions": [
                {
                    "text": "3 * 3?",
                    "options": [
                        { "text": "6" },
                        { "text": "9", "is_correct": true }
                    ]
                },
                { "text": "10 / 2?", "is_text_answer": true, "correct_text_answer": "5" },
                { "text": "1 + 1?", "is_text_answer": true, "correct_text_answer": "2" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let test_id = created["id"].as_str().unwrap().to_string();

    let (_, detail) = send(
        &app,
        Method::GET,
        &format!("/api/teacher/tests/{}", test_id),
        Some(&teacher),
        None,
    )
    .await;
    let questions = detail["questions"].as_array().unwrap();

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/student/tests/{}/submit", test_id),
        Some(&student),
        Some(json!({
            "answers": {
                (questions[0]["id"].to_string()): option_id(&questions[0], "6"),
                (questions[1]["id"].to_string()): "four",
                (questions[2]["id"].to_string()): "2",
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/student/practice-tests",
        Some(&student),
        Some(json!({ "num_questions": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("only 2 available"));

    let (status, practice) = send(
        &app,
        Method::POST,
        "/api/student/practice-tests",
        Some(&student),
        Some(json!({ "num_questions": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", practice);
    assert_eq!(
        practice["title"],
        format!("Personalized test for {}", student_name)
    );

    let (status, taking) = send(
        &app,
        Method::GET,
        &format!(
            "/api/student/tests/{}/start",
            practice["id"].as_str().unwrap()
        ),
        Some(&student),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(taking["time_limit_minutes"], 10);
    let texts: Vec<&str> = taking["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["10 / 2?", "3 * 3?"]);
}
