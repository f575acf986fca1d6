mod common;

use axum::{body::Body, http::{Request, StatusCode}};
use common::{get, post_json, send, Behavior, FakeModel, FakeStore};
use jee_quiz_api::services::question_store::QuestionStore;
use serde_json::{json, Value};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

fn assert_well_formed(question: &Value) {
    let options = question["options"].as_array().unwrap();
    let index = question["answer_index"].as_u64().unwrap() as usize;
    assert_eq!(options.len(), 4);
    assert!(index < options.len());
    assert_eq!(question["correctAnswer"], options[index]);
}

#[tokio::test]
async fn test_generate_quiz_returns_target_count_per_mode() {
    for (mode, topic, expected, calls) in [
        (json!("quick"), Value::Null, 5, 1),
        (json!("topic"), json!("Kinematics"), 10, 1),
        (json!("full"), Value::Null, 30, 3),
        (Value::Null, Value::Null, 10, 1),
    ] {
        let model = FakeModel::new(Behavior::Valid);
        let app = common::create_test_app(model.clone(), None);

        let (status, body) = post_json(
            &app,
            "/api/v1/questions/generate-quiz",
            json!({ "subject": "Physics", "mode": mode, "topic": topic }),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "mode {:?}: {}", mode, body);
        let questions = body["questions"].as_array().unwrap();
        assert_eq!(questions.len(), expected);
        assert_eq!(model.calls(), calls);
        questions.iter().for_each(assert_well_formed);
        assert_eq!(
            body["message"],
            format!("Generated {} questions for Physics.", expected)
        );
    }
}

#[tokio::test]
async fn test_generate_quiz_titles_and_topics() {
    let app = common::create_test_app(FakeModel::new(Behavior::Valid), None);

    let (_, body) = post_json(
        &app,
        "/api/v1/questions/generate-quiz",
        json!({ "subject": "Physics", "mode": "quick" }),
    )
    .await;
    assert_eq!(body["quizTitle"], "Physics - Quick Practice");
    assert_eq!(body["questions"][0]["topic"], "Kinematics");
    assert_eq!(body["questions"][0]["subject"], "Physics");
    assert_eq!(body["questions"][0]["id"], Value::Null);

    let (_, body) = post_json(
        &app,
        "/api/v1/questions/generate-quiz",
        json!({ "subject": "Chemistry" }),
    )
    .await;
    assert_eq!(body["quizTitle"], "Chemistry - Practice");
    assert_eq!(body["questions"][0]["topic"], "Mixed");
}

#[tokio::test]
async fn test_generate_quiz_rejects_invalid_requests_without_upstream_calls() {
    let model = FakeModel::new(Behavior::Valid);
    let app = common::create_test_app(model.clone(), None);

    for payload in [
        json!({ "subject": "Biology", "mode": "quick" }),
        json!({ "subject": "Physics", "mode": "topic" }),
        json!({ "subject": "Physics", "mode": "topic", "topic": "Hydrocarbons" }),
        json!({ "subject": "Physics", "mode": "marathon" }),
        json!({ "subject": "" }),
    ] {
        let (status, body) = post_json(&app, "/api/v1/questions/generate-quiz", payload.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
        assert_eq!(body["status"], 400);
        assert!(body["error"].is_string());
    }

    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_generate_quiz_rejects_malformed_json() {
    let app = common::create_test_app(FakeModel::new(Behavior::Valid), None);

    let (status, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/v1/questions/generate-quiz")
            .header("content-type", "application/json")
            .body(Body::from("{\"subject\": "))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to parse JSON request body"));
}

#[tokio::test]
async fn test_generate_quiz_unusable_upstream_output() {
    for text in [
        "I'm sorry, I can't produce that.",
        "```json\n[{\"question\": \"Missing options\", \"answer_index\": 0}]\n```",
        "{\"question\": \"not a list\"}",
    ] {
        let model = FakeModel::new(Behavior::Text(text.to_string()));
        let app = common::create_test_app(model.clone(), None);

        let (status, body) = post_json(
            &app,
            "/api/v1/questions/generate-quiz",
            json!({ "subject": "Maths", "mode": "full" }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "AI generated malformed data. Please try again.");
        assert_eq!(model.calls(), 1);
    }
}

#[tokio::test]
async fn test_generate_quiz_keeps_valid_siblings_of_bad_items() {
    let mut items = common::valid_items(3);
    let list = items.as_array_mut().unwrap();
    list.push(json!({ "question": "No index", "options": ["a", "b", "c", "d"] }));
    list.push(json!({ "question": "Three options", "options": ["a", "b", "c"], "answer_index": 0 }));
    list.push(json!({ "question": "Out of range", "options": ["a", "b", "c", "d"], "answer_index": 4 }));
    let text = format!("```json\n{}\n```", items);

    let model = FakeModel::new(Behavior::Text(text));
    let app = common::create_test_app(model.clone(), None);

    let (status, body) = post_json(
        &app,
        "/api/v1/questions/generate-quiz",
        json!({ "subject": "Physics", "mode": "quick" }),
    )
    .await;

    // Each batch yields three valid items, so the second call tops the quiz up.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["questions"].as_array().unwrap().len(), 5);
    assert_eq!(model.calls(), 2);
}

#[tokio::test]
async fn test_generate_quiz_upstream_failures() {
    for (behavior, expected) in [
        (Behavior::Timeout, StatusCode::GATEWAY_TIMEOUT),
        (Behavior::Unavailable, StatusCode::BAD_GATEWAY),
        (Behavior::Unconfigured, StatusCode::INTERNAL_SERVER_ERROR),
    ] {
        let app = common::create_test_app(FakeModel::new(behavior), None);
        let (status, body) = post_json(
            &app,
            "/api/v1/questions/generate-quiz",
            json!({ "subject": "Chemistry", "mode": "quick" }),
        )
        .await;

        assert_eq!(status, expected);
        assert_eq!(body["status"], expected.as_u16());
    }
}

#[tokio::test]
async fn test_persistence_failure_does_not_change_response() {
    let payload = json!({ "subject": "Physics", "mode": "quick" });

    let app = common::create_test_app(FakeModel::new(Behavior::Valid), None);
    let (baseline_status, baseline) =
        post_json(&app, "/api/v1/questions/generate-quiz", payload.clone()).await;

    let failing: Arc<dyn QuestionStore> = Arc::new(FakeStore::failing());
    let app = common::create_test_app(FakeModel::new(Behavior::Valid), Some(failing));
    let (status, body) = post_json(&app, "/api/v1/questions/generate-quiz", payload).await;

    assert_eq!(baseline_status, StatusCode::OK);
    assert_eq!(status, baseline_status);
    assert_eq!(body, baseline);
}

#[tokio::test]
async fn test_unreachable_store_does_not_stall_full_quiz() {
    let store = Arc::new(FakeStore::slow_and_failing(Duration::from_millis(100)));
    let app = common::create_test_app(FakeModel::new(Behavior::Valid), Some(store.clone()));

    let started = Instant::now();
    let (status, body) = post_json(
        &app,
        "/api/v1/questions/generate-quiz",
        json!({ "subject": "Physics", "mode": "full" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 30);
    assert!(questions.iter().all(|q| q["id"].is_null()));
    assert_eq!(store.write_attempts(), 1);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_persisted_questions_get_ids() {
    let store = Arc::new(FakeStore::default());
    let app = common::create_test_app(FakeModel::new(Behavior::Valid), Some(store.clone()));

    let (status, body) = post_json(
        &app,
        "/api/v1/questions/generate-quiz",
        json!({ "subject": "Physics", "mode": "quick" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 5);
    assert_eq!(ids[0], "000000000000000000000001");

    let written = store.written.lock().unwrap();
    assert_eq!(written.len(), 5);
    assert_eq!(written[4].id.as_deref(), Some(ids[4]));
}

#[tokio::test]
async fn test_generate_explanation() {
    let model = FakeModel::new(Behavior::Text("Because F = ma.".into()));
    let app = common::create_test_app(model.clone(), None);

    let (status, body) = post_json(
        &app,
        "/api/v1/questions/generate-explanation",
        json!({
            "question": "Newton's second law?",
            "options": ["F = ma", "E = mc^2", "V = IR", "PV = nRT"],
            "correctAnswer": "F = ma",
            "userAnswer": "V = IR"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["explanation"], "Because F = ma.");
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_generate_explanation_never_fails() {
    let model = FakeModel::new(Behavior::Valid);
    let app = common::create_test_app(model.clone(), None);

    let (status, body) = post_json(
        &app,
        "/api/v1/questions/generate-explanation",
        json!({ "question": "Incomplete" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["explanation"], "Missing required question data.");

    let (status, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/v1/questions/generate-explanation")
            .header("content-type", "application/json")
            .body(Body::from("not json at all"))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["explanation"], "Missing required question data.");
    assert_eq!(model.calls(), 0);

    let app = common::create_test_app(FakeModel::new(Behavior::Timeout), None);
    let (status, body) = post_json(
        &app,
        "/api/v1/questions/generate-explanation",
        json!({
            "question": "Newton's second law?",
            "options": ["F = ma", "E = mc^2", "V = IR", "PV = nRT"],
            "correctAnswer": "F = ma"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["explanation"], "Explanation not available at the moment.");
}

#[tokio::test]
async fn test_record_progress() {
    let app = common::create_test_app(FakeModel::new(Behavior::Valid), None);

    let (status, body) = post_json(
        &app,
        "/api/v1/questions/record-progress",
        json!({ "questionId": "65f1c2a9e4b0a1b2c3d4e5f6", "isCorrect": true, "isBookmarked": false }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "status": "success", "message": "Progress recorded (demo mode)" })
    );

    let (status, _) = post_json(
        &app,
        "/api/v1/questions/record-progress",
        json!({ "questionId": "", "isCorrect": true, "isBookmarked": false }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &app,
        "/api/v1/questions/record-progress",
        json!({ "questionId": "abc" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_topics() {
    let app = common::create_test_app(FakeModel::new(Behavior::Valid), None);

    let (status, body) = get(&app, "/api/v1/questions/topics?subject=Physics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject"], "Physics");
    let topics = body["topics"].as_array().unwrap();
    assert_eq!(topics.len(), 15);
    assert!(topics.contains(&json!("Kinematics")));

    let (status, body) = get(&app, "/api/v1/questions/topics?subject=Biology").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "subject": "Biology", "topics": [] }));

    let (status, body) = get(&app, "/api/v1/questions/topics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["topics"], json!([]));
}

#[tokio::test]
async fn test_solve_text_doubt() {
    let model = FakeModel::new(Behavior::Text("Step 1: draw a free body diagram.".into()));
    let app = common::create_test_app(model.clone(), None);

    let (status, body) = post_json(
        &app,
        "/api/v1/solutions/solve",
        json!({ "query": "A block slides down a frictionless incline..." }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["original_query"], "A block slides down a frictionless incline...");
    assert_eq!(body["solution"], "Step 1: draw a free body diagram.");

    let (status, _) = post_json(&app, "/api/v1/solutions/solve", json!({ "query": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(model.calls(), 1);
}
