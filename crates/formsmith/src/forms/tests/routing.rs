use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::forms::router::{submit_handler, update_handler};
use crate::forms::FormService;

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("body encodes")))
        .expect("request builds")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn create_route_returns_created_form() {
    let (service, _, _) = build_service();
    let router = form_router_with_service(service);

    let draft = serde_json::to_value(quiz_draft()).expect("draft encodes");
    let response = router
        .oneshot(json_request("POST", "/api/forms", draft))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert!(payload
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .starts_with("form-"));
    assert_eq!(payload["questions"][2]["data"]["questions"][0]["correct"], json!(1));
}

#[tokio::test]
async fn undecodable_body_is_a_json_bad_request() {
    let (service, _, _) = build_service();
    let router = form_router_with_service(service);

    let body = json!({
        "title": "Essay",
        "questions": [{ "id": "q1", "type": "essay", "data": {} }]
    });
    let response = router
        .oneshot(json_request("POST", "/api/forms", body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    let message = payload["error"].as_str().unwrap_or_default();
    assert!(message.starts_with("invalid request body"), "{message}");
}

#[tokio::test]
async fn create_route_rejects_blank_title() {
    let (service, _, _) = build_service();
    let router = form_router_with_service(service);

    let response = router
        .oneshot(json_request("POST", "/api/forms", json!({ "title": " " })))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], json!("form title is required"));
}

#[tokio::test]
async fn submit_route_returns_receipt() {
    let (service, _, _) = build_service();
    let form = service.create_form(quiz_draft()).expect("form created");
    let router = form_router_with_service(service);

    let body = serde_json::to_value(submission("Ana", half_answers())).expect("encodes");
    let response = router
        .oneshot(json_request(
            "POST",
            &format!("/api/forms/{}/responses", form.id),
            body,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["score"], json!(3.0));
    assert_eq!(payload["maxScore"], json!(6.0));
    assert_eq!(payload["percentage"], json!(50));
}

#[tokio::test]
async fn submit_handler_maps_missing_form_to_not_found() {
    let (service, _, _) = build_service();

    let response = submit_handler::<MemoryRepository, RecordingNotifier>(
        State(Arc::new(service)),
        Path("form-missing".to_string()),
        Ok(axum::Json(submission("Ana", perfect_answers()))),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submit_handler_maps_duplicate_to_conflict() {
    let (service, _, _) = build_service();
    let form = service.create_form(quiz_draft()).expect("form created");
    let service = Arc::new(service);
    service
        .submit(&form.id, submission("Ana", perfect_answers()))
        .expect("first submission accepted");

    let response = submit_handler::<MemoryRepository, RecordingNotifier>(
        State(service),
        Path(form.id.0.clone()),
        Ok(axum::Json(submission("Ana", perfect_answers()))),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn submit_handler_returns_internal_error_on_repository_failure() {
    let service = Arc::new(FormService::new(
        Arc::new(UnavailableRepository),
        Arc::new(RecordingNotifier::default()),
    ));

    let response = submit_handler::<UnavailableRepository, RecordingNotifier>(
        State(service),
        Path("form-000001".to_string()),
        Ok(axum::Json(submission("Ana", perfect_answers()))),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn update_handler_maps_locked_questions_to_conflict() {
    let (service, _, _) = build_service();
    let form = service.create_form(quiz_draft()).expect("form created");
    service
        .submit(&form.id, submission("Ana", perfect_answers()))
        .expect("submission accepted");

    let mut draft = quiz_draft();
    draft.questions.truncate(1);
    let response = update_handler::<MemoryRepository, RecordingNotifier>(
        State(Arc::new(service)),
        Path(form.id.0.clone()),
        Ok(axum::Json(draft)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn preview_route_accepts_wrapped_and_bare_answers() {
    let (service, _, _) = build_service();
    let form = service.create_form(quiz_draft()).expect("form created");
    let router = form_router_with_service(service);
    let uri = format!("/api/forms/{}/preview", form.id);

    let wrapped = router
        .clone()
        .oneshot(json_request(
            "POST",
            &uri,
            json!({ "answers": Value::Object(perfect_answers()) }),
        ))
        .await
        .expect("route executes");
    assert_eq!(wrapped.status(), StatusCode::OK);
    assert_eq!(read_json_body(wrapped).await["percentage"], json!(100));

    let bare = router
        .oneshot(json_request("POST", &uri, Value::Object(half_answers())))
        .await
        .expect("route executes");
    assert_eq!(bare.status(), StatusCode::OK);
    assert_eq!(read_json_body(bare).await["percentage"], json!(50));
}

#[tokio::test]
async fn static_routes_are_not_captured_as_form_ids() {
    let (service, _, _) = build_service();
    let form = service.create_form(quiz_draft()).expect("form created");
    service
        .submit(&form.id, submission("Ana", perfect_answers()))
        .expect("submission accepted");
    let router = form_router_with_service(service);

    let all = router
        .clone()
        .oneshot(get_request("/api/forms/responses/all"))
        .await
        .expect("route executes");
    assert_eq!(all.status(), StatusCode::OK);
    let listing = read_json_body(all).await;
    assert_eq!(listing[0]["formTitle"], json!("Mixed archetypes"));

    let global = router
        .oneshot(get_request("/api/forms/analytics/global"))
        .await
        .expect("route executes");
    assert_eq!(global.status(), StatusCode::OK);
    let analytics = read_json_body(global).await;
    assert_eq!(analytics["totalResponses"], json!(1));
    assert_eq!(analytics["recentResponses"], json!(1));
}

#[tokio::test]
async fn export_route_serves_csv() {
    let (service, _, _) = build_service();
    let form = service.create_form(quiz_draft()).expect("form created");
    service
        .submit(&form.id, submission("Ana", perfect_answers()))
        .expect("submission accepted");
    let router = form_router_with_service(service);

    let response = router
        .oneshot(get_request(&format!("/api/forms/{}/export.csv", form.id)))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("text/csv; charset=utf-8")
    );
    let body = read_text_body(response).await;
    assert!(body.contains("\"Ana\",\"ana@example.com\""));
}

#[tokio::test]
async fn review_route_returns_breakdown() {
    let (service, _, _) = build_service();
    let form = service.create_form(quiz_draft()).expect("form created");
    let receipt = service
        .submit(&form.id, submission("Ana", half_answers()))
        .expect("submission accepted");
    let router = form_router_with_service(service);

    let response = router
        .oneshot(get_request(&format!(
            "/api/forms/{}/responses/{}",
            form.id, receipt.id
        )))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["percentage"], json!(50));
    assert_eq!(payload["performance"], json!("keep_practicing"));
    assert_eq!(payload["questions"][1]["earned"], json!(1.5));
}

#[tokio::test]
async fn delete_route_then_get_is_not_found() {
    let (service, _, _) = build_service();
    let form = service.create_form(quiz_draft()).expect("form created");
    let router = form_router_with_service(service);
    let uri = format!("/api/forms/{}", form.id);

    let deleted = router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(&uri)
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(deleted.status(), StatusCode::OK);

    let fetched = router
        .oneshot(get_request(&uri))
        .await
        .expect("route executes");
    assert_eq!(fetched.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn distractor_route_returns_suggestions() {
    let (service, _, _) = build_service();
    let router = form_router_with_service(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/forms/generate-distractors",
            json!({ "text": "The ___ sat", "correctAnswers": ["cat"] }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["distractors"], json!([["cats", "ca", "incorrect"]]));
}
