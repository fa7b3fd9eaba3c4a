use api_rest::{router, AppState};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use triage_core::{CaseStore, CoreConfig, Ruleset, Scorer, TriageService};

const KEY: &str = "test-key";

fn app() -> Router {
    let store = CaseStore::in_memory(Arc::new(Scorer::default()));
    router(AppState::new(TriageService::new(store), KEY))
}

fn request(method: &str, uri: &str, actor: Option<(&str, &str)>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-api-key", KEY);
    if let Some((id, role)) = actor {
        builder = builder.header("x-actor-id", id).header("x-actor-role", role);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

const PATIENT: Option<(&str, &str)> = Some(("p1", "reporter"));
const DOCTOR: Option<(&str, &str)> = Some(("dr-1", "reviewer"));

#[tokio::test]
async fn health_needs_no_credentials() {
    let app = app();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn missing_or_wrong_api_key_is_unauthorized() {
    let app = app();
    let req = Request::builder()
        .uri("/cases/mine")
        .header("x-actor-id", "p1")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, req).await.0, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/cases/mine")
        .header("x-api-key", "wrong")
        .header("x-actor-id", "p1")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, req).await.0, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, request("GET", "/cases/mine", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reporter_submission_hides_score() {
    let app = app();
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/cases",
            PATIENT,
            Some(json!({"text": "Patient cannot breathe", "location": "Rampur"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["risk_tier"], "HIGH");
    assert_eq!(body["recommendation"], "seek immediate in-person care");
    assert_eq!(body["location"], "Rampur");
    assert!(body.get("detail").is_none());
    assert!(!body.to_string().contains("\"score\""));
}

#[tokio::test]
async fn reviewer_submission_includes_explanation() {
    let app = app();
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/cases",
            DOCTOR,
            Some(json!({"text": "severe chest pain", "subject_ref": "p9"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["detail"]["subject_ref"], "p9");
    assert_eq!(body["detail"]["score"], 11);
    assert_eq!(body["risk_tier"], "MODERATE");
    assert_eq!(body["detail"]["score_result"]["explanation"]["location"], "Unknown");
}

#[tokio::test]
async fn empty_text_is_bad_request() {
    let app = app();
    let (status, _) = send(
        &app,
        request("POST", "/cases", PATIENT, Some(json!({"text": "   "}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_or_malformed_text_is_bad_request() {
    let app = app();
    for body in [json!({"location": "Rampur"}), json!({"text": null}), json!({"text": 5})] {
        let (status, _) = send(&app, request("POST", "/cases", PATIENT, Some(body.clone()))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    }

    let req = Request::builder()
        .method("POST")
        .uri("/cases")
        .header("x-api-key", KEY)
        .header("x-actor-id", "p1")
        .header("content-type", "application/json")
        .body(Body::from("not json"))
        .unwrap();
    assert_eq!(send(&app, req).await.0, StatusCode::BAD_REQUEST);

    let (_, mine) = send(&app, request("GET", "/cases/mine", PATIENT, None)).await;
    assert!(mine["cases"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn override_without_tier_is_bad_request() {
    let app = app();
    let (_, created) = send(
        &app,
        request("POST", "/cases", PATIENT, Some(json!({"text": "cough"}))),
    )
    .await;
    let uri = format!("/cases/{}/override", created["case_id"].as_str().unwrap());
    let (status, _) = send(&app, request("PUT", &uri, DOCTOR, Some(json!({})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reporter_cannot_submit_for_someone_else() {
    let app = app();
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/cases",
            PATIENT,
            Some(json!({"text": "cough", "subject_ref": "p2"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reviewer_routes_are_forbidden_to_reporters() {
    let app = app();
    for (method, uri, body) in [
        ("GET", "/cases", None),
        ("GET", "/analytics", None),
        ("GET", "/overrides", None),
        ("GET", "/ruleset", None),
        ("POST", "/score", Some(json!({"text": "fever"}))),
    ] {
        let (status, _) = send(&app, request(method, uri, PATIENT, body)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
    }
}

#[tokio::test]
async fn reporter_only_sees_own_cases() {
    let app = app();
    let (_, created) = send(
        &app,
        request("POST", "/cases", PATIENT, Some(json!({"text": "cough"}))),
    )
    .await;
    let id = created["case_id"].as_str().unwrap().to_owned();

    let (status, mine) = send(&app, request("GET", "/cases/mine", PATIENT, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["cases"].as_array().unwrap().len(), 1);

    let other = Some(("p2", "reporter"));
    let (status, theirs) = send(&app, request("GET", "/cases/mine", other, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(theirs["cases"].as_array().unwrap().is_empty());

    let uri = format!("/cases/{id}");
    assert_eq!(send(&app, request("GET", &uri, PATIENT, None)).await.0, StatusCode::OK);
    assert_eq!(send(&app, request("GET", &uri, other, None)).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_and_unknown_case_ids() {
    let app = app();
    let (status, _) = send(&app, request("GET", "/cases/not-a-uuid", DOCTOR, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        request("GET", "/cases/0123456789abcdef0123456789abcdef", DOCTOR, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn override_flow_updates_history_and_analytics() {
    let app = app();
    let (_, created) = send(
        &app,
        request("POST", "/cases", PATIENT, Some(json!({"text": "mild cold", "location": "Rampur"}))),
    )
    .await;
    let id = created["case_id"].as_str().unwrap().to_owned();
    let uri = format!("/cases/{id}/override");

    let (status, _) = send(&app, request("PUT", &uri, PATIENT, Some(json!({"risk_tier": "HIGH"})))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, request("PUT", &uri, DOCTOR, Some(json!({"risk_tier": "URGENT"})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, ack) = send(&app, request("PUT", &uri, DOCTOR, Some(json!({"risk_tier": "high"})))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["risk_tier"], "HIGH");
    assert_eq!(ack["previous_override"], Value::Null);

    let (_, ack) = send(&app, request("PUT", &uri, DOCTOR, Some(json!({"risk_tier": "MODERATE"})))).await;
    assert_eq!(ack["previous_override"], "HIGH");

    let (_, case) = send(&app, request("GET", &format!("/cases/{id}"), DOCTOR, None)).await;
    assert_eq!(case["risk_tier"], "LOW");
    assert_eq!(case["detail"]["doctor_override"], "MODERATE");

    let (_, history) = send(&app, request("GET", "/overrides", DOCTOR, None)).await;
    assert_eq!(history["overrides"].as_array().unwrap().len(), 2);
    assert_eq!(history["overrides"][0]["reviewer"], "dr-1");

    let (_, summary) = send(&app, request("GET", "/analytics", DOCTOR, None)).await;
    assert_eq!(summary["total_cases"], 1);
    assert_eq!(summary["risk_distribution"]["LOW"], 1);
    assert_eq!(summary["risk_distribution"]["HIGH"], 0);
    assert_eq!(summary["location_distribution"]["Rampur"], 1);
    assert_eq!(summary["override_distribution"]["MODERATE"], 1);
}

#[tokio::test]
async fn list_filters_by_tier_and_rejects_unknown_tier() {
    let app = app();
    for text in ["stroke and unconscious", "cough", "cold"] {
        send(&app, request("POST", "/cases", PATIENT, Some(json!({"text": text})))).await;
    }

    let (status, body) = send(&app, request("GET", "/cases?risk_tier=LOW", DOCTOR, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cases"].as_array().unwrap().len(), 2);

    let (status, _) = send(&app, request("GET", "/cases?risk_tier=urgent", DOCTOR, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn preview_and_ruleset_for_reviewers() {
    let app = app();
    let (status, body) = send(
        &app,
        request("POST", "/score", DOCTOR, Some(json!({"text": "fever for 3 days"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 3);
    assert_eq!(body["duration"], "3 days");
    assert_eq!(body["risk_tier"], "LOW");

    let (_, list) = send(&app, request("GET", "/cases", DOCTOR, None)).await;
    assert!(list["cases"].as_array().unwrap().is_empty());

    let (status, ruleset) = send(&app, request("GET", "/ruleset", DOCTOR, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ruleset["version"], "v3");
    assert_eq!(ruleset["moderate_threshold"], 10);
    assert_eq!(ruleset["high_threshold"], 20);
}

#[tokio::test]
async fn journal_backed_service_survives_router_rebuild() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let cfg = CoreConfig::new(Some(temp_dir.path().to_path_buf()), Ruleset::current()).unwrap();

    let app = router(AppState::new(cfg.build_service().unwrap(), KEY));
    send(&app, request("POST", "/cases", PATIENT, Some(json!({"text": "cough"})))).await;
    drop(app);

    let app = router(AppState::new(cfg.build_service().unwrap(), KEY));
    let (_, mine) = send(&app, request("GET", "/cases/mine", PATIENT, None)).await;
    assert_eq!(mine["cases"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = app();
    let req = Request::builder()
        .uri("/api-docs/openapi.json")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/cases/{id}/override").is_some());
}
