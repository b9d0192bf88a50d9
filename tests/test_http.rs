//! End-to-end tests driving the router with `tower::ServiceExt::oneshot`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use nutriscan::classifier::{Classifier, Condition, FeatureRecord, Prediction};
use nutriscan::config::Config;
use nutriscan::error::AdapterError;
use nutriscan::graph;
use nutriscan::http::{AppState, ArtifactInfo, build_router};
use nutriscan::recommend::NO_CLEAR_RECOMMENDATION;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn shipped_config() -> Config {
    Config::test_default(Path::new("data"))
}

fn shipped_app() -> Router {
    let config = shipped_config();
    let state = AppState::load(&config).expect("shipped artifacts load");
    build_router(state, &config.http)
}

fn app_with_classifier(config: &Config, classifier: Arc<dyn Classifier>) -> Router {
    let g = graph::load(&config.artifacts.graph).unwrap();
    let state = AppState::new(config, Arc::new(g.graph), classifier, ArtifactInfo::default());
    build_router(state, &config.http)
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn diabetic_record() -> Value {
    json!({
        "age": 55, "gender": "Male", "bmi": 33, "hbA1c": 8.5,
        "blood_glucose_level": 240, "hemoglobin": 14, "insulin": 20,
        "triglycerides": 200, "hematocrit": 42, "red_blood_cells": 4.8,
        "smoking_history": "former"
    })
}

struct Failing;

impl Classifier for Failing {
    fn predict(&self, _record: &FeatureRecord) -> Result<Prediction, AdapterError> {
        Err(AdapterError::Schema("incompatible feature row".into()))
    }

    fn backend_type(&self) -> &str {
        "failing"
    }
}

struct Slow;

impl Classifier for Slow {
    fn predict(&self, _record: &FeatureRecord) -> Result<Prediction, AdapterError> {
        std::thread::sleep(Duration::from_millis(300));
        Ok(Prediction { condition: Condition::Healthy, probabilities: None })
    }

    fn backend_type(&self) -> &str {
        "slow"
    }
}

// ── /recommend ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn recommend_top_one() {
    let (status, body) = send(
        shipped_app(),
        "POST",
        "/recommend",
        Some(json!({"input": ["Diabetes", "smokes"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"recommendations": ["LowSugarDiet"]}));
}

#[tokio::test]
async fn recommend_top_k_from_request() {
    let (status, body) = send(
        shipped_app(),
        "POST",
        "/recommend",
        Some(json!({"input": ["Anemia", "vegetarian", "skips_breakfast"], "top_k": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"recommendations": ["IronRichDiet", "BalancedDiet", "RegularMealSchedule"]})
    );
}

#[tokio::test]
async fn recommend_unknown_tokens_sentinel() {
    let (status, body) = send(
        shipped_app(),
        "POST",
        "/recommend",
        Some(json!({"input": ["UnknownToken", "AlsoUnknown"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"recommendations": [NO_CLEAR_RECOMMENDATION]}));
}

#[tokio::test]
async fn recommend_validation_errors() {
    for bad in [
        json!({"input": "Diabetes"}),
        json!({"input": ["Diabetes"]}),
        json!({"other": []}),
        json!({"input": ["Diabetes", "smokes"], "top_k": 0}),
    ] {
        let (status, body) = send(shipped_app(), "POST", "/recommend", Some(bad.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {bad}");
        assert_eq!(body["error"], "validation");
    }
}

#[tokio::test]
async fn malformed_json_is_client_error() {
    let req = Request::post("/recommend")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = shipped_app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ── /predict ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn predict_returns_label_and_percentages() {
    let (status, body) = send(shipped_app(), "POST", "/predict", Some(diabetic_record())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["condition"], "Diabetes");

    let probs = body["probabilities"].as_object().unwrap();
    assert_eq!(probs.len(), 4);
    for label in ["Healthy", "Diabetes", "Anemia", "Both"] {
        assert!(probs.contains_key(label), "missing {label}");
    }
    let total: f64 = probs.values().map(|v| v.as_f64().unwrap()).sum();
    assert!((total - 100.0).abs() <= 0.02, "total was {total}");
}

#[tokio::test]
async fn predict_without_probabilities_when_disabled() {
    let mut config = shipped_config();
    config.classifier.include_probabilities = false;
    let state = AppState::load(&config).unwrap();
    let app = build_router(state, &config.http);

    let (status, body) = send(app, "POST", "/predict", Some(diabetic_record())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("probabilities").is_none());
    assert!(body["condition"].is_string());
}

#[tokio::test]
async fn predict_missing_field_named() {
    let mut record = diabetic_record();
    record.as_object_mut().unwrap().remove("hematocrit");
    let (status, body) = send(shipped_app(), "POST", "/predict", Some(record)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "missing field: hematocrit");
}

#[tokio::test]
async fn classifier_failure_is_server_error_and_service_survives() {
    let config = shipped_config();
    let app = app_with_classifier(&config, Arc::new(Failing));

    let (status, body) = send(app.clone(), "POST", "/predict", Some(diabetic_record())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "classifier");

    let (status, _) = send(app, "GET", "/ping", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn overflowing_record_is_server_error() {
    let mut record = diabetic_record();
    record["hbA1c"] = json!(-1.7e308);
    let (status, body) = send(shipped_app(), "POST", "/predict", Some(record)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "classifier");
    assert!(body.get("probabilities").is_none());
}

#[tokio::test]
async fn slow_classifier_times_out() {
    let mut config = shipped_config();
    config.http.request_timeout = Duration::from_millis(20);
    let app = app_with_classifier(&config, Arc::new(Slow));

    let (status, body) = send(app, "POST", "/predict", Some(diabetic_record())).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"], "timeout");
}

// ── /ping and CORS ────────────────────────────────────────────────────────────

#[tokio::test]
async fn ping_reports_artifacts() {
    let (status, body) = send(shipped_app(), "GET", "/ping", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "connected");
    assert_eq!(body["message"]["message"], "service is active");
    assert_eq!(body["model"]["backend"], "softmax");
    assert_eq!(body["graph"]["fingerprint"].as_str().unwrap().len(), 64);
    assert!(body["graph"]["nodes"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let mut config = shipped_config();
    config.http.cors_origins = vec!["https://front.example".into()];
    config.http.cors_credentials = true;
    let state = AppState::load(&config).unwrap();
    let app = build_router(state, &config.http);

    let req = Request::builder()
        .method("OPTIONS")
        .uri("/recommend")
        .header(header::ORIGIN, "https://front.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let headers = resp.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://front.example");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

    let req = Request::builder()
        .method("OPTIONS")
        .uri("/recommend")
        .header(header::ORIGIN, "https://elsewhere.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn wildcard_origin_allows_any_without_credentials() {
    let mut config = shipped_config();
    config.http.cors_origins = vec!["*".into()];
    config.http.cors_credentials = true;
    let state = AppState::load(&config).unwrap();
    let app = build_router(state, &config.http);

    let req = Request::builder()
        .method("OPTIONS")
        .uri("/recommend")
        .header(header::ORIGIN, "https://anywhere.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let headers = resp.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
}
