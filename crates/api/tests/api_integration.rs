//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::config::Config;
use api::routes::applications::AppState;
use application_store::{ApplicationStore, InMemoryApplicationStore};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use domain::ApplicationId;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    setup_with_state().0
}

fn setup_with_state() -> (axum::Router, Arc<AppState<InMemoryApplicationStore>>) {
    let metrics_handle = get_metrics_handle();
    let state = api::create_state(InMemoryApplicationStore::new(), &Config::default());
    let app = api::create_app(state.clone(), metrics_handle);
    (app, state)
}

fn draft_body() -> Value {
    json!({
        "customer": {
            "full_name": "John Doe",
            "date_of_birth": "1990-05-17",
            "id_number": "3174051705900001",
            "email": "john.doe@example.com",
            "phone": "1234567890",
            "address": {
                "street": "1 Main Street",
                "city": "Springfield",
                "zipcode": "12345"
            }
        },
        "collateral": {
            "category": "CAR",
            "brand": "Toyota",
            "variant": "Corolla Cross",
            "manufacturing_year": 2021,
            "is_document_complete": true
        },
        "proposed_loan": { "tenure": 12, "amount": 5000.00 }
    })
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn create_application(app: &axum::Router) -> String {
    let response = app
        .clone()
        .oneshot(post_json("/applications", &draft_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_create_application() {
    let app = setup();

    let response = app
        .oneshot(post_json("/applications", &draft_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["status"], "DRAFT");
    assert!(ApplicationId::parse(json["id"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_create_and_get_application() {
    let app = setup();
    let id = create_application(&app).await;

    let response = app
        .oneshot(get(&format!("/applications/{id}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["id"], id.as_str());
    assert_eq!(json["status"], "DRAFT");
    assert_eq!(json["customer"]["full_name"], "John Doe");
    assert_eq!(json["customer"]["date_of_birth"], "1990-05-17");
    assert_eq!(json["customer"]["address"]["city"], "Springfield");
    assert_eq!(json["collateral"]["category"], "CAR");
    assert_eq!(json["collateral"]["manufacturing_year"], 2021);
    assert_eq!(json["proposed_loan"]["tenure"], 12);
    assert_eq!(json["proposed_loan"]["amount"], 5000.0);
    assert_eq!(json["created_by"], "system");
}

#[tokio::test]
async fn test_invalid_tenure_is_rejected_and_nothing_stored() {
    let (app, state) = setup_with_state();
    let mut body = draft_body();
    body["proposed_loan"]["tenure"] = json!(13);

    let response = app
        .oneshot(post_json("/applications", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["section"], "proposed_loan");
    assert!(json["error"].as_str().unwrap().contains("divisible by 3"));
    assert_eq!(state.service.store().application_count().await, 0);
    assert_eq!(state.service.store().applicant_count().await, 0);
}

#[tokio::test]
async fn test_malformed_body_returns_json_error() {
    let (app, state) = setup_with_state();
    let request = Request::builder()
        .method("POST")
        .uri("/applications")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"customer": {"full_name": "#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()["content-type"],
        "application/json"
    );
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("JSON"));
    assert_eq!(state.service.store().application_count().await, 0);
}

#[tokio::test]
async fn test_missing_content_type_returns_json_error() {
    let app = setup();
    let request = Request::builder()
        .method("POST")
        .uri("/applications")
        .body(Body::from(serde_json::to_string(&draft_body()).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let json = body_json(response).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_sub_cent_amount_round_trips() {
    let app = setup();
    let mut body = draft_body();
    body["proposed_loan"]["amount"] = json!(150.125);

    let response = app
        .clone()
        .oneshot(post_json("/applications", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(get(&format!("/applications/{id}")))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["proposed_loan"]["amount"], 150.125);
}

#[tokio::test]
async fn test_duplicate_id_number_is_conflict() {
    let app = setup();
    create_application(&app).await;

    let response = app
        .oneshot(post_json("/applications", &draft_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_get_nonexistent_application() {
    let app = setup();

    let response = app
        .oneshot(get(&format!("/applications/{}", ApplicationId::new())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_application_id_format() {
    let app = setup();

    let response = app
        .oneshot(get("/applications/not-a-uuid"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_then_cancel_lifecycle() {
    let app = setup();
    let id = create_application(&app).await;

    let response = app
        .clone()
        .oneshot(post_empty(&format!("/applications/{id}/submit")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "success": true }));

    let response = app
        .clone()
        .oneshot(get(&format!("/applications/{id}")))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["status"], "SUBMITTED");

    let response = app
        .clone()
        .oneshot(post_empty(&format!("/applications/{id}/cancel")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get(&format!("/applications/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_audit_view_shows_cancelled_application() {
    let app = setup();
    let id = create_application(&app).await;

    let response = app
        .clone()
        .oneshot(get(&format!("/applications/{id}/audit")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "DRAFT");
    assert_eq!(json["deleted"], false);
    assert!(json["deleted_at"].is_null());

    let request = Request::builder()
        .method("POST")
        .uri(format!("/applications/{id}/cancel"))
        .header("x-actor", "supervisor")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get(&format!("/applications/{id}/audit")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["id"], id.as_str());
    assert_eq!(json["status"], "CANCELLED");
    assert_eq!(json["deleted"], true);
    assert!(json["deleted_at"].is_string());
    assert_eq!(json["created_by"], "system");
    assert_eq!(json["updated_by"], "supervisor");
    assert_eq!(json["customer"]["full_name"], "John Doe");
}

#[tokio::test]
async fn test_audit_view_of_unknown_or_malformed_id() {
    let app = setup();

    let response = app
        .clone()
        .oneshot(get(&format!("/applications/{}/audit", ApplicationId::new())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(get("/applications/not-a-uuid/audit"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_second_submit_is_conflict() {
    let app = setup();
    let id = create_application(&app).await;
    let uri = format!("/applications/{id}/submit");

    app.clone().oneshot(post_empty(&uri)).await.unwrap();
    let response = app.oneshot(post_empty(&uri)).await.unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("not in DRAFT state"));
}

#[tokio::test]
async fn test_cancel_twice_succeeds() {
    let app = setup();
    let id = create_application(&app).await;
    let uri = format!("/applications/{id}/cancel");

    let first = app.clone().oneshot(post_empty(&uri)).await.unwrap();
    let second = app.oneshot(post_empty(&uri)).await.unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cancel_unknown_application_is_conflict() {
    let app = setup();

    let response = app
        .oneshot(post_empty(&format!(
            "/applications/{}/cancel",
            ApplicationId::new()
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_actor_header_is_recorded() {
    let (app, state) = setup_with_state();
    let id = create_application(&app).await;

    let request = Request::builder()
        .method("POST")
        .uri(format!("/applications/{id}/submit"))
        .header("x-actor", "reviewer-42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = state
        .service
        .store()
        .get(ApplicationId::parse(&id).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.audit.created_by, "system");
    assert_eq!(stored.audit.updated_by, "reviewer-42");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    create_application(&app).await;

    let response = app.oneshot(get("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("loan_applications_created_total"));
}
