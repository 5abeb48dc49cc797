//! HTTP-level tests for `/api/rest`: authorization, validation, routing, fallback listing,
//! scope isolation, and the internal-error contract.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use rest_core::config::builtin_config;
use rest_core::error::ServiceError;
use rest_core::extractors::API_KEY_HEADER;
use rest_core::model::{Agent, Resource};
use rest_core::routing::{command_table, payload_only, RoutingTable, Verb};
use rest_core::service::{ConfigStore, ObjectStore, RestService};
use rest_core::{app, Access, AppState, ApiKeyAuthorizer, Dispatcher, PolymorphicSchema, Settings};
use serde_json::{json, Value};
use tower::ServiceExt;

const RED_KEY: &str = "red-test-key";
const BLUE_KEY: &str = "blue-test-key";

fn settings() -> Settings {
    Settings {
        api_key_red: RED_KEY.into(),
        api_key_blue: BLUE_KEY.into(),
        ..Settings::default()
    }
}

fn schema() -> PolymorphicSchema {
    PolymorphicSchema::resolve(builtin_config().expect("embedded schema")).expect("schema resolves")
}

fn build_test_app() -> axum::Router {
    let settings = settings();
    let state = AppState::from_settings(&settings, schema()).expect("state builds");
    app(state, &settings)
}

/// App over a caller-supplied store, for tests that need entities no route can create.
fn app_over(store: Arc<ObjectStore>) -> axum::Router {
    let schema = Arc::new(schema());
    let rest = Arc::new(RestService::new(store.clone(), ConfigStore::default()));
    let routes = command_table(rest, &schema).expect("command table builds");
    let dispatcher = Dispatcher::new(schema, routes, store);
    let state = AppState::new(Arc::new(ApiKeyAuthorizer::new(RED_KEY, BLUE_KEY)), Arc::new(dispatcher));
    app(state, &settings())
}

fn request(method: Method, key: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri("/api/rest")
        .header("content-type", "application/json");
    if let Some(key) = key {
        builder = builder.header(API_KEY_HEADER, key);
    }
    builder.body(Body::from(body.to_string())).expect("request builds")
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("router answers");
    let status = resp.status();
    let bytes = resp.into_body().collect().await.expect("body reads").to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, body)
}

async fn call(app: &axum::Router, method: Method, key: &str, body: Value) -> (StatusCode, Value) {
    send(app, request(method, Some(key), &body.to_string())).await
}

// ── Authorization ──────────────────────────────────────────────

#[tokio::test]
async fn missing_or_wrong_key_is_401_before_decoding() {
    let app = build_test_app();
    let (status, body) = send(&app, request(Method::GET, None, "not even json")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], json!("unauthorized"));

    let (status, _) = send(&app, request(Method::GET, Some("guess"), r#"{"index":"agents"}"#)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ancillary_routes_need_no_key() {
    let app = build_test_app();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let req = Request::builder().uri("/version").body(Body::empty()).unwrap();
    let (_, body) = send(&app, req).await;
    assert_eq!(body["name"], json!("rest-core"));
}

// ── Body and schema validation ─────────────────────────────────

#[tokio::test]
async fn malformed_and_empty_bodies() {
    let app = build_test_app();
    let (status, body) = send(&app, request(Method::POST, Some(RED_KEY), "{oops")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"_schema": ["Invalid JSON body."]}));

    let (status, body) = send(&app, request(Method::POST, Some(RED_KEY), "[]")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"_schema": ["Invalid input type."]}));

    let (status, body) = send(&app, request(Method::GET, Some(RED_KEY), "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"index": ["Missing data for required field."]}));
}

#[tokio::test]
async fn unknown_kind_is_400_not_an_empty_list() {
    let app = build_test_app();
    let (status, body) = call(&app, Method::GET, RED_KEY, json!({"index": "unknown_kind"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"index": ["Unsupported value: unknown_kind."]}));
}

#[tokio::test]
async fn every_violated_field_is_reported() {
    let app = build_test_app();
    let (status, body) = call(
        &app,
        Method::PUT,
        RED_KEY,
        json!({
            "index": "abilities",
            "ability_id": "a1",
            "executors": [{"platform": "linux", "command": 5}],
            "privilege": "Root",
            "colour": "red"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["executors.0.name"], json!(["Missing data for required field."]));
    assert_eq!(body["executors.0.command"], json!(["Not a valid string."]));
    assert_eq!(body["privilege"], json!(["Must be one of: User, Elevated."]));
    assert_eq!(body["colour"], json!(["Unknown field."]));
}

// ── Routing and fallback ───────────────────────────────────────

#[tokio::test]
async fn schedule_put_then_listed() {
    let app = build_test_app();
    let (status, created) = call(
        &app,
        Method::PUT,
        RED_KEY,
        json!({"index": "schedule", "id": "s1", "cron": "* * * * *"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["index"], json!("schedule"));
    assert_eq!(created["access"], json!("red"));

    let (status, listed) = call(&app, Method::GET, RED_KEY, json!({"index": "schedule"})).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = listed.as_array().unwrap().iter().map(|s| s["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["s1"]);
}

#[tokio::test]
async fn task_post_reaches_the_task_handler() {
    let app = build_test_app();
    call(
        &app,
        Method::PUT,
        RED_KEY,
        json!({
            "index": "abilities",
            "ability_id": "a1",
            "name": "whoami",
            "executors": [{"name": "sh", "platform": "linux", "command": "whoami"}]
        }),
    )
    .await;
    // No agent p1 has checked in, so the task handler answers 404; a listing would have been 200 [].
    let (status, _) = call(&app, Method::POST, RED_KEY, json!({"index": "task", "ability_id": "a1", "paw": "p1"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn scope_isolation_holds_regardless_of_filters() {
    let app = build_test_app();
    for (key, id) in [(RED_KEY, "red-adv"), (BLUE_KEY, "blue-adv")] {
        let (status, _) = call(&app, Method::PUT, key, json!({"index": "adversaries", "adversary_id": id})).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, seen) = call(
        &app,
        Method::GET,
        BLUE_KEY,
        json!({"index": "adversaries", "access": "red", "adversary_id": "red-adv"}),
    )
    .await;
    assert_eq!(seen, json!([]));
    let (_, seen) = call(&app, Method::GET, BLUE_KEY, json!({"index": "adversaries"})).await;
    let ids: Vec<&str> = seen.as_array().unwrap().iter().map(|a| a["adversary_id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["blue-adv"]);
}

#[tokio::test]
async fn seeded_app_entities_are_visible_to_both_teams() {
    let app = build_test_app();
    for key in [RED_KEY, BLUE_KEY] {
        let (_, planners) = call(&app, Method::GET, key, json!({"index": "planners"})).await;
        assert_eq!(planners[0]["id"], json!("atomic"));
        assert_eq!(planners[0]["index"], json!("planners"));
    }
}

#[tokio::test]
async fn delete_is_idempotent_over_http() {
    let app = build_test_app();
    call(&app, Method::PUT, RED_KEY, json!({"index": "adversaries", "adversary_id": "adv"})).await;
    for _ in 0..2 {
        let (status, body) = call(&app, Method::DELETE, RED_KEY, json!({"index": "adversaries", "adversary_id": "adv"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("Delete action completed"));
    }
    let (_, listed) = call(&app, Method::GET, RED_KEY, json!({"index": "adversaries"})).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn shared_planner_cannot_be_retagged() {
    let app = build_test_app();
    for access in ["blue", "red"] {
        let (status, body) = call(&app, Method::PUT, RED_KEY, json!({"index": "planners", "id": "atomic", "access": access})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["access"].is_array());
    }
    for key in [RED_KEY, BLUE_KEY] {
        let (_, planners) = call(&app, Method::GET, key, json!({"index": "planners"})).await;
        assert_eq!(planners[0]["access"], json!("app"));
    }
}

#[tokio::test]
async fn other_teams_agent_cannot_be_updated() {
    let store = Arc::new(ObjectStore::seeded().unwrap());
    store.upsert(Resource::Agent(Agent::new("blue-paw", Access::Blue))).unwrap();
    let app = app_over(store);

    let (status, _) = call(
        &app,
        Method::PUT,
        RED_KEY,
        json!({"index": "agents", "paw": "blue-paw", "access": "red", "host": "stolen"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, agents) = call(&app, Method::GET, BLUE_KEY, json!({"index": "agents"})).await;
    assert_eq!(agents[0]["paw"], json!("blue-paw"));
    assert_eq!(agents[0]["access"], json!("blue"));
    assert_eq!(agents[0]["host"], json!(""));

    let (status, body) = call(&app, Method::PUT, BLUE_KEY, json!({"index": "agents", "paw": "blue-paw", "host": "h1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["host"], json!("h1"));
}

#[tokio::test]
async fn cross_team_delete_answers_the_same_but_keeps_the_entity() {
    let app = build_test_app();
    call(&app, Method::PUT, BLUE_KEY, json!({"index": "adversaries", "adversary_id": "blue-adv"})).await;
    let (status, body) = call(&app, Method::DELETE, RED_KEY, json!({"index": "adversaries", "adversary_id": "blue-adv"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("Delete action completed"));
    let (_, listed) = call(&app, Method::GET, BLUE_KEY, json!({"index": "adversaries"})).await;
    assert_eq!(listed[0]["adversary_id"], json!("blue-adv"));
}

#[tokio::test]
async fn listing_filter_on_server_field_is_rejected() {
    let app = build_test_app();
    let (status, body) = call(&app, Method::GET, RED_KEY, json!({"index": "operations", "start": "2024-01-01T00:00:00Z"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"start": ["Unknown field."]}));
}

#[tokio::test]
async fn unsupported_method_is_405() {
    let app = build_test_app();
    let (status, _) = send(&app, request(Method::PATCH, Some(RED_KEY), r#"{"index":"agents"}"#)).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

// ── Limits and internal errors ─────────────────────────────────

#[tokio::test]
async fn oversized_body_is_413() {
    let settings = Settings {
        body_limit: 64,
        ..settings()
    };
    let state = AppState::from_settings(&settings, schema()).unwrap();
    let app = app(state, &settings);
    let big = json!({"index": "sources", "name": "x".repeat(256)}).to_string();
    let (status, _) = send(&app, request(Method::PUT, Some(RED_KEY), &big)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn handler_panic_is_500_with_correlation_id() {
    let schema = Arc::new(schema());
    let routes = RoutingTable::builder()
        .register(
            Verb::Post,
            "contact",
            payload_only(&["contact"], |_p| async {
                if true {
                    panic!("handler exploded");
                }
                Ok::<_, ServiceError>(json!(null))
            }),
        )
        .unwrap()
        .build(&schema)
        .unwrap();
    let dispatcher = Dispatcher::new(schema, routes, Arc::new(ObjectStore::new()));
    let state = AppState::new(Arc::new(ApiKeyAuthorizer::new(RED_KEY, BLUE_KEY)), Arc::new(dispatcher));
    let app = app(state, &settings());

    let (status, body) = call(&app, Method::POST, RED_KEY, json!({"index": "contact", "contact": "HTTP"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], json!("internal_error"));
    let id = body["error"]["details"]["correlation_id"].as_str().unwrap();
    assert!(uuid_like(id));
    assert!(!body.to_string().contains("exploded"));
}

fn uuid_like(s: &str) -> bool {
    s.len() == 36 && s.chars().filter(|c| *c == '-').count() == 4
}
