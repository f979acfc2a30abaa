//! End-to-end tests of the exercises API.
//!
//! Each test starts a stand-in users service and the real exercises server
//! on free local ports, then drives the API over HTTP.

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use pictolearn_exercises::{
    create_router, AppState, Config, ExerciseService, HttpAuthenticator, InMemoryExerciseStore,
};
use serde_json::{json, Value};

/// Helper to find an available port for testing.
fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Serves `router` on a free port and returns its address.
async fn serve(router: Router) -> SocketAddr {
    let addr: SocketAddr = ([127, 0, 0, 1], find_available_port()).into();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    addr
}

/// Stand-in for the users service check-login endpoint.
///
/// `Bearer teacher-<n>` authenticates teacher `n`, `Bearer expired` is
/// rejected with 403, anything else with 401.
async fn check_login(headers: HeaderMap) -> Response {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token {
        Some("expired") => (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Session expired" })),
        )
            .into_response(),
        Some(token) => match token
            .strip_prefix("teacher-")
            .and_then(|id| id.parse::<u64>().ok())
        {
            Some(id) => Json(json!({ "user": { "id": id, "name": "Docente" } })).into_response(),
            None => unauthorized(),
        },
        None => unauthorized(),
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": { "type": "unauthorized", "message": "Invalid token" } })),
    )
        .into_response()
}

/// Starts the users service stand-in and returns its base URL.
async fn spawn_users_service() -> String {
    let router = Router::new().route("/teachers/checkLogin", get(check_login));
    format!("http://{}", serve(router).await)
}

/// Starts the exercises server against `users_service_url` and returns its base URL.
async fn spawn_exercises_server(users_service_url: String) -> String {
    let config = Config {
        users_service_url,
        auth_timeout_seconds: 2,
        ..Config::default()
    };
    let service = ExerciseService::new(
        Arc::new(InMemoryExerciseStore::new()),
        Arc::new(HttpAuthenticator::from_config(&config).expect("Failed to build authenticator")),
    );
    let router = create_router(AppState::new(config, service));
    format!("http://{}", serve(router).await)
}

async fn spawn_stack() -> String {
    let users = spawn_users_service().await;
    spawn_exercises_server(users).await
}

fn exercise_payload(title: &str, network_type: &str) -> Value {
    json!({
        "title": title,
        "category": "hogar",
        "mainImage": format!("{title}.png"),
        "definitionImage": format!("{title}-definicion.png"),
        "definitionText": "objeto de la casa",
        "ampliationImages": [format!("{title}-1.png")],
        "ampliationText": ["se usa todos los dias"],
        "definitionPictogram": format!("{title}-picto.png"),
        "ampliationPictogram": format!("{title}-ampliacion.png"),
        "networkType": network_type,
        "representation": "iconic",
        "language": "ES"
    })
}

async fn create(client: &reqwest::Client, base: &str, token: &str, payload: &Value) -> Value {
    let response = client
        .post(format!("{base}/"))
        .bearer_auth(token)
        .json(payload)
        .send()
        .await
        .expect("Failed to send create request");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    response.json().await.expect("Failed to parse created exercise")
}

// ============================================================================
// Owned Exercise Tests
// ============================================================================

/// Tests create, read, update and delete by the owning teacher.
#[tokio::test]
async fn test_owned_exercise_lifecycle() {
    let base = spawn_stack().await;
    let client = reqwest::Client::new();

    let created = create(&client, &base, "teacher-7", &exercise_payload("mesa", "I-I")).await;
    let id = created["_id"].as_str().expect("Missing _id").to_string();
    assert_eq!(created["title"], "MESA");
    assert_eq!(created["language"], "es");
    assert_eq!(created["teacherId"], "7");

    let fetched: Value = client
        .get(format!("{base}/{id}"))
        .bearer_auth("teacher-7")
        .send()
        .await
        .expect("Failed to get exercise")
        .json()
        .await
        .expect("Failed to parse exercise");
    assert_eq!(fetched, created);

    let owned: Value = client
        .get(format!("{base}/teacher"))
        .bearer_auth("teacher-7")
        .send()
        .await
        .expect("Failed to list owned exercises")
        .json()
        .await
        .expect("Failed to parse listing");
    assert_eq!(owned.as_array().map(Vec::len), Some(1));

    let response = client
        .put(format!("{base}/{id}"))
        .bearer_auth("teacher-7")
        .json(&json!({ "category": "cocina", "closedOrder": 4 }))
        .send()
        .await
        .expect("Failed to update exercise");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let updated: Value = response.json().await.expect("Failed to parse update");
    assert_eq!(updated["category"], "COCINA");
    assert_eq!(updated["closedOrder"], 4);
    assert_eq!(updated["title"], "MESA");

    let response = client
        .delete(format!("{base}/{id}"))
        .bearer_auth("teacher-7")
        .send()
        .await
        .expect("Failed to delete exercise");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let response = client
        .get(format!("{base}/{id}"))
        .bearer_auth("teacher-7")
        .send()
        .await
        .expect("Failed to get deleted exercise");
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

/// Tests that another teacher cannot read, change or delete an exercise.
#[tokio::test]
async fn test_foreign_teacher_is_rejected() {
    let base = spawn_stack().await;
    let client = reqwest::Client::new();

    let created = create(&client, &base, "teacher-7", &exercise_payload("silla", "I-I")).await;
    let id = created["_id"].as_str().expect("Missing _id").to_string();

    let requests = [
        client.get(format!("{base}/{id}")),
        client
            .put(format!("{base}/{id}"))
            .json(&json!({ "title": "robada" })),
        client.delete(format!("{base}/{id}")),
    ];

    for request in requests {
        let response = request
            .bearer_auth("teacher-8")
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
        let body: Value = response.json().await.expect("Failed to parse error");
        assert_eq!(body["error"]["type"], "forbidden");
    }

    let unchanged: Value = client
        .get(format!("{base}/{id}"))
        .bearer_auth("teacher-7")
        .send()
        .await
        .expect("Failed to get exercise")
        .json()
        .await
        .expect("Failed to parse exercise");
    assert_eq!(unchanged["title"], "SILLA");
}

/// Tests that incomplete payloads are rejected without storing anything.
#[tokio::test]
async fn test_incomplete_exercise_is_rejected() {
    let base = spawn_stack().await;
    let client = reqwest::Client::new();

    let mut payload = exercise_payload("lampara", "I-I");
    payload["ampliationText"] = json!([]);

    let response = client
        .post(format!("{base}/"))
        .bearer_auth("teacher-7")
        .json(&payload)
        .send()
        .await
        .expect("Failed to send create request");
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse error");
    assert_eq!(body["error"]["type"], "validationError");

    let listing: Value = client
        .get(format!("{base}/list/es"))
        .send()
        .await
        .expect("Failed to list")
        .json()
        .await
        .expect("Failed to parse listing");
    assert_eq!(listing, json!([]));
}

// ============================================================================
// Identity Relay Tests
// ============================================================================

/// Tests that identity rejections are relayed with their status and payload.
#[tokio::test]
async fn test_identity_rejection_is_relayed() {
    let base = spawn_stack().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/teacher"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.expect("Failed to parse error");
    assert_eq!(
        body,
        json!({ "error": { "type": "unauthorized", "message": "Invalid token" } })
    );

    let response = client
        .post(format!("{base}/"))
        .bearer_auth("expired")
        .json(&exercise_payload("cama", "I-I"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);
    let body: Value = response.json().await.expect("Failed to parse error");
    assert_eq!(body, json!({ "error": "Session expired" }));
}

/// Tests that an unreachable users service surfaces as an internal error.
#[tokio::test]
async fn test_unreachable_identity_service_is_internal_error() {
    // Nothing listens on a port we just released
    let users = format!("http://127.0.0.1:{}", find_available_port());
    let base = spawn_exercises_server(users).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/teacher"))
        .bearer_auth("teacher-7")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.expect("Failed to parse error");
    assert_eq!(body["error"]["type"], "internalServerError");
}

// ============================================================================
// Guided Sequence Tests
// ============================================================================

/// Tests walking the guided sequence with `/next`.
#[tokio::test]
async fn test_guided_walk() {
    let base = spawn_stack().await;
    let client = reqwest::Client::new();

    let a = create(&client, &base, "teacher-7", &exercise_payload("a", "I-I")).await;
    let b = create(&client, &base, "teacher-7", &exercise_payload("b", "I-II")).await;
    create(&client, &base, "teacher-7", &exercise_payload("z", "II-II")).await;

    let sequence: Value = client
        .get(format!("{base}/guided/es"))
        .send()
        .await
        .expect("Failed to get guided sequence")
        .json()
        .await
        .expect("Failed to parse guided sequence");
    let entries = sequence.as_array().expect("Expected array");
    assert_eq!(entries.len(), 8);

    let expected = [
        (&a, "ICONIC"),
        (&b, "ICONIC"),
        (&a, "MIXED"),
        (&b, "MIXED"),
        (&a, "GLOBAL"),
        (&b, "GLOBAL"),
        (&a, "SYMBOLIC"),
        (&b, "SYMBOLIC"),
    ];
    for (position, (entry, (exercise, representation))) in
        entries.iter().zip(expected).enumerate()
    {
        assert_eq!(entry["_id"], exercise["_id"], "position {position}");
        assert_eq!(entry["representation"], representation, "position {position}");
        assert_eq!(entry["index"], position, "position {position}");
    }

    // Walk from the start using the default language
    let mut index = 0;
    let mut visited = 1;
    loop {
        let next: Value = client
            .get(format!("{base}/next/{index}"))
            .send()
            .await
            .expect("Failed to get next entry")
            .json()
            .await
            .expect("Failed to parse next entry");
        if next.is_null() {
            break;
        }
        assert_eq!(next, entries[index + 1]);
        index += 1;
        visited += 1;
    }
    assert_eq!(visited, entries.len());

    let at: Value = client
        .get(format!("{base}/guided/es/5"))
        .send()
        .await
        .expect("Failed to get guided entry")
        .json()
        .await
        .expect("Failed to parse guided entry");
    assert_eq!(at, entries[5]);
}

/// Tests the public language listings.
#[tokio::test]
async fn test_language_listings() {
    let base = spawn_stack().await;
    let client = reqwest::Client::new();

    let mut mixed = exercise_payload("vaso", "I-I");
    mixed["representation"] = json!("mixed");
    mixed["closedOrder"] = json!(2);
    create(&client, &base, "teacher-7", &mixed).await;

    let mut first = exercise_payload("plato", "I-I");
    first["closedOrder"] = json!(1);
    create(&client, &base, "teacher-8", &first).await;

    let sorted: Value = client
        .get(format!("{base}/list/ES?closedOrder=1"))
        .send()
        .await
        .expect("Failed to list")
        .json()
        .await
        .expect("Failed to parse listing");
    assert_eq!(sorted[0]["title"], "PLATO");
    assert_eq!(sorted[1]["title"], "VASO");

    let by_category: Value = client
        .post(format!("{base}/list/es"))
        .json(&json!({ "category": "Hogar" }))
        .send()
        .await
        .expect("Failed to list by category")
        .json()
        .await
        .expect("Failed to parse listing");
    let titles: Vec<&str> = by_category
        .as_array()
        .expect("Expected array")
        .iter()
        .filter_map(|exercise| exercise["title"].as_str())
        .collect();
    assert_eq!(titles, ["VASO"]);
}
