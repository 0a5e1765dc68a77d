// tests/api_tests.rs

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use driveprep::{
    config::{ClientConfig, Config},
    error::AppError,
    models::{progress::Category, xp_transaction::AddXpRequest},
    routes,
    state::AppState,
    sync::{FileStore, HttpProgressClient, ProgressStore, ProgressSync, RemoteProgress},
};
use serde_json::{Value, json};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

const EMAIL: &str = "learner@example.com";
const PASSWORD: &str = "password123";

/// Fresh in-memory database with migrations applied.
async fn test_state() -> AppState {
    // A single connection that never expires, so the in-memory database
    // lives as long as the pool.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        log_dir: "logs".to_string(),
    };

    AppState::new(pool, config)
}

/// Spawns the app on a random port and returns its base URL.
async fn spawn_app() -> String {
    serve(routes::create_router(test_state().await)).await
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

/// Registers the default user and returns a bearer token.
async fn login_token(address: &str, client: &reqwest::Client) -> String {
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({ "email": EMAIL, "name": "Learner", "password": PASSWORD }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "email": EMAIL, "password": PASSWORD }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    body["data"]["token"].as_str().expect("Token not found").to_string()
}

async fn post_json(
    client: &reqwest::Client,
    url: String,
    token: &str,
    body: Value,
) -> (u16, Value) {
    let response = client
        .post(url)
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request");
    let status = response.status().as_u16();
    (status, response.json().await.expect("Body is not json"))
}

#[tokio::test]
async fn unknown_route_is_404() {
    let address = spawn_app().await;

    let response = reqwest::Client::new()
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn progress_routes_require_token() {
    let app = routes::create_router(test_state().await);

    let response = app
        .oneshot(Request::builder().uri("/api/progress").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn invalid_token_is_rejected() {
    let address = spawn_app().await;

    let response = reqwest::Client::new()
        .get(format!("{}/api/progress", address))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn register_works() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({
            "email": "New.Driver@Example.com",
            "name": "New Driver",
            "password": PASSWORD,
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "new.driver@example.com");
    assert!(body["data"].get("password").is_none());

    // Same address again
    let duplicate = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({ "email": "new.driver@example.com", "name": "Again", "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(duplicate.status().as_u16(), 409);
}

#[tokio::test]
async fn register_fails_validation() {
    let address = spawn_app().await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/auth/register", address))
        .json(&json!({ "email": "not-an-email", "name": "X", "password": "short" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn login_with_wrong_password_fails() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    login_token(&address, &client).await;

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "email": EMAIL, "password": "wrong-password" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn new_user_has_default_progress() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = login_token(&address, &client).await;

    let body: Value = client
        .get(format!("{}/api/progress", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["xp"], 0);
    assert_eq!(body["data"]["level"], 1);
    assert_eq!(body["data"]["badges"], json!([]));
}

#[tokio::test]
async fn sync_merges_device_copies() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = login_token(&address, &client).await;
    let url = format!("{}/api/progress/sync", address);

    let (status, first) = post_json(
        &client,
        url.clone(),
        &token,
        json!({
            "localProgress": {
                "xp": 500,
                "level": 1,
                "badges": ["first_steps"],
                "testsCompleted": 2,
            }
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(first["data"]["mergedProgress"]["xp"], 500);
    assert_eq!(first["data"]["mergedProgress"]["level"], 3);

    let (_, second) = post_json(
        &client,
        url,
        &token,
        json!({ "localProgress": { "xp": 450, "badges": ["xp_100"], "testsCompleted": 3 } }),
    )
    .await;
    let merged = &second["data"]["mergedProgress"];
    assert_eq!(merged["xp"], 500);
    assert_eq!(merged["testsCompleted"], 3);
    assert_eq!(merged["badges"], json!(["first_steps", "xp_100"]));
    assert!(second["data"]["syncedAt"].is_string());
}

#[tokio::test]
async fn add_xp_validates_and_logs() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = login_token(&address, &client).await;
    let url = format!("{}/api/progress/add-xp", address);

    let zero = json!({ "amount": 0, "reason": "nothing" });
    let (status, _) = post_json(&client, url.clone(), &token, zero).await;
    assert_eq!(status, 400);

    let (status, _) = post_json(
        &client,
        url.clone(),
        &token,
        json!({ "amount": 10, "reason": "quiz", "referenceType": "bogus" }),
    )
    .await;
    assert_eq!(status, 400);

    let (status, body) = post_json(
        &client,
        url,
        &token,
        json!({
            "amount": 150,
            "reason": "practice_test",
            "referenceId": "t-1",
            "referenceType": "test",
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"], json!({ "newXp": 150, "newLevel": 2, "leveledUp": true }));

    let history: Value = client
        .get(format!("{}/api/progress/xp-history?limit=10", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history["data"]["total"], 1);
    assert_eq!(history["data"]["transactions"][0]["amount"], 150);
    assert_eq!(history["data"]["transactions"][0]["referenceType"], "test");
}

#[tokio::test]
async fn streak_counts_once_per_day() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = login_token(&address, &client).await;
    let url = format!("{}/api/progress/update-streak", address);

    let (status, first) = post_json(&client, url.clone(), &token, json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(first["data"]["newLogin"], true);
    assert_eq!(first["data"]["streak"], 1);
    assert_eq!(first["data"]["xpEarned"], 50);

    let (_, second) = post_json(&client, url, &token, json!({})).await;
    assert_eq!(second["data"]["newLogin"], false);
    assert_eq!(second["data"]["xpEarned"], 0);
    assert_eq!(second["data"]["newXp"], 50);
}

#[tokio::test]
async fn check_badges_awards_once() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = login_token(&address, &client).await;

    post_json(
        &client,
        format!("{}/api/progress/sync", address),
        &token,
        json!({ "localProgress": { "questionsCompleted": 30, "questionsCorrect": 20 } }),
    )
    .await;

    let url = format!("{}/api/progress/check-badges", address);
    let (status, first) = post_json(&client, url.clone(), &token, json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(first["data"]["newBadges"], json!(["first_steps", "quick_learner"]));
    assert_eq!(first["data"]["totalXpEarned"], 150);
    assert_eq!(first["data"]["newXp"], 150);

    // The reward pushed XP past 100.
    let (_, second) = post_json(&client, url.clone(), &token, json!({})).await;
    assert_eq!(second["data"]["newBadges"], json!(["xp_100"]));

    let (_, third) = post_json(&client, url, &token, json!({})).await;
    assert_eq!(third["data"]["newBadges"], json!([]));
    assert_eq!(third["data"]["totalBadges"], 3);

    let history: Value = client
        .get(format!("{}/api/progress/badges", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history["data"]["badges"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn devices_converge_through_the_service() {
    let address = spawn_app().await;

    let mut client = HttpProgressClient::new(&address).unwrap();
    client.register(EMAIL, "Learner", PASSWORD).await.unwrap();
    client.login(EMAIL, PASSWORD).await.unwrap();
    assert!(client.is_authenticated());
    let remote: Arc<dyn RemoteProgress> = Arc::new(client.clone());

    let phone_dir = tempfile::tempdir().unwrap();
    let phone_store = ProgressStore::new(FileStore::new(phone_dir.path()));
    let mut phone = ProgressSync::new(phone_store).with_remote(remote.clone());

    for _ in 0..3 {
        phone.record_correct_answer(Category::RulesOfTheRoad, 10).unwrap();
    }
    phone.record_incorrect_answer(Category::RulesOfTheRoad).unwrap();

    let report = phone.sync().await;
    assert!(report.synced);
    assert!(!report.used_fallback);
    assert!(report.streak_updated);
    assert_eq!(phone.store().pending(), 0);

    let server = remote.fetch_progress().await.unwrap();
    let local = phone.progress();
    assert_eq!(local, server);
    assert_eq!(local.questions_completed, 4);
    assert_eq!(local.current_streak, 1);
    assert!(local.has_badge("first_steps"));

    let tablet_dir = tempfile::tempdir().unwrap();
    let tablet_config = ClientConfig {
        api_url: address.clone(),
        data_dir: tablet_dir.path().to_path_buf(),
    };
    let tablet_login = client.login(EMAIL, PASSWORD).await.unwrap();
    let mut tablet = ProgressSync::from_config(&tablet_config, Some(tablet_login.token)).unwrap();
    let loaded = tablet.load().await;
    assert_eq!(loaded.xp, server.xp);
    assert_eq!(loaded.category(Category::RulesOfTheRoad).questions_answered, 4);

    let history = client.xp_history(20).await.unwrap();
    assert!(history.total >= 1);

    let before = tablet.progress().xp;
    let added = client
        .add_xp(&AddXpRequest {
            amount: 40,
            reason: "daily_challenge".to_string(),
            reference_id: Some("2025-03-12-questions-0".to_string()),
            reference_type: Some("daily_challenge".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(added.new_xp, before + 40);
    assert_eq!(tablet.load().await.xp, before + 40);

    let awards = client.badge_history().await.unwrap();
    assert!(awards.badges.iter().any(|award| award.badge_id == "first_steps"));

    client.logout();
    assert!(!client.is_authenticated());
    let err = client.badge_history().await.unwrap_err();
    assert!(matches!(err, AppError::AuthError(_)));
}

#[tokio::test]
async fn client_keeps_the_base_path_prefix() {
    let client = HttpProgressClient::new("https://example.com/driveprep").unwrap();
    assert_eq!(client.base_url().as_str(), "https://example.com/driveprep/");
    assert_eq!(
        client.endpoint("api/progress/sync").unwrap().as_str(),
        "https://example.com/driveprep/api/progress/sync"
    );
    assert_eq!(
        client.endpoint("/api/progress").unwrap().as_str(),
        "https://example.com/driveprep/api/progress"
    );

    let root = HttpProgressClient::new("https://example.com").unwrap();
    assert_eq!(
        root.endpoint("api/progress").unwrap().as_str(),
        "https://example.com/api/progress"
    );
}

#[tokio::test]
async fn client_talks_to_a_service_mounted_under_a_prefix() {
    let app = Router::new().nest("/driveprep", routes::create_router(test_state().await));
    let address = serve(app).await;

    let mut client = HttpProgressClient::new(&format!("{}/driveprep", address)).unwrap();
    client.register(EMAIL, "Learner", PASSWORD).await.unwrap();
    client.login(EMAIL, PASSWORD).await.unwrap();

    let progress = client.fetch_progress().await.unwrap();
    assert_eq!(progress.xp, 0);
    assert_eq!(progress.level, 1);
}
