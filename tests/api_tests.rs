// tests/api_tests.rs

use std::sync::Arc;

use gatherly_backend::authorizer::authorize;
use gatherly_backend::config::Config;
use gatherly_backend::notifier::LogNotifier;
use gatherly_backend::routes;
use gatherly_backend::state::AppState;
use gatherly_backend::store;
use gatherly_backend::utils::jwt::TokenSigner;
use sqlx::postgres::PgPoolOptions;

const TEST_JWT_SECRET: &str = "test_secret_for_integration_tests";

/// Spawns the app on a random port and returns the base URL, or None when
/// no DATABASE_URL is configured (the DB-backed tests then no-op).
async fn spawn_app() -> Option<String> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping DB-backed test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing");

    store::ensure_schema(&pool)
        .await
        .expect("Failed to bootstrap schema");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        jwt_expiration: 600,
        otp_ttl_minutes: 10,
        rust_log: "error".to_string(),
    };
    let signer = TokenSigner::new(&config.jwt_secret, config.jwt_expiration);

    let state = AppState {
        pool,
        config,
        signer,
        notifier: Arc::new(LogNotifier),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Some(format!("http://127.0.0.1:{}", port))
}

fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

async fn register_user(
    client: &reqwest::Client,
    address: &str,
    username: &str,
    email: &str,
    password: &str,
) -> serde_json::Value {
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": username,
            "email": email,
            "dateOfBirth": "1995-04-20",
            "password": password
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.expect("register body")
}

#[tokio::test]
async fn register_works_and_issues_a_token() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let username = unique_name("u");

    let body = register_user(
        &client,
        &address,
        &username,
        &format!("{username}@example.com"),
        "Str0ng!Pass",
    )
    .await;

    assert_eq!(body["status"], "success");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn register_reports_all_violations() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": "yo",
            "dateOfBirth": "1990-01-01",
            "email": "yo@example.com",
            "password": "weak"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let username = unique_name("dup");

    register_user(
        &client,
        &address,
        &username,
        &format!("{username}@example.com"),
        "Str0ng!Pass",
    )
    .await;

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": username,
            "email": format!("{username}2@example.com"),
            "dateOfBirth": "1995-04-20",
            "password": "Str0ng!Pass"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 409);
}

/// The full credential journey: register, fail a login, walk the OTP flow,
/// then hit the authorizer with the earned token.
#[tokio::test]
async fn auth_scenario_end_to_end() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let username = unique_name("alice");
    let email = format!("{username}@example.com");

    register_user(&client, &address, &username, &email, "Str0ng!Pass").await;

    // Wrong password -> 401 Invalid credentials
    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "emailOrPhone": email, "password": "Wr0ng!Pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid credentials");

    // Request an OTP -> 6-digit numeric code
    let response = client
        .post(format!("{}/api/otp/request", address))
        .json(&serde_json::json!({ "emailOrPhone": email }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let otp = body["otp"].as_str().unwrap().to_string();
    assert_eq!(otp.len(), 6);
    assert!(otp.chars().all(|c| c.is_ascii_digit()));

    // Wrong code -> 401
    let wrong = if otp == "000000" { "000001" } else { "000000" };
    let response = client
        .post(format!("{}/api/otp/verify", address))
        .json(&serde_json::json!({ "emailOrPhone": email, "otp": wrong }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    // Correct code within TTL -> token issued
    let response = client
        .post(format!("{}/api/otp/verify", address))
        .json(&serde_json::json!({ "emailOrPhone": email, "otp": otp }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    // The authorizer grants that token access with the right principal.
    let signer = TokenSigner::new(TEST_JWT_SECRET, 600);
    let decision = authorize(
        &signer,
        Some(&format!("Bearer {token}")),
        "arn:aws:execute-api:us-east-1:123456789012:api/prod/GET/posts/5",
    );
    assert!(decision.is_allow());
    assert_eq!(decision.principal_id, username);
}

#[tokio::test]
async fn newest_otp_wins() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let username = unique_name("otp");
    let email = format!("{username}@example.com");

    register_user(&client, &address, &username, &email, "Str0ng!Pass").await;

    let first: serde_json::Value = client
        .post(format!("{}/api/otp/request", address))
        .json(&serde_json::json!({ "emailOrPhone": email }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let second: serde_json::Value = client
        .post(format!("{}/api/otp/request", address))
        .json(&serde_json::json!({ "emailOrPhone": email }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let first_code = first["otp"].as_str().unwrap();
    let second_code = second["otp"].as_str().unwrap();

    // Validation always targets the most recent record.
    if first_code != second_code {
        let response = client
            .post(format!("{}/api/otp/verify", address))
            .json(&serde_json::json!({ "emailOrPhone": email, "otp": first_code }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 401);
    }

    let response = client
        .post(format!("{}/api/otp/verify", address))
        .json(&serde_json::json!({ "emailOrPhone": email, "otp": second_code }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn expired_otp_is_rejected() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let username = unique_name("stale");
    let email = format!("{username}@example.com");

    register_user(&client, &address, &username, &email, "Str0ng!Pass").await;

    // Plant a code whose TTL has already elapsed.
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&std::env::var("DATABASE_URL").unwrap())
        .await
        .expect("test pool");
    let store = gatherly_backend::store::UserStore::new(pool);
    let user = store
        .find_by_email(&email)
        .await
        .expect("lookup")
        .expect("registered user");
    store
        .insert_otp(user.id, "123456", chrono::Utc::now() - chrono::Duration::seconds(5))
        .await
        .expect("seed expired otp");

    let response = client
        .post(format!("{}/api/otp/verify", address))
        .json(&serde_json::json!({ "emailOrPhone": email, "otp": "123456" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid or expired OTP");
}

#[tokio::test]
async fn protected_routes_deny_without_token() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/posts", address))
        .json(&serde_json::json!({ "caption": "no token" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .get(format!("{}/api/posts/1", address))
        .header("Authorization", "Bearer not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn reset_password_rotates_the_credential() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let username = unique_name("reset");
    let email = format!("{username}@example.com");

    let body = register_user(&client, &address, &username, &email, "Str0ng!Pass").await;
    let token = body["token"].as_str().unwrap().to_string();

    let response = client
        .post(format!("{}/api/auth/reset-password", address))
        .header("Authorization", format!("Bearer {token}"))
        .json(&serde_json::json!({ "newPassword": "Fresh3r!Pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "emailOrPhone": email, "password": "Str0ng!Pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "emailOrPhone": email, "password": "Fresh3r!Pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn create_and_fetch_post_over_http() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let username = unique_name("author");
    let email = format!("{username}@example.com");

    let body = register_user(&client, &address, &username, &email, "Str0ng!Pass").await;
    let token = body["token"].as_str().unwrap().to_string();
    let user_id = body["userId"].as_i64().unwrap();

    let response = client
        .post(format!("{}/api/posts", address))
        .header("Authorization", format!("Bearer {token}"))
        .json(&serde_json::json!({
            "caption": "lakeside meetup",
            "mediaUrls": ["https://cdn.example.com/lake.jpg"],
            "mediaTypes": ["image"],
            "taggedUserIds": [user_id],
            "attendingUserIds": [user_id],
            "participantIds": [user_id],
            "comments": [ { "userId": user_id, "commentText": "count me in" } ],
            "questions": [ { "userId": user_id, "question": "bring food?" } ],
            "answers": [ { "questionIndex": 0, "userId": user_id, "answer": "yes, potluck" } ],
            "likes": [ { "userId": user_id, "likeType": "A" } ],
            "reviews": [ { "userId": user_id, "reviewText": "lovely spot", "rating": 5 } ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    let post_id = body["postId"].as_i64().unwrap();

    let response = client
        .get(format!("{}/api/posts/{}", address, post_id))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let post: serde_json::Value = response.json().await.unwrap();
    assert_eq!(post["postId"].as_i64().unwrap(), post_id);
    assert_eq!(post["userId"].as_i64().unwrap(), user_id);
    assert_eq!(post["caption"], "lakeside meetup");
    assert_eq!(post["shares"], 0);
    assert_eq!(post["mediaUrls"][0], "https://cdn.example.com/lake.jpg");
    assert_eq!(post["mediaTypes"][0], "image");
    assert_eq!(post["taggedUserIds"][0].as_i64().unwrap(), user_id);
    assert_eq!(post["comments"][0]["commentText"], "count me in");
    assert_eq!(post["questions"][0]["question"], "bring food?");
    assert_eq!(
        post["answers"][0]["questionId"],
        post["questions"][0]["questionId"]
    );
    assert_eq!(post["likes"][0]["likeType"], "A");
    assert_eq!(post["reviews"][0]["rating"], 5);

    // Unknown aggregate -> 404
    let response = client
        .get(format!("{}/api/posts/999999999", address))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
