//! Integration tests for the identity webhook.
//!
//! Spins up a real server on a free port, signs deliveries the way the
//! provider does, and asserts the resulting store state.

use serde_json::{json, Value};
use std::sync::Arc;

use spacesd::{
    config::AppConfig, identity::verify, reporter::ErrorReporter, rest, storage::Storage,
    AppContext,
};

const SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";

fn get_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Start a server on a random port and return its base URL plus the context.
async fn start_test_server() -> (String, Arc<AppContext>) {
    let data_dir = tempfile::tempdir().unwrap().keep();
    let port = get_free_port();

    let mut config = AppConfig::new(
        Some(port),
        Some(data_dir.clone()),
        Some("warn".to_string()),
        None,
    );
    config.webhook_secret = Some(SECRET.to_string());
    let config = Arc::new(config);

    let storage = Arc::new(Storage::new(&data_dir).await.unwrap());
    let reporter = Arc::new(ErrorReporter::new(&config));
    let ctx = Arc::new(AppContext {
        config,
        storage,
        reporter,
        started_at: std::time::Instant::now(),
    });

    let ctx_server = ctx.clone();
    tokio::spawn(async move {
        rest::start_rest_server(ctx_server).await.ok();
    });

    // Give the server a moment to bind
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{port}"), ctx)
}

/// POST a signed delivery to the webhook endpoint.
async fn post_signed(base: &str, body: &str) -> reqwest::Response {
    let timestamp = chrono::Utc::now().timestamp().to_string();
    let signature = verify::sign(SECRET, "msg_1", &timestamp, body.as_bytes()).unwrap();
    reqwest::Client::new()
        .post(format!("{base}/api/v1/webhooks/identity"))
        .header("svix-id", "msg_1")
        .header("svix-timestamp", &timestamp)
        .header("svix-signature", &signature)
        .header("content-type", "application/json")
        .body(body.to_string())
        .send()
        .await
        .unwrap()
}

fn user_created_body(clerk_id: &str) -> String {
    json!({
        "type": "user.created",
        "data": {
            "id": clerk_id,
            "first_name": "Ada",
            "last_name": "Lovelace",
            "image_url": "https://img.example.com/event.png",
            "primary_email_address_id": "em_1",
            "email_addresses": [{
                "id": "em_1",
                "email_address": "ada@example.com",
                "verification": { "strategy": "from_oauth_google" }
            }],
            "external_accounts": [{ "avatar_url": "https://img.example.com/google.png" }],
            "created_at": 1700000000000i64,
            "last_sign_in_at": 1700000001000i64
        }
    })
    .to_string()
}

async fn profile_count(ctx: &AppContext) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_profiles")
        .fetch_one(&ctx.storage.pool())
        .await
        .unwrap();
    count
}

#[tokio::test]
async fn user_created_syncs_exactly_one_profile() {
    let (base, ctx) = start_test_server().await;
    let body = user_created_body("user_1");

    let resp = post_signed(&base, &body).await;
    assert_eq!(resp.status(), 200);
    // Redelivery of the identical event must not duplicate the row.
    let resp = post_signed(&base, &body).await;
    assert_eq!(resp.status(), 200);

    assert_eq!(profile_count(&ctx).await, 1);
    let profile = ctx.storage.get_profile("user_1").await.unwrap().unwrap();
    assert_eq!(profile.clerk_user_id, "user_1");
    assert_eq!(profile.email, "ada@example.com");
    assert_eq!(profile.provider_type.as_deref(), Some("google"));
    assert_eq!(
        profile.avatar_url.as_deref(),
        Some("https://img.example.com/google.png")
    );
    assert_eq!(profile.created_at, "2023-11-14T22:13:20+00:00");
}

#[tokio::test]
async fn missing_signature_header_answers_400_without_mutation() {
    let (base, ctx) = start_test_server().await;
    let body = user_created_body("user_1");
    let timestamp = chrono::Utc::now().timestamp().to_string();
    let signature = verify::sign(SECRET, "msg_1", &timestamp, body.as_bytes()).unwrap();

    // One header missing at a time.
    for skip in ["svix-id", "svix-timestamp", "svix-signature"] {
        let mut req = reqwest::Client::new()
            .post(format!("{base}/api/v1/webhooks/identity"))
            .header("content-type", "application/json")
            .body(body.clone());
        for (name, value) in [
            ("svix-id", "msg_1"),
            ("svix-timestamp", timestamp.as_str()),
            ("svix-signature", signature.as_str()),
        ] {
            if name != skip {
                req = req.header(name, value);
            }
        }
        let resp = req.send().await.unwrap();
        assert_eq!(resp.status(), 400, "expected 400 when {skip} is missing");
    }

    assert_eq!(profile_count(&ctx).await, 0);
}

#[tokio::test]
async fn tampered_body_answers_400_without_mutation() {
    let (base, ctx) = start_test_server().await;
    let signed_body = user_created_body("user_1");
    let timestamp = chrono::Utc::now().timestamp().to_string();
    let signature = verify::sign(SECRET, "msg_1", &timestamp, signed_body.as_bytes()).unwrap();

    let tampered = user_created_body("user_evil");
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/v1/webhooks/identity"))
        .header("svix-id", "msg_1")
        .header("svix-timestamp", &timestamp)
        .header("svix-signature", &signature)
        .header("content-type", "application/json")
        .body(tampered)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    assert_eq!(profile_count(&ctx).await, 0);
}

#[tokio::test]
async fn user_deleted_removes_the_profile_and_tolerates_unknown_ids() {
    let (base, ctx) = start_test_server().await;
    post_signed(&base, &user_created_body("user_1")).await;
    assert_eq!(profile_count(&ctx).await, 1);

    let delete_body = json!({ "type": "user.deleted", "data": { "id": "user_1" } }).to_string();
    let resp = post_signed(&base, &delete_body).await;
    assert_eq!(resp.status(), 200);
    assert!(ctx.storage.get_profile("user_1").await.unwrap().is_none());

    // Deleting an id that never synced is a no-op, not an error.
    let resp = post_signed(&base, &delete_body).await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn session_created_touches_only_sign_in_fields() {
    let (base, ctx) = start_test_server().await;
    post_signed(&base, &user_created_body("u1")).await;
    let before = ctx.storage.get_profile("u1").await.unwrap().unwrap();

    let body = json!({ "type": "session.created", "data": { "user_id": "u1" } }).to_string();
    let resp = post_signed(&base, &body).await;
    assert_eq!(resp.status(), 200);

    let after = ctx.storage.get_profile("u1").await.unwrap().unwrap();
    assert_ne!(after.last_sign_in_at, before.last_sign_in_at);
    let signed_in_at =
        chrono::DateTime::parse_from_rfc3339(after.last_sign_in_at.as_deref().unwrap()).unwrap();
    assert!((chrono::Utc::now() - signed_in_at.to_utc()).num_seconds().abs() < 5);

    // Everything besides the sign-in timestamps is untouched.
    assert_eq!(after.email, before.email);
    assert_eq!(after.first_name, before.first_name);
    assert_eq!(after.avatar_url, before.avatar_url);
    assert_eq!(after.provider_type, before.provider_type);
    assert_eq!(after.created_at, before.created_at);
}

#[tokio::test]
async fn unknown_event_type_is_accepted_as_noop() {
    let (base, ctx) = start_test_server().await;
    let body = json!({ "type": "organization.created", "data": { "id": "org_1" } }).to_string();

    let resp = post_signed(&base, &body).await;
    assert_eq!(resp.status(), 200);
    let message: Value = resp.json().await.unwrap();
    assert_eq!(message["message"], "webhook processed");
    assert_eq!(profile_count(&ctx).await, 0);
}
