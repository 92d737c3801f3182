mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{TestRequest, send_response, state_with_db, test_app, token};
use crystaltides::router::init_router;
use crystaltides_config::IntegrationsConfig;
use crystaltides_db::{Database, SelectQuery};
use crystaltides_models::{Donation, donations};
use serde_json::json;
use tower::ServiceExt;

const KOFI_TOKEN: &str = "kofi-test-token";

fn kofi_app() -> (axum::Router, Database) {
    let db = Database::memory();
    let state = state_with_db(db.clone()).with_integrations(IntegrationsConfig {
        kofi_verification_token: Some(KOFI_TOKEN.to_string()),
        ..IntegrationsConfig::default()
    });
    (init_router(state), db)
}

fn kofi_event(message_id: Option<&str>, token: &str) -> String {
    let mut event = json!({
        "verification_token": token,
        "timestamp": "2026-03-10T21:43:04Z",
        "type": "Donation",
        "is_public": true,
        "from_name": "Jo Example",
        "message": "Good luck!",
        "amount": "3.00",
        "currency": "USD",
        "email": "jo@example.com"
    });
    if let Some(id) = message_id {
        event["message_id"] = json!(id);
    }
    event.to_string()
}

async fn post_form(app: &axum::Router, data: &str) -> (StatusCode, serde_json::Value) {
    let body = format!("data={}", urlencode(data));
    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/kofi")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    send_response(app.clone().oneshot(request).await.unwrap()).await
}

fn urlencode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

async fn donation_count(db: &Database) -> i64 {
    let (_, total) = db
        .list::<Donation>(donations::TABLE, &SelectQuery::new())
        .await
        .unwrap();
    total
}

#[tokio::test]
async fn test_donation_listing_paginates_and_redacts() {
    let db = Database::memory();
    for i in 0..45 {
        db.insert::<Donation, _>(
            donations::TABLE,
            &json!({
                "amount": 5.0,
                "from_name": format!("Donor {i}"),
                "buyer_email": "buyer@example.com",
                "is_public": i % 2 == 0,
                "message": "Thanks!",
                "created_at": format!("2026-01-{:02}T10:00:00Z", (i % 28) + 1)
            }),
        )
        .await
        .unwrap();
    }
    let app = init_router(state_with_db(db));

    let (status, body) = TestRequest::get("/api/donations?page=3&limit=20").send(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    assert_eq!(body["meta"], json!({ "page": 3, "limit": 20, "total": 45, "totalPages": 3 }));

    for donation in body["data"].as_array().unwrap() {
        assert!(donation.get("buyer_email").is_none_or(|v| v.is_null()));
    }
}

#[tokio::test]
async fn test_invalid_pagination_is_rejected() {
    let (app, _) = test_app();
    let (status, body) = TestRequest::get("/api/donations?page=0").send(&app).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "query.page");

    let (status, body) = TestRequest::get("/api/donations?page=9223372036854775807")
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "query.page");

    let (status, body) = TestRequest::get("/api/logs?page=9223372036854775807")
        .bearer(&token("moderator"))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn test_manual_donation_is_admin_only() {
    let (app, _) = test_app();
    let donation = json!({ "amount": 10.0, "from_name": "Steve", "currency": "EUR" });

    let (status, _) = TestRequest::post("/api/donations")
        .bearer(&token("helper"))
        .json(donation.clone())
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = TestRequest::post("/api/donations")
        .bearer(&token("admin"))
        .json(donation)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["amount"], 10.0);
}

#[tokio::test]
async fn test_kofi_form_event_is_recorded_once() {
    let (app, db) = kofi_app();
    let event = kofi_event(Some("3a1fac0c-f960-4506-a60e-824979a74e74"), KOFI_TOKEN);

    let (status, body) = post_form(&app, &event).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Donation recorded");

    let (status, _) = post_form(&app, &event).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(donation_count(&db).await, 1);
}

#[tokio::test]
async fn test_kofi_json_body_is_accepted() {
    let (app, db) = kofi_app();
    let (status, body) = TestRequest::post("/api/webhooks/kofi")
        .json(json!({ "data": kofi_event(Some("json-1"), KOFI_TOKEN) }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(donation_count(&db).await, 1);
}

#[tokio::test]
async fn test_kofi_rejections() {
    let (app, db) = kofi_app();

    let (status, _) = post_form(&app, &kofi_event(Some("m-1"), "wrong")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = post_form(&app, "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_form(&app, &kofi_event(None, KOFI_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Ignored");

    assert_eq!(donation_count(&db).await, 0);
}

#[tokio::test]
async fn test_kofi_accepted_unverified_without_configured_token() {
    let db = Database::memory();
    let app = init_router(state_with_db(db.clone()));

    let (status, body) = post_form(&app, &kofi_event(Some("m-1"), "anything")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Donation recorded");
    assert_eq!(donation_count(&db).await, 1);
}

#[tokio::test]
async fn test_minecraft_webhook_checks_bridge_secret() {
    let state = state_with_db(Database::memory()).with_integrations(IntegrationsConfig {
        bridge_secret: Some("bridge".to_string()),
        ..IntegrationsConfig::default()
    });
    let app = init_router(state);
    let event = json!({ "event": "join", "player": "Steve", "details": "joined the game" });

    let (status, _) = TestRequest::post("/api/webhooks/minecraft")
        .json(event.clone())
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = TestRequest::post("/api/webhooks/minecraft")
        .header("x-bridge-secret", "bridge")
        .json(event)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
}
