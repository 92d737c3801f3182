mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{TestRequest, state_with_db, test_app, token_for};
use crystaltides::router::init_router;
use crystaltides_auth::totp;
use crystaltides_db::{Database, MemoryStore};
use crystaltides_models::two_factor;
use serde_json::json;
use uuid::Uuid;

fn rule() -> serde_json::Value {
    json!({
        "category": "PvP",
        "title": "No combat logging",
        "content": "Logging out mid-fight is banned."
    })
}

#[tokio::test]
async fn test_enrolled_admin_needs_step_up_token() {
    let (app, state) = test_app();
    let admin = Uuid::new_v4();
    let bearer = token_for(admin, "admin");
    let secret = totp::generate_secret();

    state
        .db
        .insert::<serde_json::Value, _>(
            two_factor::TABLE,
            &json!({ "user_id": admin, "secret": secret, "enabled": true }),
        )
        .await
        .unwrap();

    let (status, body) = TestRequest::post("/api/rules")
        .bearer(&bearer)
        .json(rule())
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "TWO_FACTOR_REQUIRED");

    let (status, _) = TestRequest::post("/api/rules")
        .bearer(&bearer)
        .header("x-admin-token", "forged")
        .json(rule())
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let code = totp::current_code(&secret).unwrap();
    let (status, body) = TestRequest::post("/api/auth/2fa/verify")
        .bearer(&bearer)
        .json(json!({ "token": code }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let admin_token = body["data"]["adminToken"].as_str().unwrap().to_string();

    let (status, body) = TestRequest::post("/api/rules")
        .bearer(&bearer)
        .header("x-admin-token", &admin_token)
        .json(rule())
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[tokio::test]
async fn test_step_up_token_is_bound_to_its_user() {
    let (app, state) = test_app();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    let secret = totp::generate_secret();

    for id in [first, second] {
        state
            .db
            .insert::<serde_json::Value, _>(
                two_factor::TABLE,
                &json!({ "user_id": id, "secret": secret, "enabled": true }),
            )
            .await
            .unwrap();
    }

    let (_, body) = TestRequest::post("/api/auth/2fa/verify")
        .bearer(&token_for(first, "admin"))
        .json(json!({ "token": totp::current_code(&secret).unwrap() }))
        .send(&app)
        .await;
    let admin_token = body["data"]["adminToken"].as_str().unwrap().to_string();

    let (status, body) = TestRequest::post("/api/rules")
        .bearer(&token_for(second, "admin"))
        .header("x-admin-token", &admin_token)
        .json(rule())
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "TWO_FACTOR_REQUIRED");
}

#[tokio::test]
async fn test_setup_and_status_for_members() {
    let (app, _) = test_app();
    let bearer = token_for(Uuid::new_v4(), "user");

    let (status, body) = TestRequest::get("/api/auth/2fa/status")
        .bearer(&bearer)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["enabled"], false);

    let (status, body) = TestRequest::post("/api/auth/2fa/setup")
        .bearer(&bearer)
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let secret = body["data"]["secret"].as_str().unwrap().to_string();

    let (status, body) = TestRequest::post("/api/auth/2fa/enable")
        .bearer(&bearer)
        .json(json!({ "secret": secret, "token": totp::current_code(&secret).unwrap() }))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, body) = TestRequest::get("/api/auth/2fa/status")
        .bearer(&bearer)
        .send(&app)
        .await;
    assert_eq!(body["data"]["enabled"], true);
}

#[tokio::test]
async fn test_admin_gate_fails_closed_without_two_factor_table() {
    let store = MemoryStore::new().without_table(two_factor::TABLE);
    let app = init_router(state_with_db(Database::new(Arc::new(store))));

    let (status, _) = TestRequest::post("/api/rules")
        .bearer(&token_for(Uuid::new_v4(), "admin"))
        .json(rule())
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
