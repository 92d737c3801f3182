mod common;

use axum::http::StatusCode;
use common::{TestRequest, auth_config};
use crystaltides::router::init_router;
use crystaltides::state::AppState;
use crystaltides_config::RateLimitConfig;
use crystaltides_db::Database;
use serde_json::json;

fn limited_app(api_max: u32, sensitive_max: u32) -> axum::Router {
    let state = AppState::new(Database::memory(), auth_config()).with_rate_limits(
        RateLimitConfig {
            enabled: true,
            api_max,
            api_window_secs: 60,
            sensitive_max,
            sensitive_window_secs: 60,
        },
    );
    init_router(state)
}

fn translate_from(ip: &str) -> TestRequest {
    TestRequest::post("/api/translation")
        .header("x-forwarded-for", ip)
        .json(json!({ "text": "" }))
}

#[tokio::test]
async fn test_sensitive_limit_per_client() {
    let app = limited_app(100, 2);

    for _ in 0..2 {
        let (status, _) = translate_from("203.0.113.7").send(&app).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, body) = translate_from("203.0.113.7").send(&app).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "RATE_LIMITED");

    let (status, _) = translate_from("198.51.100.4").send(&app).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_api_limit_covers_public_reads() {
    let app = limited_app(3, 10);

    for _ in 0..3 {
        let (status, _) = TestRequest::get("/api/rules")
            .header("x-forwarded-for", "192.0.2.10")
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = TestRequest::get("/api/rules")
        .header("x-forwarded-for", "192.0.2.10")
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "RATE_LIMITED");
}
