//! HTTP API 集成测试（内存后端）

use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::{TestApp, ADMIN_IDENTIFIER, ADMIN_SECRET, USER_IDENTIFIER, USER_SECRET};

#[tokio::test]
async fn test_health_and_ready() {
    let app = TestApp::new();

    let (status, body) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app.send("GET", "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
}

#[tokio::test]
async fn test_login_me_logout_cycle() {
    let app = TestApp::new();
    let token = app.login(USER_IDENTIFIER, USER_SECRET).await;

    let (status, body) = app.send("GET", "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identifier"], USER_IDENTIFIER);
    assert_eq!(body["role"], "user");

    let (status, _) = app.send("POST", "/api/v1/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    // 同一令牌登出后立即失效
    let (status, body) = app.send("GET", "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Token revoked");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new();

    let (unknown_status, unknown) = app
        .send(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({"identifier": "ghost@example.com", "secret": "whatever"})),
        )
        .await;
    let (wrong_status, wrong) = app
        .send(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({"username": USER_IDENTIFIER, "password": "wrong"})),
        )
        .await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown["error"]["message"], wrong["error"]["message"]);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let app = TestApp::new();
    let token = app.login(USER_IDENTIFIER, USER_SECRET).await;

    app.clock.advance(chrono::Duration::seconds(300));

    let (status, body) = app.send("GET", "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Token expired");
}

#[tokio::test]
async fn test_missing_or_malformed_authorization() {
    let app = TestApp::new();

    let (status, _) = app.send("GET", "/api/v1/bookings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send("GET", "/api/v1/bookings", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_booking_flow() {
    let app = TestApp::new();
    let token = app.login(USER_IDENTIFIER, USER_SECRET).await;

    let (status, booking) = app
        .send(
            "POST",
            "/api/v1/bookings",
            Some(&token),
            Some(json!({
                "hotel_id": 1,
                "check_in": "2024-03-01",
                "check_out": "2024-03-03",
                "adults": 2,
                "rooms": 2
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["total_price_cents"], 15000 * 2 * 2);

    let (_, room) = app.send("GET", "/api/v1/rooms/1", None, None).await;
    assert_eq!(room["rooms_available"], 3);

    // 超出剩余库存
    let (status, _) = app
        .send(
            "POST",
            "/api/v1/bookings",
            Some(&token),
            Some(json!({"room_id": 1, "check_in": "2024-03-01", "check_out": "2024-03-02", "rooms": 4})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // 离店早于入住
    let (status, _) = app
        .send(
            "POST",
            "/api/v1/bookings",
            Some(&token),
            Some(json!({"room_id": 1, "check_in": "2024-03-05", "check_out": "2024-03-02"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            "POST",
            "/api/v1/bookings",
            Some(&token),
            Some(json!({"room_id": 42, "check_in": "2024-03-01", "check_out": "2024-03-02"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, mine) = app.send("GET", "/api/v1/bookings", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["count"], 1);
    assert_eq!(mine["bookings"][0]["id"], booking["id"]);
}

#[tokio::test]
async fn test_catalog_admin_only_writes() {
    let app = TestApp::new();
    let new_room = json!({"name": "Sea Breeze", "price_cents": 8000, "rooms_total": 3});

    let user_token = app.login(USER_IDENTIFIER, USER_SECRET).await;
    let (status, _) = app
        .send("POST", "/api/v1/rooms", Some(&user_token), Some(new_room.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send("POST", "/api/v1/rooms", None, Some(new_room.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin_token = app.login(ADMIN_IDENTIFIER, ADMIN_SECRET).await;
    let (status, room) = app
        .send("POST", "/api/v1/rooms", Some(&admin_token), Some(new_room))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(room["rooms_available"], 3);

    let (status, rooms) = app.send("GET", "/api/v1/rooms", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rooms.as_array().map(|r| r.len()), Some(2));

    let (status, tour) = app
        .send(
            "POST",
            "/api/v1/tours",
            Some(&admin_token),
            Some(json!({"title": "Night Market Walk", "price_cents": 3000})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/v1/tours/{}", tour["id"]);
    let (status, fetched) = app.send("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Night Market Walk");
}
