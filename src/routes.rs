//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::{auth::middleware as auth_mw, handlers, middleware::AppState};

/// 请求体上限
const MAX_BODY_BYTES: usize = 64 * 1024;

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    let auth_service = state.auth_service.clone();

    // 公开端点
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/rooms", get(handlers::room::list_rooms))
        .route("/api/v1/rooms/{id}", get(handlers::room::get_room))
        .route("/api/v1/tours", get(handlers::tour::list_tours))
        .route("/api/v1/tours/{id}", get(handlers::tour::get_tour));

    // 需要认证的路由
    let authenticated_routes = Router::new()
        .route("/api/v1/auth/me", get(handlers::auth::get_current_user))
        .route("/api/v1/auth/logout", post(handlers::auth::logout))
        .route(
            "/api/v1/bookings",
            post(handlers::booking::create_booking).get(handlers::booking::list_my_bookings),
        )
        .layer(axum::middleware::from_fn_with_state(
            auth_service.clone(),
            auth_mw::jwt_auth_middleware,
        ));

    // 目录维护，仅管理员
    let admin_routes = Router::new()
        .route("/api/v1/rooms", post(handlers::room::create_room))
        .route("/api/v1/tours", post(handlers::tour::create_tour))
        .layer(axum::middleware::from_fn(auth_mw::require_admin))
        .layer(axum::middleware::from_fn_with_state(
            auth_service,
            auth_mw::jwt_auth_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(admin_routes)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
