//! 应用状态与 HTTP 中间件

use crate::{
    clock::Clock,
    config::AppConfig,
    error::AppError,
    repository::Repositories,
    services::{AuthService, BookingService, CatalogService},
};
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// 应用状态
///
/// 服务共享同一个时钟；`db` 只在 Postgres 后端下存在，用于就绪探针
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: Option<sqlx::PgPool>,
    pub clock: Arc<dyn Clock>,
    pub auth_service: Arc<AuthService>,
    pub booking_service: Arc<BookingService>,
    pub catalog_service: Arc<CatalogService>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: Option<sqlx::PgPool>,
        repos: Repositories,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        let auth_service = Arc::new(AuthService::from_config(
            &config,
            repos.users.clone(),
            clock.clone(),
        )?);
        let booking_service = Arc::new(BookingService::from_config(
            &config,
            repos.reservations.clone(),
            repos.bookings.clone(),
            clock.clone(),
        ));
        let catalog_service = Arc::new(CatalogService::new(repos.rooms, repos.tours));

        Ok(Self {
            config,
            db,
            clock,
            auth_service,
            booking_service,
            catalog_service,
        })
    }
}

/// 请求追踪中间件
/// 为每个请求生成 request_id，沿用或生成 trace_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    async move {
        let start = Instant::now();
        let mut response = next.run(req).await;
        let elapsed = start.elapsed();

        let status = response.status();
        metrics::counter!(
            "http_requests_total",
            "method" => method_label(method.as_str()),
            "status" => status_class(status.as_u16())
        )
        .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            status = status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed"
        );

        // 非法字符的 trace_id 不回写
        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "PATCH" => "PATCH",
        _ => "OTHER",
    }
}

fn status_class(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}
