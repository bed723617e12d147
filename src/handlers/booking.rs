//! 预订处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::booking::{CreateBookingRequest, ReserveRequest},
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;

/// 创建预订，归属当前登录用户
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let request = into_reserve_request(req)?;

    let booking = state
        .booking_service
        .reserve(auth_context.user_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

/// 当前用户的预订，最新的在前
pub async fn list_my_bookings(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state
        .booking_service
        .list_by_user(auth_context.user_id)
        .await?;

    Ok(Json(json!({
        "count": bookings.len(),
        "bookings": bookings,
    })))
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::BadRequest(format!("{field} must be a date in YYYY-MM-DD format"))
    })
}

/// 未给出或非正的房间数、成人数按 1 计
fn into_reserve_request(req: CreateBookingRequest) -> Result<ReserveRequest, AppError> {
    Ok(ReserveRequest {
        room_id: req.room_id,
        check_in: parse_date("check_in", &req.check_in)?,
        check_out: parse_date("check_out", &req.check_out)?,
        adults: if req.adults > 0 { req.adults } else { 1 },
        children: req.children,
        rooms: if req.rooms > 0 { req.rooms } else { 1 },
    })
}
