//! 房源目录处理器

use crate::{error::AppError, middleware::AppState, models::room::CreateRoomRequest};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let rooms = state.catalog_service.list_rooms().await?;
    Ok(Json(rooms))
}

pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let room = state.catalog_service.get_room(id).await?;
    Ok(Json(room))
}

/// 新建房源（管理员）
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<impl IntoResponse, AppError> {
    let room = state.catalog_service.create_room(req).await?;
    Ok((StatusCode::CREATED, Json(room)))
}
