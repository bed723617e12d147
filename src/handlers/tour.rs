//! 线路目录处理器

use crate::{error::AppError, middleware::AppState, models::tour::CreateTourRequest};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

pub async fn list_tours(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.catalog_service.list_tours().await?))
}

pub async fn get_tour(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.catalog_service.get_tour(id).await?))
}

pub async fn create_tour(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTourRequest>,
) -> Result<impl IntoResponse, AppError> {
    let tour = state.catalog_service.create_tour(req).await?;
    Ok((StatusCode::CREATED, Json(tour)))
}
