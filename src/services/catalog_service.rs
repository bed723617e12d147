//! 房源与线路目录

use crate::{
    error::AppError,
    models::{
        room::{CreateRoomRequest, NewRoom, Room},
        tour::{CreateTourRequest, Tour},
    },
    repository::{RoomRepository, TourRepository},
};
use std::sync::Arc;
use validator::Validate;

pub struct CatalogService {
    rooms: Arc<dyn RoomRepository>,
    tours: Arc<dyn TourRepository>,
}

impl CatalogService {
    pub fn new(rooms: Arc<dyn RoomRepository>, tours: Arc<dyn TourRepository>) -> Self {
        Self { rooms, tours }
    }

    pub async fn list_rooms(&self) -> Result<Vec<Room>, AppError> {
        self.rooms.list_all().await
    }

    pub async fn get_room(&self, id: i64) -> Result<Room, AppError> {
        self.rooms.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    /// 新建房源，未给出的库存字段按默认值补齐
    pub async fn create_room(&self, req: CreateRoomRequest) -> Result<Room, AppError> {
        req.validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let room = NewRoom::from(req);
        room.check_inventory().map_err(AppError::BadRequest)?;

        let created = self.rooms.insert(room).await?;
        tracing::info!(room_id = created.id, name = %created.name, "Room created");
        Ok(created)
    }

    pub async fn list_tours(&self) -> Result<Vec<Tour>, AppError> {
        self.tours.list_all().await
    }

    pub async fn get_tour(&self, id: i64) -> Result<Tour, AppError> {
        self.tours.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn create_tour(&self, req: CreateTourRequest) -> Result<Tour, AppError> {
        req.validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let created = self.tours.insert(req).await?;
        tracing::info!(tour_id = created.id, title = %created.title, "Tour created");
        Ok(created)
    }
}
