//! Room repository (数据库访问层)

use crate::{
    error::AppError,
    models::room::{NewRoom, Room},
};
use async_trait::async_trait;
use sqlx::PgPool;

use super::RoomRepository;

const ROOM_COLUMNS: &str = "id, name, description, location, destination, rating, reviews, \
     price_cents, original_price_cents, amenities, featured, max_adults, max_children, \
     rooms_total, rooms_available, status";

pub struct PgRoomRepository {
    db: PgPool,
}

impl PgRoomRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoomRepository for PgRoomRepository {
    async fn list_all(&self) -> Result<Vec<Room>, AppError> {
        let rooms = sqlx::query_as::<_, Room>(&format!("SELECT {ROOM_COLUMNS} FROM rooms ORDER BY id"))
            .fetch_all(&self.db)
            .await?;

        Ok(rooms)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Room>, AppError> {
        let room = sqlx::query_as::<_, Room>(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(room)
    }

    async fn insert(&self, room: NewRoom) -> Result<Room, AppError> {
        let created = sqlx::query_as::<_, Room>(&format!(
            r#"
            INSERT INTO rooms (
                name, description, location, destination, rating, reviews,
                price_cents, original_price_cents, amenities, featured,
                max_adults, max_children, rooms_total, rooms_available, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {ROOM_COLUMNS}
            "#
        ))
        .bind(&room.name)
        .bind(&room.description)
        .bind(&room.location)
        .bind(&room.destination)
        .bind(room.rating)
        .bind(room.reviews)
        .bind(room.price_cents)
        .bind(room.original_price_cents)
        .bind(&room.amenities)
        .bind(room.featured)
        .bind(room.max_adults)
        .bind(room.max_children)
        .bind(room.rooms_total)
        .bind(room.rooms_available)
        .bind(&room.status)
        .fetch_one(&self.db)
        .await?;

        Ok(created)
    }
}
