//! Booking repository (数据库访问层)
//! 预订写入只经由事务性的 unit of work，保证与库存扣减同进同退

use crate::{
    error::AppError,
    models::{
        booking::{Booking, NewBooking},
        room::RoomLock,
    },
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::{BookingRepository, ReservationStore, UnitOfWork};

const BOOKING_COLUMNS: &str = "id, user_id, room_id, check_in, check_out, adults, children, \
     rooms, total_price_cents, status, created_at";

pub struct PgBookingRepository {
    db: PgPool,
}

impl PgBookingRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(bookings)
    }
}

pub struct PgReservationStore {
    db: PgPool,
}

impl PgReservationStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReservationStore for PgReservationStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>, AppError> {
        let tx = self.db.begin().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to begin transaction");
            AppError::from(e)
        })?;

        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

/// 一个预订事务；未提交即丢弃时 sqlx 自动回滚
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn lock_room(&mut self, room_id: i64) -> Result<Option<RoomLock>, AppError> {
        // 行锁：同一房源的并发预订在此串行化
        let lock = sqlx::query_as::<_, RoomLock>(
            "SELECT price_cents, rooms_available FROM rooms WHERE id = $1 FOR UPDATE",
        )
        .bind(room_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, room_id, "Failed to lock room row");
            AppError::from(e)
        })?;

        Ok(lock)
    }

    async fn insert_booking(&mut self, booking: NewBooking) -> Result<Booking, AppError> {
        let created = sqlx::query_as::<_, Booking>(&format!(
            r#"
            INSERT INTO bookings (
                user_id, room_id, check_in, check_out, adults, children,
                rooms, total_price_cents, status, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(booking.user_id)
        .bind(booking.room_id)
        .bind(booking.check_in)
        .bind(booking.check_out)
        .bind(booking.adults)
        .bind(booking.children)
        .bind(booking.rooms)
        .bind(booking.total_price_cents)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| match &e {
            // 预订人不存在
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => AppError::NotFound,
            _ => {
                tracing::error!(error = %e, "Failed to insert booking");
                AppError::from(e)
            }
        })?;

        Ok(created)
    }

    async fn decrement_available(&mut self, room_id: i64, rooms: i32) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE rooms
            SET rooms_available = rooms_available - $2
            WHERE id = $1 AND rooms_available >= $2
            "#,
        )
        .bind(room_id)
        .bind(rooms)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, room_id, "Failed to decrement availability");
            AppError::from(e)
        })?;

        Ok(result.rows_affected() == 1)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to commit transaction");
            AppError::from(e)
        })
    }
}
