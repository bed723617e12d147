//! 预订协调器
//!
//! 一次预订是一个原子单元：锁定房源行、检查库存、计价、写入待确认预订、
//! 条件扣减库存、提交。任何一步失败都整体回滚，不会超卖。

use crate::{
    clock::Clock,
    config::AppConfig,
    error::AppError,
    models::booking::{
        nights_between, quote_total, Booking, BookingStatus, NewBooking, ReserveRequest,
    },
    repository::{BookingRepository, ReservationStore},
};
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;

pub struct BookingService {
    reservations: Arc<dyn ReservationStore>,
    bookings: Arc<dyn BookingRepository>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl BookingService {
    pub fn new(
        reservations: Arc<dyn ReservationStore>,
        bookings: Arc<dyn BookingRepository>,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> Self {
        Self {
            reservations,
            bookings,
            clock,
            timeout,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        reservations: Arc<dyn ReservationStore>,
        bookings: Arc<dyn BookingRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(
            reservations,
            bookings,
            clock,
            Duration::from_secs(config.booking.reservation_timeout_secs),
        )
    }

    /// 创建预订
    ///
    /// 事务在独立任务中运行：调用方被取消时事务仍会完整提交或回滚，
    /// 不会停在中间状态。超过时限的事务被丢弃并回滚，返回 StorageUnavailable。
    pub async fn reserve(
        &self,
        user_id: i64,
        request: ReserveRequest,
    ) -> Result<Booking, AppError> {
        validate_request(&request)?;

        let store = Arc::clone(&self.reservations);
        let clock = Arc::clone(&self.clock);
        let limit = self.timeout;
        let room_id = request.room_id;
        let started = Instant::now();

        let task = tokio::spawn(async move {
            match tokio::time::timeout(
                limit,
                run_reservation(store.as_ref(), clock.as_ref(), user_id, request),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(AppError::StorageUnavailable(format!(
                    "reservation did not complete within {}ms",
                    limit.as_millis()
                ))),
            }
        });

        let result = task.await.unwrap_or_else(|e| {
            Err(AppError::StorageUnavailable(format!(
                "reservation task failed: {e}"
            )))
        });

        let elapsed = started.elapsed();
        metrics::histogram!("booking_reserve_duration_seconds").record(elapsed.as_secs_f64());

        match &result {
            Ok(booking) => {
                metrics::counter!("bookings_total", "outcome" => "created").increment(1);
                tracing::info!(
                    booking_id = booking.id,
                    user_id,
                    room_id,
                    rooms = booking.rooms,
                    total_price_cents = booking.total_price_cents,
                    "Booking created"
                );
            }
            Err(AppError::InsufficientInventory) => {
                metrics::counter!("bookings_total", "outcome" => "sold_out").increment(1);
                tracing::info!(user_id, room_id, "Booking rejected: insufficient inventory");
            }
            Err(e) if e.is_infrastructure() => {
                metrics::counter!("bookings_total", "outcome" => "failed").increment(1);
                tracing::error!(
                    user_id,
                    room_id,
                    error = %e,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Booking failed"
                );
            }
            Err(e) => {
                metrics::counter!("bookings_total", "outcome" => "rejected").increment(1);
                tracing::debug!(user_id, room_id, error = %e, "Booking rejected");
            }
        }

        result
    }

    /// 用户的预订列表，按创建时间倒序
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Booking>, AppError> {
        self.bookings.list_by_user(user_id).await
    }
}

/// 输入检查，不触碰存储。日期范围最先检查
fn validate_request(request: &ReserveRequest) -> Result<(), AppError> {
    if request.check_out <= request.check_in {
        return Err(AppError::InvalidDateRange);
    }
    if request.rooms < 1 {
        return Err(AppError::BadRequest("rooms must be at least 1".to_string()));
    }
    if request.adults < 1 {
        return Err(AppError::BadRequest("adults must be at least 1".to_string()));
    }
    if request.children < 0 {
        return Err(AppError::BadRequest("children must not be negative".to_string()));
    }
    Ok(())
}

async fn run_reservation(
    store: &dyn ReservationStore,
    clock: &dyn Clock,
    user_id: i64,
    request: ReserveRequest,
) -> Result<Booking, AppError> {
    // 提前返回时 uow 被丢弃，所有写入随之回滚
    let mut uow = store.begin().await?;

    let room = uow
        .lock_room(request.room_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if room.rooms_available < request.rooms {
        return Err(AppError::InsufficientInventory);
    }

    let nights = nights_between(request.check_in, request.check_out);
    let total_price_cents = quote_total(room.price_cents, nights, request.rooms)
        .ok_or_else(|| AppError::BadRequest("total price out of range".to_string()))?;

    let booking = uow
        .insert_booking(NewBooking {
            user_id,
            room_id: request.room_id,
            check_in: request.check_in,
            check_out: request.check_out,
            adults: request.adults,
            children: request.children,
            rooms: request.rooms,
            total_price_cents,
            status: BookingStatus::Pending,
            created_at: clock.now(),
        })
        .await?;

    if !uow.decrement_available(request.room_id, request.rooms).await? {
        return Err(AppError::InsufficientInventory);
    }

    uow.commit().await?;

    Ok(booking)
}
