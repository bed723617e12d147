//! Database repository layer
//!
//! Storage contracts consumed by the services, with a PostgreSQL implementation
//! and an in-memory one for local runs and tests.

pub mod booking_repo;
pub mod memory;
pub mod room_repo;
pub mod tour_repo;
pub mod user_repo;

pub use booking_repo::{PgBookingRepository, PgReservationStore};
pub use memory::MemoryStore;
pub use room_repo::PgRoomRepository;
pub use tour_repo::PgTourRepository;
pub use user_repo::PgUserRepository;

use crate::{
    error::AppError,
    models::{
        booking::{Booking, NewBooking},
        room::{NewRoom, Room, RoomLock},
        tour::{CreateTourRequest, Tour},
        user::{NewUser, User},
    },
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

/// Credential store
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, AppError>;

    /// Assigns the id; a duplicate identifier is rejected
    async fn insert(&self, user: NewUser) -> Result<User, AppError>;
}

/// Inventory store (read side and provisioning)
#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Room>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Room>, AppError>;

    async fn insert(&self, room: NewRoom) -> Result<Room, AppError>;
}

#[async_trait]
pub trait TourRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Tour>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Tour>, AppError>;

    async fn insert(&self, tour: CreateTourRequest) -> Result<Tour, AppError>;
}

/// Reservation ledger (read side)
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Newest first by creation time
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Booking>, AppError>;
}

/// One atomic, isolated reservation.
///
/// Dropping a unit of work without calling [`UnitOfWork::commit`] discards every
/// write made through it and releases the row lock.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Lock the room row exclusively until commit or drop
    async fn lock_room(&mut self, room_id: i64) -> Result<Option<RoomLock>, AppError>;

    async fn insert_booking(&mut self, booking: NewBooking) -> Result<Booking, AppError>;

    /// Decrement availability only if it is still `>= rooms`; false if nothing changed
    async fn decrement_available(&mut self, room_id: i64, rooms: i32) -> Result<bool, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}

#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>, AppError>;
}

/// 存储实现集合，由启动代码按配置选择后端
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub rooms: Arc<dyn RoomRepository>,
    pub tours: Arc<dyn TourRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub reservations: Arc<dyn ReservationStore>,
}

impl Repositories {
    pub fn postgres(db: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(db.clone())),
            rooms: Arc::new(PgRoomRepository::new(db.clone())),
            tours: Arc::new(PgTourRepository::new(db.clone())),
            bookings: Arc::new(PgBookingRepository::new(db.clone())),
            reservations: Arc::new(PgReservationStore::new(db)),
        }
    }

    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            rooms: store.clone(),
            tours: store.clone(),
            bookings: store.clone(),
            reservations: store,
        }
    }
}
