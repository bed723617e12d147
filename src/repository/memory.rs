//! In-memory storage backend
//!
//! Each room row has its own `tokio::sync::Mutex`, which plays the role of
//! `SELECT ... FOR UPDATE`: reservations on one room serialize, different rooms
//! proceed in parallel. Writes made through a unit of work are staged and only
//! applied to the committed row on commit. Plain reads see the committed row
//! and never wait on a row lock.

use crate::{
    error::AppError,
    models::{
        booking::{Booking, NewBooking},
        room::{NewRoom, Room, RoomLock},
        tour::{CreateTourRequest, Tour},
        user::{NewUser, Role, User},
    },
};
use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{
    BookingRepository, ReservationStore, RoomRepository, TourRepository, UnitOfWork,
    UserRepository,
};

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    rooms: DashMap<i64, Room>,
    row_locks: DashMap<i64, Arc<Mutex<()>>>,
    tours: DashMap<i64, Tour>,
    bookings: DashMap<i64, Booking>,
    next_user_id: AtomicI64,
    next_room_id: AtomicI64,
    next_tour_id: AtomicI64,
    next_booking_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 带演示数据的存储：一个管理员、一个普通用户、一个房源、两条线路
    pub fn with_demo_data() -> Self {
        let store = Self::new();

        let users = [
            ("admin@agodrift.dev", "Admin User", "adminpass", Role::Admin),
            ("alice@example.com", "Alice Traveler", "userpass", Role::User),
        ];
        for (identifier, display_name, secret, role) in users {
            // Seeding an empty store cannot collide
            let _ = store.insert_user_sync(NewUser {
                identifier: identifier.to_string(),
                display_name: display_name.to_string(),
                secret: secret.to_string(),
                role,
            });
        }

        store.insert_room_sync(NewRoom {
            name: "Demo Hotel".to_string(),
            description: "Demo".to_string(),
            location: "Demo".to_string(),
            destination: "Demo".to_string(),
            rating: 4.5,
            reviews: 10,
            price_cents: 15000,
            original_price_cents: None,
            amenities: "Wi-Fi".to_string(),
            featured: true,
            max_adults: 2,
            max_children: 1,
            rooms_total: 10,
            rooms_available: 5,
            status: "active".to_string(),
        });

        for (title, description, price_cents) in [
            ("Bangkok Highlights", "City tour", 15000),
            ("Chiang Mai Trek", "Jungle trek", 25000),
        ] {
            store.insert_tour_sync(CreateTourRequest {
                title: title.to_string(),
                description: description.to_string(),
                price_cents,
            });
        }

        store
    }

    fn insert_user_sync(&self, user: NewUser) -> Result<User, AppError> {
        match self.users.entry(user.identifier.clone()) {
            Entry::Occupied(_) => Err(AppError::BadRequest(
                "identifier already registered".to_string(),
            )),
            Entry::Vacant(slot) => {
                let created = User {
                    id: self.next_user_id.fetch_add(1, Ordering::SeqCst) + 1,
                    identifier: user.identifier,
                    display_name: user.display_name,
                    secret: user.secret,
                    role: user.role,
                };
                slot.insert(created.clone());
                Ok(created)
            }
        }
    }

    fn insert_room_sync(&self, room: NewRoom) -> Room {
        let id = self.next_room_id.fetch_add(1, Ordering::SeqCst) + 1;
        let room = room.into_room(id);
        self.row_locks.insert(id, Arc::new(Mutex::new(())));
        self.rooms.insert(id, room.clone());
        room
    }

    fn insert_tour_sync(&self, tour: CreateTourRequest) -> Tour {
        let id = self.next_tour_id.fetch_add(1, Ordering::SeqCst) + 1;
        let tour = Tour {
            id,
            title: tour.title,
            description: tour.description,
            price_cents: tour.price_cents,
        };
        self.tours.insert(id, tour.clone());
        tour
    }

    fn row_lock(&self, id: i64) -> Option<Arc<Mutex<()>>> {
        self.row_locks.get(&id).map(|lock| Arc::clone(lock.value()))
    }

    fn user_exists(&self, user_id: i64) -> bool {
        self.users.iter().any(|u| u.value().id == user_id)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(identifier).map(|u| u.value().clone()))
    }

    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        self.insert_user_sync(user)
    }
}

#[async_trait]
impl RoomRepository for MemoryStore {
    async fn list_all(&self) -> Result<Vec<Room>, AppError> {
        let mut rooms: Vec<Room> = self.rooms.iter().map(|r| r.value().clone()).collect();
        rooms.sort_by_key(|r| r.id);

        Ok(rooms)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Room>, AppError> {
        Ok(self.rooms.get(&id).map(|r| r.value().clone()))
    }

    async fn insert(&self, room: NewRoom) -> Result<Room, AppError> {
        Ok(self.insert_room_sync(room))
    }
}

#[async_trait]
impl TourRepository for MemoryStore {
    async fn list_all(&self) -> Result<Vec<Tour>, AppError> {
        let mut tours: Vec<Tour> = self.tours.iter().map(|t| t.value().clone()).collect();
        tours.sort_by_key(|t| t.id);
        Ok(tours)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Tour>, AppError> {
        Ok(self.tours.get(&id).map(|t| t.value().clone()))
    }

    async fn insert(&self, tour: CreateTourRequest) -> Result<Tour, AppError> {
        Ok(self.insert_tour_sync(tour))
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Booking>, AppError> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| b.value().user_id == user_id)
            .map(|b| b.value().clone())
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(bookings)
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>, AppError> {
        Ok(Box::new(MemoryUnitOfWork {
            store: self,
            locked: None,
            staged_bookings: Vec::new(),
            staged_decrement: 0,
        }))
    }
}

struct MemoryUnitOfWork<'a> {
    store: &'a MemoryStore,
    locked: Option<LockedRow>,
    staged_bookings: Vec<Booking>,
    staged_decrement: i32,
}

/// 持有行锁时读到的已提交行
struct LockedRow {
    room_id: i64,
    _guard: OwnedMutexGuard<()>,
    price_cents: i64,
    rooms_available: i32,
}

impl MemoryUnitOfWork<'_> {
    fn snapshot(&self) -> Option<RoomLock> {
        self.locked.as_ref().map(|row| RoomLock {
            price_cents: row.price_cents,
            rooms_available: row.rooms_available - self.staged_decrement,
        })
    }
}

#[async_trait]
impl<'a> UnitOfWork for MemoryUnitOfWork<'a> {
    async fn lock_room(&mut self, room_id: i64) -> Result<Option<RoomLock>, AppError> {
        match &self.locked {
            Some(row) if row.room_id == room_id => return Ok(self.snapshot()),
            Some(row) => {
                return Err(AppError::StorageUnavailable(format!(
                    "unit of work already holds the lock on room {}",
                    row.room_id
                )))
            }
            None => {}
        }

        let Some(lock) = self.store.row_lock(room_id) else {
            return Ok(None);
        };
        let guard = lock.lock_owned().await;

        // 拿到行锁后再读已提交的行，期间不会有其他提交
        let Some((price_cents, rooms_available)) = self
            .store
            .rooms
            .get(&room_id)
            .map(|r| (r.price_cents, r.rooms_available))
        else {
            return Ok(None);
        };
        self.locked = Some(LockedRow {
            room_id,
            _guard: guard,
            price_cents,
            rooms_available,
        });

        Ok(self.snapshot())
    }

    async fn insert_booking(&mut self, booking: NewBooking) -> Result<Booking, AppError> {
        if !self.store.user_exists(booking.user_id) {
            return Err(AppError::NotFound);
        }

        let id = self.store.next_booking_id.fetch_add(1, Ordering::SeqCst) + 1;
        let booking = booking.into_booking(id);
        self.staged_bookings.push(booking.clone());
        Ok(booking)
    }

    async fn decrement_available(&mut self, room_id: i64, rooms: i32) -> Result<bool, AppError> {
        let Some(current) = self.lock_room(room_id).await? else {
            return Ok(false);
        };

        if current.rooms_available < rooms {
            return Ok(false);
        }
        self.staged_decrement += rooms;
        Ok(true)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryUnitOfWork {
            store,
            locked,
            staged_bookings,
            staged_decrement,
        } = *self;

        // No await below: commit applies entirely or not at all.
        // The row lock is held until the committed row is updated.
        if let Some(row) = &locked {
            if let Some(mut room) = store.rooms.get_mut(&row.room_id) {
                room.rooms_available -= staged_decrement;
            }
        }
        for booking in staged_bookings {
            store.bookings.insert(booking.id, booking);
        }
        drop(locked);

        Ok(())
    }
}
