//! PostgreSQL 存储层测试
//!
//! 需要可用的数据库：TEST_DATABASE_URL=... cargo test -- --ignored

use booking_system::{
    error::AppError,
    models::{
        booking::{BookingStatus, NewBooking, ReserveRequest},
        room::{CreateRoomRequest, NewRoom},
        tour::CreateTourRequest,
        user::{NewUser, Role},
    },
    repository::{
        BookingRepository, PgBookingRepository, PgReservationStore, PgRoomRepository,
        PgTourRepository, PgUserRepository, ReservationStore, RoomRepository, TourRepository,
        UserRepository,
    },
    services::BookingService,
};
use chrono::{NaiveDate, Utc};
use serial_test::serial;
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};

mod common;
use common::{create_test_config, setup_test_db};

fn new_user(identifier: &str) -> NewUser {
    NewUser {
        identifier: identifier.to_string(),
        display_name: "Test User".to_string(),
        secret: "secret".to_string(),
        role: Role::User,
    }
}

fn new_room(available: i32) -> NewRoom {
    NewRoom::from(CreateRoomRequest {
        name: "Test Hotel".to_string(),
        price_cents: 12000,
        rooms_total: Some(5),
        rooms_available: Some(available),
        ..Default::default()
    })
}

fn new_booking(user_id: i64, room_id: i64, rooms: i32) -> NewBooking {
    NewBooking {
        user_id,
        room_id,
        check_in: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        check_out: NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
        adults: 1,
        children: 0,
        rooms,
        total_price_cents: 24000 * i64::from(rooms),
        status: BookingStatus::Pending,
        created_at: Utc::now(),
    }
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_user_insert_and_find() {
    let pool = setup_test_db(&create_test_config()).await;
    let users = PgUserRepository::new(pool);

    let created = users.insert(new_user("bob@example.com")).await.unwrap();
    let found = users
        .find_by_identifier("bob@example.com")
        .await
        .unwrap()
        .expect("user not found");
    assert_eq!(found.id, created.id);
    assert_eq!(found.role, Role::User);

    let err = users.insert(new_user("bob@example.com")).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_room_and_tour_catalog() {
    let pool = setup_test_db(&create_test_config()).await;
    let rooms = PgRoomRepository::new(pool.clone());
    let tours = PgTourRepository::new(pool);

    let room = rooms.insert(new_room(5)).await.unwrap();
    assert_eq!(rooms.find_by_id(room.id).await.unwrap().unwrap().name, "Test Hotel");
    assert_eq!(rooms.list_all().await.unwrap().len(), 1);

    let tour = tours
        .insert(CreateTourRequest {
            title: "River Cruise".to_string(),
            description: String::new(),
            price_cents: 5000,
        })
        .await
        .unwrap();
    assert_eq!(tours.find_by_id(tour.id).await.unwrap().unwrap().price_cents, 5000);
    assert!(tours.find_by_id(tour.id + 1).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_unit_of_work_commit_and_rollback() {
    let pool = setup_test_db(&create_test_config()).await;
    let users = PgUserRepository::new(pool.clone());
    let rooms = PgRoomRepository::new(pool.clone());
    let bookings = PgBookingRepository::new(pool.clone());
    let store = PgReservationStore::new(pool);

    let user = users.insert(new_user("carol@example.com")).await.unwrap();
    let room = rooms.insert(new_room(3)).await.unwrap();

    // 丢弃未提交的事务
    {
        let mut uow = store.begin().await.unwrap();
        let locked = uow.lock_room(room.id).await.unwrap().unwrap();
        assert_eq!(locked.rooms_available, 3);
        uow.insert_booking(new_booking(user.id, room.id, 2)).await.unwrap();
        assert!(uow.decrement_available(room.id, 2).await.unwrap());
    }
    assert_eq!(rooms.find_by_id(room.id).await.unwrap().unwrap().rooms_available, 3);
    assert!(bookings.list_by_user(user.id).await.unwrap().is_empty());

    let mut uow = store.begin().await.unwrap();
    uow.lock_room(room.id).await.unwrap();
    let booking = uow.insert_booking(new_booking(user.id, room.id, 2)).await.unwrap();
    assert!(uow.decrement_available(room.id, 2).await.unwrap());
    // 条件扣减不会让库存变成负数
    assert!(!uow.decrement_available(room.id, 2).await.unwrap());
    uow.commit().await.unwrap();

    assert_eq!(rooms.find_by_id(room.id).await.unwrap().unwrap().rooms_available, 1);
    let mine = bookings.list_by_user(user.id).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, booking.id);
    assert_eq!(mine[0].status, BookingStatus::Pending);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_unknown_room_lock_returns_none() {
    let pool = setup_test_db(&create_test_config()).await;
    let store = PgReservationStore::new(pool);

    let mut uow = store.begin().await.unwrap();
    assert!(uow.lock_room(404).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_unknown_owner_is_not_found() {
    let pool = setup_test_db(&create_test_config()).await;
    let rooms = PgRoomRepository::new(pool.clone());
    let store = PgReservationStore::new(pool);

    let room = rooms.insert(new_room(3)).await.unwrap();

    let mut uow = store.begin().await.unwrap();
    uow.lock_room(room.id).await.unwrap();
    let err = uow.insert_booking(new_booking(9999, room.id, 1)).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

fn reserve_request(room_id: i64, rooms: i32) -> ReserveRequest {
    ReserveRequest {
        room_id,
        check_in: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        check_out: NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
        adults: 2,
        children: 0,
        rooms,
    }
}

fn pg_booking_service(pool: PgPool) -> BookingService {
    BookingService::new(
        Arc::new(PgReservationStore::new(pool.clone())),
        Arc::new(PgBookingRepository::new(pool)),
        common::test_clock(),
        Duration::from_secs(10),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
#[serial]
async fn test_competing_reservations_never_oversell() {
    let pool = setup_test_db(&create_test_config()).await;
    let users = PgUserRepository::new(pool.clone());
    let rooms = PgRoomRepository::new(pool.clone());

    let dave = users.insert(new_user("dave@example.com")).await.unwrap();
    let erin = users.insert(new_user("erin@example.com")).await.unwrap();
    let room = rooms.insert(new_room(5)).await.unwrap();
    let room_id = room.id;
    let service = Arc::new(pg_booking_service(pool.clone()));

    let handles: Vec<_> = [dave.id, erin.id]
        .into_iter()
        .map(|user_id| {
            let service = service.clone();
            tokio::spawn(async move { service.reserve(user_id, reserve_request(room_id, 3)).await })
        })
        .collect();

    let mut created = 0;
    let mut sold_out = 0;
    for result in futures::future::join_all(handles).await {
        match result.unwrap() {
            Ok(_) => created += 1,
            Err(AppError::InsufficientInventory) => sold_out += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(sold_out, 1);
    assert_eq!(rooms.find_by_id(room.id).await.unwrap().unwrap().rooms_available, 2);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE room_id = $1")
        .bind(room.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore]
#[serial]
async fn test_inventory_is_conserved_under_load() {
    let pool = setup_test_db(&create_test_config()).await;
    let users = PgUserRepository::new(pool.clone());
    let rooms = PgRoomRepository::new(pool.clone());

    let user = users.insert(new_user("frank@example.com")).await.unwrap();
    let room = rooms.insert(new_room(5)).await.unwrap();
    let (user_id, room_id) = (user.id, room.id);
    let service = Arc::new(pg_booking_service(pool.clone()));

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.reserve(user_id, reserve_request(room_id, 1)).await })
        })
        .collect();

    let mut booked = 0;
    for result in futures::future::join_all(handles).await {
        match result.unwrap() {
            Ok(booking) => booked += booking.rooms,
            Err(AppError::InsufficientInventory) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(booked, 5);
    assert_eq!(rooms.find_by_id(room.id).await.unwrap().unwrap().rooms_available, 0);

    let ledger = PgBookingRepository::new(pool)
        .list_by_user(user.id)
        .await
        .unwrap();
    assert_eq!(ledger.len(), 5);
    assert_eq!(ledger.iter().map(|b| b.rooms).sum::<i32>(), 5);
}
