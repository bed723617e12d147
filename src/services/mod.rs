//! Business logic services layer

pub mod auth_service;
pub mod booking_service;
pub mod catalog_service;

pub use auth_service::AuthService;
pub use booking_service::BookingService;
pub use catalog_service::CatalogService;
