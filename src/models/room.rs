//! Room / hotel inventory models

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Bookable room inventory
///
/// `0 <= rooms_available <= rooms_total` holds at all times; only the booking
/// unit of work decrements `rooms_available`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub location: String,
    pub destination: String,
    pub rating: f64,
    pub reviews: i32,
    pub price_cents: i64,
    pub original_price_cents: Option<i64>,
    pub amenities: String,
    pub featured: bool,
    pub max_adults: i32,
    pub max_children: i32,
    pub rooms_total: i32,
    pub rooms_available: i32,
    pub status: String,
}

/// Price and availability read under the row lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct RoomLock {
    pub price_cents: i64,
    pub rooms_available: i32,
}

/// Create room request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateRoomRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: f64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub reviews: i32,
    #[validate(range(min = 0))]
    pub price_cents: i64,
    #[validate(range(min = 0))]
    pub original_price_cents: Option<i64>,
    #[serde(default)]
    pub amenities: String,
    #[serde(default)]
    pub featured: bool,
    #[validate(range(min = 0))]
    pub max_adults: Option<i32>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub max_children: i32,
    #[validate(range(min = 0))]
    pub rooms_total: Option<i32>,
    #[validate(range(min = 0))]
    pub rooms_available: Option<i32>,
    pub status: Option<String>,
}

/// Room ready for insertion, with defaults applied
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub name: String,
    pub description: String,
    pub location: String,
    pub destination: String,
    pub rating: f64,
    pub reviews: i32,
    pub price_cents: i64,
    pub original_price_cents: Option<i64>,
    pub amenities: String,
    pub featured: bool,
    pub max_adults: i32,
    pub max_children: i32,
    pub rooms_total: i32,
    pub rooms_available: i32,
    pub status: String,
}

impl From<CreateRoomRequest> for NewRoom {
    fn from(req: CreateRoomRequest) -> Self {
        let rooms_total = req.rooms_total.filter(|n| *n >= 1).unwrap_or(1);
        let status = req
            .status
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "active".to_string());

        Self {
            name: req.name,
            description: req.description,
            location: req.location,
            destination: req.destination,
            rating: req.rating,
            reviews: req.reviews,
            price_cents: req.price_cents,
            original_price_cents: req.original_price_cents,
            amenities: req.amenities,
            featured: req.featured,
            max_adults: req.max_adults.filter(|n| *n >= 1).unwrap_or(1),
            max_children: req.max_children,
            rooms_total,
            rooms_available: req.rooms_available.unwrap_or(rooms_total),
            status,
        }
    }
}

impl NewRoom {
    /// 检查库存不变量
    pub fn check_inventory(&self) -> Result<(), String> {
        if self.rooms_available < 0 || self.rooms_available > self.rooms_total {
            return Err(format!(
                "rooms_available must be between 0 and rooms_total ({})",
                self.rooms_total
            ));
        }
        if self.price_cents < 0 {
            return Err("price_cents must not be negative".to_string());
        }
        Ok(())
    }

    pub(crate) fn into_room(self, id: i64) -> Room {
        Room {
            id,
            name: self.name,
            description: self.description,
            location: self.location,
            destination: self.destination,
            rating: self.rating,
            reviews: self.reviews,
            price_cents: self.price_cents,
            original_price_cents: self.original_price_cents,
            amenities: self.amenities,
            featured: self.featured,
            max_adults: self.max_adults,
            max_children: self.max_children,
            rooms_total: self.rooms_total,
            rooms_available: self.rooms_available,
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateRoomRequest {
        CreateRoomRequest {
            name: "Riverside Suite".to_string(),
            price_cents: 12000,
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_applied() {
        let room = NewRoom::from(request());
        assert_eq!(room.status, "active");
        assert_eq!(room.rooms_total, 1);
        assert_eq!(room.rooms_available, 1);
        assert_eq!(room.max_adults, 1);
        assert!(room.check_inventory().is_ok());
    }

    #[test]
    fn test_unset_available_follows_total() {
        let room = NewRoom::from(CreateRoomRequest {
            rooms_total: Some(8),
            ..request()
        });
        assert_eq!(room.rooms_available, 8);

        let sold_out = NewRoom::from(CreateRoomRequest {
            rooms_total: Some(8),
            rooms_available: Some(0),
            ..request()
        });
        assert_eq!(sold_out.rooms_available, 0);
    }

    #[test]
    fn test_available_above_total_rejected() {
        let room = NewRoom::from(CreateRoomRequest {
            rooms_total: Some(2),
            rooms_available: Some(3),
            ..request()
        });
        assert!(room.check_inventory().is_err());
    }
}
