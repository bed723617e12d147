//! Booking domain models and pricing

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ParseEnumError;

/// 预订状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// 待确认（新建预订的初始状态）
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = ParseEnumError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            _ => Err(ParseEnumError { kind: "booking status", value: s }),
        }
    }
}

/// 预订记录，创建后不再修改
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub room_id: i64,
    pub check_in: NaiveDate,
    /// 离店日期（不含当晚）
    pub check_out: NaiveDate,
    pub adults: i32,
    pub children: i32,
    pub rooms: i32,
    pub total_price_cents: i64,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// 预订协调器的输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReserveRequest {
    pub room_id: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: i32,
    pub children: i32,
    pub rooms: i32,
}

/// 在事务中写入的预订行
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: i64,
    pub room_id: i64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: i32,
    pub children: i32,
    pub rooms: i32,
    pub total_price_cents: i64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl NewBooking {
    pub(crate) fn into_booking(self, id: i64) -> Booking {
        Booking {
            id,
            user_id: self.user_id,
            room_id: self.room_id,
            check_in: self.check_in,
            check_out: self.check_out,
            adults: self.adults,
            children: self.children,
            rooms: self.rooms,
            total_price_cents: self.total_price_cents,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// 创建预订请求（HTTP 层）
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(alias = "hotel_id")]
    pub room_id: i64,
    /// YYYY-MM-DD
    pub check_in: String,
    /// YYYY-MM-DD
    pub check_out: String,
    #[serde(default)]
    pub adults: i32,
    #[serde(default)]
    pub children: i32,
    #[serde(default)]
    pub rooms: i32,
}

/// 入住晚数，至少按一晚计
pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days().max(1)
}

/// 总价 = 每晚单价 × 晚数 × 房间数，溢出时返回 None
pub fn quote_total(price_cents: i64, nights: i64, rooms: i32) -> Option<i64> {
    price_cents
        .checked_mul(nights)?
        .checked_mul(i64::from(rooms))
}
