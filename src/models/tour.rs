//! Tour catalog models

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tour {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price_cents: i64,
}

/// Create tour request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTourRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0))]
    pub price_cents: i64,
}
