//! Tour repository (数据库访问层)

use crate::{
    error::AppError,
    models::tour::{CreateTourRequest, Tour},
};
use async_trait::async_trait;
use sqlx::PgPool;

use super::TourRepository;

pub struct PgTourRepository {
    db: PgPool,
}

impl PgTourRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TourRepository for PgTourRepository {
    async fn list_all(&self) -> Result<Vec<Tour>, AppError> {
        let tours = sqlx::query_as::<_, Tour>(
            "SELECT id, title, description, price_cents FROM tours ORDER BY id",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(tours)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Tour>, AppError> {
        let tour = sqlx::query_as::<_, Tour>(
            "SELECT id, title, description, price_cents FROM tours WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(tour)
    }

    async fn insert(&self, tour: CreateTourRequest) -> Result<Tour, AppError> {
        let created = sqlx::query_as::<_, Tour>(
            r#"
            INSERT INTO tours (title, description, price_cents)
            VALUES ($1, $2, $3)
            RETURNING id, title, description, price_cents
            "#,
        )
        .bind(&tour.title)
        .bind(&tour.description)
        .bind(tour.price_cents)
        .fetch_one(&self.db)
        .await?;

        Ok(created)
    }
}
