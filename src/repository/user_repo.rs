//! User repository (数据库访问层)

use crate::{
    error::AppError,
    models::user::{NewUser, User},
};
use async_trait::async_trait;
use sqlx::PgPool;

use super::UserRepository;

pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    /// 根据登录标识查找用户
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, identifier, display_name, secret, role FROM users WHERE identifier = $1",
        )
        .bind(identifier)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// 创建用户
    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (identifier, display_name, secret, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, identifier, display_name, secret, role
            "#,
        )
        .bind(&user.identifier)
        .bind(&user.display_name)
        .bind(&user.secret)
        .bind(user.role.as_str())
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::BadRequest("identifier already registered".to_string())
            }
            _ => AppError::from(e),
        })?;

        Ok(created)
    }
}
