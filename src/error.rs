//! 统一错误模型
//! 定义所有错误类型和错误响应格式

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 应用错误类型
///
/// 业务拒绝（认证失败、库存不足等）与基础设施故障（存储不可用）
/// 映射到不同的状态码，调用方可以区分两者。
#[derive(Debug, Error)]
pub enum AppError {
    /// 标识或密钥错误，不透露具体是哪一项
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// 缺失、格式错误或签名无效的令牌
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Access denied")]
    Forbidden,

    #[error("Resource not found")]
    NotFound,

    #[error("check_out must be after check_in")]
    InvalidDateRange,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not enough rooms available")]
    InsufficientInventory,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Token signing failed: {0}")]
    TokenSigning(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// 获取 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthenticationFailed
            | AppError::Unauthorized
            | AppError::TokenExpired
            | AppError::TokenRevoked => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InvalidDateRange | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InsufficientInventory => StatusCode::CONFLICT,
            AppError::StorageUnavailable(_) | AppError::TokenSigning(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            AppError::AuthenticationFailed => "Invalid credentials".to_string(),
            AppError::Unauthorized => "Authentication required".to_string(),
            AppError::TokenExpired => "Token expired".to_string(),
            AppError::TokenRevoked => "Token revoked".to_string(),
            AppError::Forbidden => "Access denied".to_string(),
            AppError::NotFound => "Resource not found".to_string(),
            AppError::InvalidDateRange => "check_out must be after check_in".to_string(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::InsufficientInventory => "Not enough rooms available".to_string(),
            AppError::StorageUnavailable(_) => "Storage unavailable".to_string(),
            AppError::TokenSigning(_) => "Failed to create token".to_string(),
            AppError::Config(_) => "Configuration error".to_string(),
        }
    }

    /// 获取错误码
    pub fn code(&self) -> u16 {
        self.status_code().as_u16()
    }

    /// 是否为基础设施故障（而非业务拒绝）
    pub fn is_infrastructure(&self) -> bool {
        self.status_code().is_server_error()
    }
}

/// 错误响应 DTO
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub message: String,
    pub request_id: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code(),
                message: self.user_message(),
                request_id,
            },
        };

        if self.is_infrastructure() {
            tracing::error!(
                code = self.code(),
                message = %self,
                request_id = %error_response.error.request_id,
                "Application error"
            );
        } else {
            tracing::debug!(
                code = self.code(),
                message = %self,
                request_id = %error_response.error.request_id,
                "Request rejected"
            );
        }

        (status, Json(error_response)).into_response()
    }
}

/// 数据库错误一律视为存储不可用，细节只进日志
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::StorageUnavailable(e.to_string())
    }
}

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::AuthenticationFailed.code(), 401);
        assert_eq!(AppError::TokenRevoked.code(), 401);
        assert_eq!(AppError::Forbidden.code(), 403);
        assert_eq!(AppError::NotFound.code(), 404);
        assert_eq!(AppError::InvalidDateRange.code(), 400);
        assert_eq!(AppError::InsufficientInventory.code(), 409);
        assert_eq!(AppError::StorageUnavailable("down".to_string()).code(), 500);
    }

    #[test]
    fn test_user_message_no_sensitive_info() {
        let error = AppError::from(sqlx::Error::RowNotFound);
        let message = error.user_message();
        assert_eq!(message, "Storage unavailable");
        assert!(!message.contains("sqlx"));
    }
}
