//! 数据模型模块
//! 用户、房源、线路与预订

pub mod auth;
pub mod booking;
pub mod room;
pub mod tour;
pub mod user;

/// 数据库中的文本列无法解析为枚举
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}
