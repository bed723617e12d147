//! User domain models

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ParseEnumError;

/// Authorization role carried in session tokens
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Role {
    type Error = ParseEnumError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(ParseEnumError { kind: "role", value: s }),
        }
    }
}

/// User account
///
/// The secret never leaves the service layer; callers get [`UserResponse`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub identifier: String,
    pub display_name: String,
    pub secret: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
}

/// Account provisioning input; the store assigns the id
#[derive(Debug, Clone)]
pub struct NewUser {
    pub identifier: String,
    pub display_name: String,
    pub secret: String,
    pub role: Role,
}

/// User response (without sensitive data)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub identifier: String,
    pub display_name: String,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            identifier: user.identifier,
            display_name: user.display_name,
            role: user.role,
        }
    }
}
