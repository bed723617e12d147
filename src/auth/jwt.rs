//! JWT session token issuance and verification
//! HS256 signed, one access token per login, revocable by `jti`

use crate::{clock::Clock, config::AppConfig, error::AppError, models::user::{Role, User}};
use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// JWT claims for session tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user identifier)
    pub sub: String,

    /// Numeric user id, owner of bookings made with this token
    pub uid: i64,

    /// Authorization role
    pub role: Role,

    /// Issued at (unix seconds)
    pub iat: i64,

    /// Expiration (unix seconds)
    pub exp: i64,

    /// JWT ID (unique token identifier, revocation key)
    pub jti: String,
}

/// A freshly signed token together with the claims it carries
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// JWT service
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl JwtService {
    /// Create JWT service from a raw secret
    pub fn new(secret: &str, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        // Ensure secret is at least 32 bytes for HS256
        if secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        // Expiry is checked against the shared clock, not the library's wall clock
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        // jti 不在 jsonwebtoken 识别的名单内，由 Claims 反序列化保证存在
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            clock,
        })
    }

    /// Create JWT service from config
    pub fn from_config(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        Self::new(config.security.jwt_secret.expose_secret(), clock)
    }

    /// Sign a token for `user` valid for `ttl` from now
    pub fn issue(&self, user: &User, ttl: Duration) -> Result<IssuedToken, AppError> {
        let now = self.clock.now();
        let expiration = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::TokenSigning("token ttl out of range".to_string()))?;

        let claims = Claims {
            sub: user.identifier.clone(),
            uid: user.id,
            role: user.role,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(
            |e| {
                tracing::error!("Failed to encode session token: {:?}", e);
                AppError::TokenSigning(e.to_string())
            },
        )?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify signature and expiry. Revocation is checked by the caller.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {:?}", e);
                AppError::Unauthorized
            })?
            .claims;

        if self.clock.now().timestamp() >= claims.exp {
            tracing::debug!(jti = %claims.jti, "Token expired");
            return Err(AppError::TokenExpired);
        }

        Ok(claims)
    }
}
