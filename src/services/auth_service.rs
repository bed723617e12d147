//! 认证服务：登录、登出、令牌校验与吊销

use crate::{
    auth::{
        credentials::{CredentialVerifier, PlaintextVerifier},
        jwt::{Claims, IssuedToken, JwtService},
        middleware::AuthContext,
        revocation::RevocationList,
    },
    clock::Clock,
    config::AppConfig,
    error::AppError,
    models::{
        auth::{LoginRequest, LoginResponse},
        user::{User, UserResponse},
    },
    repository::UserRepository,
};
use chrono::Duration;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt_service: Arc<JwtService>,
    revocations: RevocationList,
    verifier: Arc<dyn CredentialVerifier>,
    access_token_ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        jwt_service: Arc<JwtService>,
        clock: Arc<dyn Clock>,
        access_token_ttl: Duration,
    ) -> Self {
        Self {
            users,
            jwt_service,
            revocations: RevocationList::new(clock),
            verifier: Arc::new(PlaintextVerifier),
            access_token_ttl,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        let jwt_service = Arc::new(JwtService::from_config(config, clock.clone())?);
        let ttl = i64::try_from(config.security.access_token_exp_secs)
            .map(Duration::seconds)
            .map_err(|_| AppError::Config("access_token_exp_secs out of range".to_string()))?;

        Ok(Self::new(users, jwt_service, clock, ttl))
    }

    /// 替换密钥比对策略
    pub fn with_verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    /// 校验标识与密钥
    ///
    /// 未知标识与密钥错误返回同一个错误，不泄露是哪一项不对
    pub async fn authenticate(&self, identifier: &str, secret: &str) -> Result<User, AppError> {
        let user = match self.users.find_by_identifier(identifier).await? {
            Some(user) => user,
            None => {
                tracing::info!(%identifier, "Login rejected: unknown identifier");
                return Err(AppError::AuthenticationFailed);
            }
        };

        if !self.verifier.verify(secret, &user.secret) {
            tracing::info!(%identifier, "Login rejected: secret mismatch");
            return Err(AppError::AuthenticationFailed);
        }

        Ok(user)
    }

    /// 签发会话令牌，每次调用生成新的 jti
    pub fn issue_token(&self, user: &User, ttl: Duration) -> Result<IssuedToken, AppError> {
        self.jwt_service.issue(user, ttl)
    }

    /// 吊销 jti 直到 expires_at（unix 秒）
    pub fn revoke(&self, jti: &str, expires_at: i64) {
        self.revocations.revoke(jti, expires_at);
    }

    pub fn is_revoked(&self, jti: &str) -> bool {
        self.revocations.is_revoked(jti)
    }

    /// 请求级校验：签名、过期、吊销，按此顺序
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.jwt_service.verify(token)?;

        if self.revocations.is_revoked(&claims.jti) {
            tracing::debug!(jti = %claims.jti, "Rejected revoked token");
            return Err(AppError::TokenRevoked);
        }

        Ok(claims)
    }

    /// 用户登录
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let user = match self.authenticate(&req.identifier, &req.secret).await {
            Ok(user) => user,
            Err(e) => {
                metrics::counter!("auth_logins_total", "outcome" => "rejected").increment(1);
                return Err(e);
            }
        };

        let issued = self.issue_token(&user, self.access_token_ttl)?;
        metrics::counter!("auth_logins_total", "outcome" => "success").increment(1);

        tracing::info!(
            user_id = user.id,
            jti = %issued.claims.jti,
            "User logged in"
        );

        Ok(LoginResponse {
            access_token: issued.token,
            token_type: "Bearer".to_string(),
            expires_in: u64::try_from(self.access_token_ttl.num_seconds()).unwrap_or_default(),
            user: UserResponse::from(user),
        })
    }

    /// 登出：吊销当前令牌直到其自然过期
    pub fn logout(&self, context: &AuthContext) {
        self.revoke(&context.jti, context.expires_at);
        tracing::info!(user_id = context.user_id, jti = %context.jti, "User logged out");
    }

    /// 清理已过期的吊销条目
    pub fn purge_expired_revocations(&self) -> usize {
        self.revocations.purge_expired()
    }

    pub fn revoked_count(&self) -> usize {
        self.revocations.len()
    }

    /// 后台定期清理吊销表；服务释放后任务自行退出
    pub fn spawn_revocation_sweeper(
        self: &Arc<Self>,
        interval: std::time::Duration,
    ) -> JoinHandle<()> {
        let service: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // 第一次 tick 立即返回
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let Some(service) = service.upgrade() else {
                    break;
                };

                let removed = service.purge_expired_revocations();
                if removed > 0 {
                    tracing::debug!(
                        removed,
                        remaining = service.revoked_count(),
                        "Purged expired revocations"
                    );
                }
            }
        })
    }
}
