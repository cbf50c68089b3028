//! JWT 令牌服务
//!
//! 令牌由外部身份服务签发；本服务只负责校验并解析出 [`CurrentUser`]。
//! `generate_token` 供开发环境和测试使用。

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use shared::models::ADMIN_ROLE_SLUG;
use thiserror::Error;

/// Minimum accepted secret length
pub const MIN_SECRET_LEN: usize = 32;

/// JWT 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// 共享密钥 (至少 32 字节)
    pub secret: String,
    /// 令牌过期时间 (分钟)
    pub expiration_minutes: i64,
    pub issuer: String,
    pub audience: String,
}

impl JwtConfig {
    /// 从环境变量加载
    ///
    /// `JWT_SECRET` 缺失时：开发环境生成临时密钥，生产环境报错。
    pub fn from_env(production: bool) -> Result<Self, JwtError> {
        let secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if secret.len() < MIN_SECRET_LEN => {
                return Err(JwtError::ConfigError(format!(
                    "JWT_SECRET must be at least {MIN_SECRET_LEN} characters long"
                )));
            }
            Ok(secret) => secret,
            Err(_) if production => {
                return Err(JwtError::ConfigError(
                    "JWT_SECRET must be set in production".to_string(),
                ));
            }
            Err(_) => {
                tracing::warn!("JWT_SECRET not set, generating a temporary development key");
                generate_secret()
            }
        };

        Ok(Self {
            secret,
            expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(720), // 一个营业夜
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "nightclub-identity".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "pos-server".into()),
        })
    }

    /// Fixed configuration for tests
    pub fn for_tests() -> Self {
        Self {
            secret: "test-secret-test-secret-test-secret-0123".into(),
            expiration_minutes: 60,
            issuer: "nightclub-identity".into(),
            audience: "pos-server".into(),
        }
    }
}

/// 令牌中的 Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 用户 ID
    pub sub: String,
    pub username: String,
    /// 角色 slug (admin, mesero, bartender, ...)
    pub role: String,
    /// 权限列表 (逗号分隔)
    pub permissions: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// 生成 64 位可打印随机密钥
pub fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

#[derive(Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 签发令牌 (开发/测试)
    pub fn generate_token(
        &self,
        user_id: i64,
        username: &str,
        role: &str,
        permissions: &[String],
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role: role.to_string(),
            permissions: permissions.join(","),
            exp: (now + Duration::minutes(self.config.expiration_minutes)).timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// 验证并解码令牌
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            })
    }

    /// 从 Authorization 头提取令牌
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }
}

/// 当前用户上下文
///
/// 由认证中间件注入请求扩展，handler 通过 `Extension<CurrentUser>` 取用。
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    /// 角色 slug
    pub role: String,
    pub permissions: Vec<String>,
}

impl TryFrom<Claims> for CurrentUser {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse()
            .map_err(|_| JwtError::InvalidToken(format!("Subject is not a user id: {}", claims.sub)))?;
        let permissions = claims
            .permissions
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            id,
            username: claims.username,
            role: claims.role,
            permissions,
        })
    }
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE_SLUG
    }

    /// 权限检查
    ///
    /// - admin 角色与 `"all"` 拥有全部权限
    /// - `"orders:*"` 匹配 `"orders:update"` 等
    pub fn has_permission(&self, permission: &str) -> bool {
        if self.is_admin() {
            return true;
        }
        self.permissions.iter().any(|p| {
            p == "all"
                || p == permission
                || p
                    .strip_suffix(":*")
                    .is_some_and(|prefix| {
                        permission
                            .strip_prefix(prefix)
                            .is_some_and(|rest| rest.starts_with(':'))
                    })
        })
    }
}
