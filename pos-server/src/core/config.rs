use std::path::PathBuf;

use crate::auth::JwtConfig;
use crate::core::ServerError;

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 |
/// | DATABASE_PATH | WORK_DIR/pos.db | SQLite 文件 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 (RUST_LOG 优先) |
/// | LOG_DIR | (stdout) | 日志目录，按天滚动 |
/// | LOG_JSON | false | JSON 日志 |
/// | BUS_CAPACITY | 1024 | 广播通道容量 |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | JWT_* | | 见 [`JwtConfig::from_env`] |
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    /// `None` = `WORK_DIR/pos.db`; `":memory:"` for an in-memory database
    pub database_path: Option<String>,
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub log_json: bool,
    pub bus_capacity: usize,
    pub request_timeout_ms: u64,
    pub jwt: JwtConfig,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ServerError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let jwt = JwtConfig::from_env(environment == "production")
            .map_err(|e| ServerError::Config(e.to_string()))?;

        let config = Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            database_path: std::env::var("DATABASE_PATH").ok().filter(|p| !p.is_empty()),
            http_port: env_or("HTTP_PORT", 3000),
            environment,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            log_json: env_or("LOG_JSON", false),
            bus_capacity: env_or("BUS_CAPACITY", crate::message::bus::DEFAULT_CHANNEL_CAPACITY),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30_000),
            jwt,
        };
        config.validate()?;
        Ok(config)
    }

    /// In-memory database, fixed JWT secret
    pub fn for_tests() -> Self {
        Self {
            work_dir: std::env::temp_dir().to_string_lossy().into_owned(),
            database_path: Some(":memory:".into()),
            http_port: 0,
            environment: "test".into(),
            log_level: "debug".into(),
            log_dir: None,
            log_json: false,
            bus_capacity: crate::message::bus::DEFAULT_CHANNEL_CAPACITY,
            request_timeout_ms: 5_000,
            jwt: JwtConfig::for_tests(),
        }
    }

    fn validate(&self) -> Result<(), ServerError> {
        if self.bus_capacity == 0 {
            return Err(ServerError::Config("BUS_CAPACITY must be greater than 0".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ServerError::Config("REQUEST_TIMEOUT_MS must be greater than 0".into()));
        }
        Ok(())
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_deref() == Some(":memory:")
    }

    /// Resolved database file path
    pub fn database_file(&self) -> PathBuf {
        match &self.database_path {
            Some(p) => PathBuf::from(p),
            None => PathBuf::from(&self.work_dir).join("pos.db"),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 确保工作目录与数据库目录存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        if !self.is_in_memory()
            && let Some(parent) = self.database_file().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_file_defaults_to_work_dir() {
        let mut config = Config::for_tests();
        config.database_path = None;
        config.work_dir = "/srv/pos".into();
        assert_eq!(config.database_file(), PathBuf::from("/srv/pos/pos.db"));
        assert!(!config.is_in_memory());
        assert!(Config::for_tests().is_in_memory());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut config = Config::for_tests();
        config.bus_capacity = 0;
        assert!(matches!(config.validate(), Err(ServerError::Config(_))));
    }
}
