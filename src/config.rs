use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

/// 库存台账配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// 并发冲突时的最大尝试次数 (compare-and-swap)
    #[serde(default = "default_max_update_attempts")]
    pub max_update_attempts: u32,
    /// true: 库存更新与审计记录在同一事务中，审计写入失败则整体回滚
    /// false: 审计写入失败只记录错误日志，库存更新保留
    #[serde(default)]
    pub strict_audit: bool,
    #[serde(default = "default_history_limit")]
    pub history_default_limit: u64,
    #[serde(default = "default_history_max_limit")]
    pub history_max_limit: u64,
}

fn default_max_update_attempts() -> u32 {
    3
}

fn default_history_limit() -> u64 {
    50
}

fn default_history_max_limit() -> u64 {
    200
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            max_update_attempts: default_max_update_attempts(),
            strict_audit: false,
            history_default_limit: default_history_limit(),
            history_max_limit: default_history_max_limit(),
        }
    }
}

impl Config {
    pub fn from_toml() -> AppResult<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse_toml(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_env_defaults()?,
            Err(e) => {
                return Err(AppError::ConfigError(format!(
                    "Unable to read config file {config_path}: {e}"
                )));
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn parse_toml(config_str: &str) -> AppResult<Self> {
        toml::from_str(config_str)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {e}")))
    }

    fn from_env_defaults() -> AppResult<Self> {
        fn get_env(name: &str) -> Option<String> {
            env::var(name).ok()
        }
        fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
            env::var(name)
                .ok()
                .and_then(|v| v.parse::<T>().ok())
                .unwrap_or(default)
        }

        // 数据库 URL 在无配置文件时必须提供
        let database_url = get_env("DATABASE_URL").ok_or_else(|| {
            AppError::ConfigError(
                "DATABASE_URL is not set and no config.toml was found".to_string(),
            )
        })?;

        Ok(Config {
            server: ServerConfig {
                host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get_env_parse("SERVER_PORT", 8080u16),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET")
                    .unwrap_or_else(|| "change-me-in-production".to_string()),
                access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
            },
            inventory: InventoryConfig::default(),
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("STOCK_MAX_UPDATE_ATTEMPTS")
            && let Ok(n) = v.parse()
        {
            self.inventory.max_update_attempts = n;
        }
        if let Ok(v) = env::var("STOCK_STRICT_AUDIT")
            && let Ok(b) = v.parse()
        {
            self.inventory.strict_audit = b;
        }
        if let Ok(v) = env::var("STOCK_HISTORY_DEFAULT_LIMIT")
            && let Ok(n) = v.parse()
        {
            self.inventory.history_default_limit = n;
        }
        if let Ok(v) = env::var("STOCK_HISTORY_MAX_LIMIT")
            && let Ok(n) = v.parse()
        {
            self.inventory.history_max_limit = n;
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.inventory.max_update_attempts == 0 {
            return Err(AppError::ConfigError(
                "inventory.max_update_attempts must be at least 1".to_string(),
            ));
        }
        if self.inventory.history_max_limit == 0 {
            return Err(AppError::ConfigError(
                "inventory.history_max_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
[server]
host = "127.0.0.1"
port = 9000

[database]
url = "postgres://localhost/storefront"
max_connections = 5

[jwt]
secret = "secret"
access_token_expires_in = 3600
"#;

    #[test]
    fn test_inventory_defaults_when_section_missing() {
        let config = Config::parse_toml(BASE).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.inventory.max_update_attempts, 3);
        assert!(!config.inventory.strict_audit);
        assert_eq!(config.inventory.history_default_limit, 50);
        assert_eq!(config.inventory.history_max_limit, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_inventory_section_overrides() {
        let toml = format!(
            "{BASE}\n[inventory]\nmax_update_attempts = 5\nstrict_audit = true\n"
        );
        let config = Config::parse_toml(&toml).unwrap();
        assert_eq!(config.inventory.max_update_attempts, 5);
        assert!(config.inventory.strict_audit);
        assert_eq!(config.inventory.history_default_limit, 50);
    }

    #[test]
    fn test_zero_attempts_is_rejected() {
        let toml = format!("{BASE}\n[inventory]\nmax_update_attempts = 0\n");
        let config = Config::parse_toml(&toml).unwrap();
        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_missing_section_fails_to_parse() {
        assert!(matches!(
            Config::parse_toml("[server]\nhost = \"x\"\nport = 1\n"),
            Err(AppError::ConfigError(_))
        ));
    }
}
