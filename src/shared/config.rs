use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub gateway: GatewayConfig,
    pub cache: CacheConfig,
    pub comments: CommentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewayConfig {
    /// リモート呼び出し 1 回あたりのタイムアウト（ミリ秒）
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    /// 変更通知 broadcast チャネルの容量
    pub notification_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentConfig {
    pub max_length: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/flora.db?mode=rwc".to_string(),
                max_connections: 5,
            },
            gateway: GatewayConfig {
                request_timeout_ms: 10_000, // 10 seconds
            },
            cache: CacheConfig {
                notification_capacity: 256,
            },
            comments: CommentConfig { max_length: 500 },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        // 既定値
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("FLORA_DATABASE_URL") {
            let v = v.trim();
            if !v.is_empty() {
                cfg.database.url = v.to_string();
            }
        }
        if let Some(value) = std::env::var("FLORA_DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| parse_u64(&v))
        {
            cfg.database.max_connections = u32::try_from(value.max(1)).unwrap_or(u32::MAX);
        }
        if let Some(value) = std::env::var("FLORA_GATEWAY_TIMEOUT_MS")
            .ok()
            .and_then(|v| parse_u64(&v))
        {
            cfg.gateway.request_timeout_ms = value.max(1);
        }
        if let Some(value) = std::env::var("FLORA_NOTIFICATION_CAPACITY")
            .ok()
            .and_then(|v| parse_usize(&v))
        {
            cfg.cache.notification_capacity = value.max(1);
        }
        if let Some(value) = std::env::var("FLORA_COMMENT_MAX_LENGTH")
            .ok()
            .and_then(|v| parse_usize(&v))
        {
            cfg.comments.max_length = value.max(1);
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.url.trim().is_empty() {
            return Err("Database url must not be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.gateway.request_timeout_ms == 0 {
            return Err("Gateway request_timeout_ms must be greater than 0".to_string());
        }
        if self.cache.notification_capacity == 0 {
            return Err("Cache notification_capacity must be greater than 0".to_string());
        }
        if self.comments.max_length == 0 {
            return Err("Comments max_length must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

fn parse_usize(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}
