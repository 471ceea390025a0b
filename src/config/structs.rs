use serde::{Deserialize, Serialize};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub cors: CorsConfig,
    pub argon2: Argon2Config,
    pub finance: FinanceConfig,
}

/// 应用设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub system_name: String,
    pub environment: String,
    pub log_level: String,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub unix_socket_path: String,
    pub workers: usize,
    pub max_workers: usize,
    pub timeouts: TimeoutConfig,
    pub limits: LimitConfig,
    pub rate_limit: RateLimitConfig,
}

/// 超时配置（毫秒，keep_alive 为秒）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub client_request: u64,
    pub client_disconnect: u64,
    pub keep_alive: u64,
}

/// 限制配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    pub max_payload_size: usize,
    pub max_import_rows: usize,
}

/// 认证接口限流（每个客户端 IP）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub login_max_requests: u32,
    pub refresh_max_requests: u32,
}

/// JWT 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    #[serde(skip_serializing, default)]
    pub secret: String,
    /// secret 为空时启动阶段自动生成
    #[serde(skip)]
    pub secret_generated: bool,
    pub access_token_expiry: i64,  // 分钟
    pub refresh_token_expiry: i64, // 天
    pub refresh_token_remember_me_expiry: i64,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,    // 从 scheme 推断数据库类型
    pub pool_size: u32, // 连接池大小
    pub timeout: u64,   // 连接超时 (秒)
}

/// 缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(rename = "type")]
    pub cache_type: String,
    pub default_ttl: u64,
    pub redis: RedisConfig,
    pub memory: MemoryConfig,
}

/// Redis 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub key_prefix: String,
    pub default_ttl: u64,
}

/// 内存缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    pub max_capacity: u64,
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub max_age: usize,
}

/// Argon2 参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Argon2Config {
    pub memory_cost: u32, // KiB
    pub time_cost: u32,
    pub parallelism: u32,
}

/// 财务规则
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceConfig {
    pub currency: String,
    /// 逾期罚金百分比（一次性）
    pub late_fee_percent: f64,
    /// 每日利息百分比
    pub daily_interest_percent: f64,
    /// 到期后宽限天数
    pub grace_days: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSettings {
                system_name: "School Manager".to_string(),
                environment: "development".to_string(),
                log_level: "info".to_string(),
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                unix_socket_path: String::new(),
                workers: 0,
                max_workers: 8,
                timeouts: TimeoutConfig {
                    client_request: 5000,
                    client_disconnect: 1000,
                    keep_alive: 30,
                },
                limits: LimitConfig {
                    max_payload_size: 4 * 1024 * 1024,
                    max_import_rows: 1000,
                },
                rate_limit: RateLimitConfig {
                    window_secs: 60,
                    login_max_requests: 5,
                    refresh_max_requests: 10,
                },
            },
            jwt: JwtConfig {
                secret: String::new(),
                secret_generated: false,
                access_token_expiry: 15,
                refresh_token_expiry: 7,
                refresh_token_remember_me_expiry: 30,
            },
            database: DatabaseConfig {
                url: "school.db".to_string(),
                pool_size: 8,
                timeout: 30,
            },
            cache: CacheConfig {
                cache_type: "moka".to_string(),
                default_ttl: 300,
                redis: RedisConfig {
                    url: "redis://127.0.0.1:6379".to_string(),
                    key_prefix: "school:".to_string(),
                    default_ttl: 300,
                },
                memory: MemoryConfig {
                    max_capacity: 10_000,
                },
            },
            cors: CorsConfig {
                allowed_origins: vec!["*".to_string()],
                max_age: 3600,
            },
            argon2: Argon2Config {
                memory_cost: 19456,
                time_cost: 2,
                parallelism: 1,
            },
            finance: FinanceConfig {
                currency: "BRL".to_string(),
                late_fee_percent: 2.0,
                daily_interest_percent: 0.033,
                grace_days: 0,
            },
        }
    }
}
