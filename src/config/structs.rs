use serde::{Deserialize, Serialize};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub cors: CorsConfig,
    pub upload: UploadConfig,
    pub realtime: RealtimeConfig,
    pub rate_limit: RateLimitConfig,
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
}

/// 超时配置
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
}

/// 外部认证服务的令牌校验配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    pub jwt_secret: String,
    /// 为空时不校验 aud
    pub audience: String,
    pub leeway: u64,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,    // 数据库连接 URL（从 scheme 自动推断类型）
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
    pub pool_size: u64,
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
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub max_age: usize,
}

/// 附件上传与签名下载
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: String,                // 对象存储根目录
    pub max_size: usize,            // 单文件最大字节数
    pub allowed_types: Vec<String>, // 允许的MIME类型
    pub signed_url_ttl: i64,        // 签名链接有效期 (秒)
    #[serde(skip_serializing, default)]
    pub signing_secret: String,
}

/// 实时推送配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    pub channel_capacity: usize,
    pub heartbeat_interval: u64, // 秒
    pub client_timeout: u64,     // 秒
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitRule {
    pub max_attempts: usize,
    pub window_ms: i64,
}

/// 各类操作的限流规则
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub auth: RateLimitRule,
    pub class_code: RateLimitRule,
    pub report: RateLimitRule,
    pub upload: RateLimitRule,
}
