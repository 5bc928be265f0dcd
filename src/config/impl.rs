use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use std::sync::OnceLock;

use super::AppConfig;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

impl AppConfig {
    /// 内置默认值，配置文件和环境变量在此基础上覆盖
    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("app.system_name", "Homework Planner")?
            .set_default("app.environment", "development")?
            .set_default("app.log_level", "info")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.unix_socket_path", "")?
            .set_default("server.workers", 0)?
            .set_default("server.max_workers", 8)?
            .set_default("server.timeouts.client_request", 5000)?
            .set_default("server.timeouts.client_disconnect", 1000)?
            .set_default("server.timeouts.keep_alive", 30)?
            .set_default("server.limits.max_payload_size", 12 * 1024 * 1024)?
            .set_default("auth.jwt_secret", "")?
            .set_default("auth.audience", "authenticated")?
            .set_default("auth.leeway", 30)?
            .set_default("database.url", "sqlite://planner.db?mode=rwc")?
            .set_default("database.pool_size", 10)?
            .set_default("database.timeout", 30)?
            .set_default("cache.type", "moka")?
            .set_default("cache.default_ttl", 3600)?
            .set_default("cache.redis.url", "redis://127.0.0.1:6379")?
            .set_default("cache.redis.key_prefix", "planner:")?
            .set_default("cache.redis.pool_size", 10)?
            .set_default("cache.memory.max_capacity", 10000)?
            .set_default("cors.allowed_origins", vec!["*"])?
            .set_default(
                "cors.allowed_methods",
                vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"],
            )?
            .set_default(
                "cors.allowed_headers",
                vec!["Authorization", "Content-Type", "X-Class-Id"],
            )?
            .set_default("cors.max_age", 3600)?
            .set_default("upload.dir", "uploads")?
            .set_default("upload.max_size", 10 * 1024 * 1024)?
            .set_default(
                "upload.allowed_types",
                vec!["image/jpeg", "image/png", "image/webp", "application/pdf"],
            )?
            .set_default("upload.signed_url_ttl", 3600)?
            .set_default("upload.signing_secret", "")?
            .set_default("realtime.channel_capacity", 256)?
            .set_default("realtime.heartbeat_interval", 30)?
            .set_default("realtime.client_timeout", 90)?
            .set_default("rate_limit.auth.max_attempts", 5)?
            .set_default("rate_limit.auth.window_ms", 60_000)?
            .set_default("rate_limit.class_code.max_attempts", 10)?
            .set_default("rate_limit.class_code.window_ms", 60_000)?
            .set_default("rate_limit.report.max_attempts", 5)?
            .set_default("rate_limit.report.window_ms", 60_000)?
            .set_default("rate_limit.upload.max_attempts", 10)?
            .set_default("rate_limit.upload.window_ms", 60_000)
    }

    /// 加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::defaults()?
            // 首先加载默认配置文件
            .add_source(File::with_name("config").required(false))
            // 然后根据环境加载特定配置文件
            .add_source(
                File::with_name(&format!(
                    "config.{}",
                    std::env::var("APP_ENV").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // 最后加载环境变量覆盖，例如 PLANNER_SERVER__PORT
            .add_source(
                Environment::with_prefix("PLANNER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        // 支持从常用环境变量加载
        builder = builder
            .set_override_option("app.environment", std::env::var("APP_ENV").ok())?
            .set_override_option("app.log_level", std::env::var("RUST_LOG").ok())?
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("server.unix_socket_path", std::env::var("UNIX_SOCKET").ok())?
            .set_override_option("server.workers", std::env::var("CPU_COUNT").ok())?
            .set_override_option("auth.jwt_secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("cache.redis.url", std::env::var("REDIS_URL").ok())?;

        let config = builder.build()?;
        let mut app_config: AppConfig = config.try_deserialize()?;

        // 处理工作线程数
        if app_config.server.workers == 0 {
            app_config.server.workers = num_cpus::get().min(app_config.server.max_workers);
        }

        // 未单独配置时，下载链接与令牌共用密钥
        if app_config.upload.signing_secret.is_empty() {
            app_config.upload.signing_secret = app_config.auth.jwt_secret.clone();
        }

        Ok(app_config)
    }

    /// 获取全局配置实例
    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                eprintln!("Failed to load configuration: {e}");
                std::process::exit(1);
            })
        })
    }

    /// 初始化配置 (在应用启动时调用)
    pub fn init() -> Result<(), ConfigError> {
        let config = Self::load()?;
        APP_CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))?;
        Ok(())
    }

    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    /// 检查是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    /// 获取服务器绑定地址
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 获取 Unix 套接字路径 (如果配置了)
    #[cfg(unix)]
    pub fn unix_socket_path(&self) -> Option<&str> {
        if self.server.unix_socket_path.is_empty() {
            None
        } else {
            Some(&self.server.unix_socket_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_deserialize() {
        let config: AppConfig = AppConfig::defaults()
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize())
            .expect("defaults should deserialize");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.rate_limit.auth.max_attempts, 5);
        assert_eq!(config.rate_limit.auth.window_ms, 60_000);
        assert_eq!(config.upload.max_size, 10 * 1024 * 1024);
        assert_eq!(config.upload.signed_url_ttl, 3600);
        assert!(
            config
                .upload
                .allowed_types
                .contains(&"application/pdf".to_string())
        );
        assert!(config.is_development());
    }
}
