use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::object_store::{ObjectStore, create_object_store};
use crate::realtime::ChangeFeed;
use crate::storage::Storage;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub objects: Arc<dyn ObjectStore>,
}

type StartupError = Box<dyn std::error::Error>;

async fn try_cache_plugin(name: &str) -> Option<Arc<dyn ObjectCache>> {
    let constructor = get_object_cache_plugin(name)?;
    match constructor().await {
        Ok(cache) => {
            warn!("Successfully created {} cache backend", name);
            Some(Arc::from(cache))
        }
        Err(e) => {
            warn!("Failed to create {} cache: {}", name, e);
            None
        }
    }
}

/// 创建缓存实例，配置的后端不可用时回退到内存缓存
async fn create_cache() -> Result<Arc<dyn ObjectCache>, StartupError> {
    let cache_type = &AppConfig::get().cache.cache_type;
    warn!("Attempting to create {} cache backend", cache_type);

    if let Some(cache) = try_cache_plugin(cache_type).await {
        return Ok(cache);
    }
    if cache_type != "moka" {
        warn!("Falling back to memory cache");
        if let Some(cache) = try_cache_plugin("moka").await {
            return Ok(cache);
        }
    }

    Err(format!("No cache backend available (tried: {cache_type})").into())
}

/// 令牌密钥为空时所有签名都能通过校验，生产环境拒绝启动
fn check_secrets(config: &AppConfig) -> Result<(), StartupError> {
    if config.auth.jwt_secret.is_empty() {
        if config.is_production() {
            return Err("auth.jwt_secret must be set in production".into());
        }
        warn!("auth.jwt_secret is empty, access tokens are effectively unverified");
    }
    Ok(())
}

/// 准备服务器启动的上下文
/// 包括存储、缓存、对象存储和变更广播
pub async fn prepare_server_startup() -> Result<StartupContext, StartupError> {
    // 重复安装时返回 Err，可忽略
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = AppConfig::get();
    check_secrets(config)?;

    if cfg!(debug_assertions) {
        crate::cache::register::debug_object_cache_registry();
        debug!("Debug mode: Cache registry is enabled");
    }

    let storage = crate::storage::create_storage().await?;
    warn!("Storage backend initialized and migrations completed");

    let cache = create_cache().await?;
    warn!("Cache backend initialized");

    let objects = create_object_store();
    warn!("Object store rooted at {}", config.upload.dir);

    ChangeFeed::init(config.realtime.channel_capacity);
    debug!(
        "Change feed initialized with capacity {}",
        config.realtime.channel_capacity
    );

    Ok(StartupContext {
        storage,
        cache,
        objects,
    })
}
