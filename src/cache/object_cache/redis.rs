use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use tracing::{debug, error};

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::declare_object_cache_plugin;

declare_object_cache_plugin!("redis", RedisObjectCache);

pub struct RedisObjectCache {
    client: redis::Client,
    key_prefix: String,
    ttl: u64, // 秒
}

impl RedisObjectCache {
    pub fn new() -> Result<Self, String> {
        let config = AppConfig::get();
        let redis_config = &config.cache.redis;

        let client = redis::Client::open(redis_config.url.clone())
            .map_err(|e| format!("Invalid Redis URL '{}': {e}", redis_config.url))?;

        // 启动时先用同步连接 PING 一次，失败则交给调用方回退到内存缓存
        let mut conn = client
            .get_connection()
            .map_err(|e| format!("Redis connection failed: {e}"))?;
        let pong: String = redis::cmd("PING")
            .query(&mut conn)
            .map_err(|e| format!("Redis ping failed: {e}"))?;
        debug!(
            "Redis ping: {}, prefix: '{}', TTL: {}s",
            pong, redis_config.key_prefix, config.cache.default_ttl
        );

        Ok(Self {
            client,
            key_prefix: redis_config.key_prefix.clone(),
            ttl: config.cache.default_ttl,
        })
    }

    async fn get_connection(&self) -> Option<MultiplexedConnection> {
        match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => Some(conn),
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                None
            }
        }
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl ObjectCache for RedisObjectCache {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        let Some(mut conn) = self.get_connection().await else {
            return CacheResult::ExistsButNoValue;
        };

        let result: redis::RedisResult<Option<String>> = conn.get(self.make_key(key)).await;
        match result {
            Ok(Some(data)) => CacheResult::Found(data),
            Ok(None) => CacheResult::NotFound,
            Err(e) => {
                error!("Failed to get key '{}': {}", key, e);
                CacheResult::ExistsButNoValue
            }
        }
    }

    async fn insert_raw(&self, key: String, value: String, ttl: u64) {
        let Some(mut conn) = self.get_connection().await else {
            return;
        };

        let effective_ttl = if ttl == 0 { self.ttl } else { ttl };
        if let Err(e) = conn
            .set_ex::<String, String, ()>(self.make_key(&key), value, effective_ttl)
            .await
        {
            error!("Failed to insert key '{}' into cache: {}", key, e);
        }
    }

    async fn remove(&self, key: &str) {
        let Some(mut conn) = self.get_connection().await else {
            return;
        };

        if let Err(e) = conn.del::<String, i32>(self.make_key(key)).await {
            error!("Failed to remove key '{}': {}", key, e);
        }
    }

    async fn invalidate_all(&self) {
        // 只清理本应用前缀下的键
        let Some(mut conn) = self.get_connection().await else {
            return;
        };

        let pattern = format!("{}*", self.key_prefix);
        let keys: Vec<String> = match conn.keys(pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                error!("Failed to list keys for invalidation: {}", e);
                return;
            }
        };
        if keys.is_empty() {
            return;
        }
        if let Err(e) = conn.del::<Vec<String>, i32>(keys).await {
            error!("Failed to invalidate cache: {}", e);
        }
    }
}
