use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheResult<T> {
    Found(T),
    NotFound,
    /// 后端出错，无法判断键是否存在
    ExistsButNoValue,
}

impl<T> CacheResult<T> {
    pub fn found(self) -> Option<T> {
        match self {
            CacheResult::Found(v) => Some(v),
            _ => None,
        }
    }
}

#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get_raw(&self, key: &str) -> CacheResult<String>;

    /// `ttl` 为秒，0 表示使用配置的默认值
    async fn insert_raw(&self, key: String, value: String, ttl: u64);

    async fn remove(&self, key: &str);

    async fn invalidate_all(&self);
}

/// 以 JSON 读写的便捷封装
pub async fn get_json<T: DeserializeOwned>(cache: &dyn ObjectCache, key: &str) -> Option<T> {
    match cache.get_raw(key).await {
        CacheResult::Found(json) => match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!("Dropping undecodable cache entry '{}': {}", key, e);
                cache.remove(key).await;
                None
            }
        },
        _ => None,
    }
}

pub async fn insert_json<T: Serialize>(cache: &dyn ObjectCache, key: String, value: &T, ttl: u64) {
    match serde_json::to_string(value) {
        Ok(json) => cache.insert_raw(key, json, ttl).await,
        Err(e) => tracing::warn!("Failed to encode cache entry '{}': {}", key, e),
    }
}
