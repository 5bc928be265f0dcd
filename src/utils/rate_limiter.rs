//! 滑动窗口限流
//!
//! 每个键保存窗口内被放行的时间戳（毫秒）。仅用于体验层面的节流。
//! 键存放在带 TTL 的 moka 缓存中：最后一次放行后经过一个窗口即被淘汰。

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use moka::future::Cache;
use moka::ops::compute::Op;
use once_cell::sync::Lazy;

use crate::config::RateLimitRule;
use crate::models::auth::responses::RateLimitInfo;

/// 单个限流器最多跟踪的键数
const MAX_TRACKED_KEYS: u64 = 100_000;

pub struct RateLimiter {
    max_attempts: usize,
    window_ms: i64,
    attempts: Cache<String, Vec<i64>>,
}

impl RateLimiter {
    pub fn new(max_attempts: usize, window_ms: i64) -> Self {
        Self {
            max_attempts,
            window_ms,
            attempts: Cache::builder()
                .time_to_live(Duration::from_millis(window_ms.max(1) as u64))
                .max_capacity(MAX_TRACKED_KEYS)
                .build(),
        }
    }

    pub fn from_rule(rule: &RateLimitRule) -> Self {
        Self::new(rule.max_attempts, rule.window_ms)
    }

    pub async fn check(&self, key: &str) -> RateLimitInfo {
        self.check_at(key, chrono::Utc::now().timestamp_millis()).await
    }

    /// 以给定时间检查并记录一次尝试
    pub async fn check_at(&self, key: &str, now_ms: i64) -> RateLimitInfo {
        let mut info = RateLimitInfo {
            allowed: false,
            remaining: 0,
            reset_in_ms: 0,
        };

        // 同一个键的读改写是原子的；只有放行时才重新写入，TTL 从这次放行重新计算
        self.attempts
            .entry(key.to_string())
            .and_compute_with(|entry| {
                let mut stamps = entry.map(|e| e.into_value()).unwrap_or_default();
                stamps.retain(|&t| now_ms - t < self.window_ms);

                let count = stamps.len();
                let oldest = stamps.first().copied().unwrap_or(now_ms);
                info = RateLimitInfo {
                    allowed: count < self.max_attempts,
                    remaining: self.max_attempts.saturating_sub(count),
                    reset_in_ms: (self.window_ms - (now_ms - oldest)).max(0),
                };

                let op = if info.allowed {
                    stamps.push(now_ms);
                    Op::Put(stamps)
                } else {
                    Op::Nop
                };
                std::future::ready(op)
            })
            .await;

        info
    }

    pub async fn reset(&self, key: &str) {
        self.attempts.invalidate(key).await;
    }

    /// 当前仍被跟踪的键数（先处理过期淘汰）
    pub async fn tracked_keys(&self) -> u64 {
        self.attempts.run_pending_tasks().await;
        self.attempts.entry_count()
    }
}

// 名称 -> 进程内共享的限流器
static SHARED_LIMITERS: Lazy<DashMap<&'static str, Arc<RateLimiter>>> = Lazy::new(DashMap::new);

/// 按名称取共享限流器，首次使用时按规则创建
pub fn shared(name: &'static str, rule: &RateLimitRule) -> Arc<RateLimiter> {
    SHARED_LIMITERS
        .entry(name)
        .or_insert_with(|| Arc::new(RateLimiter::from_rule(rule)))
        .clone()
}

/// 被限流时展示给用户的提示
pub fn blocked_message(info: &RateLimitInfo) -> String {
    let seconds = (info.reset_in_ms + 999) / 1000;
    format!("Too many attempts. Please wait {seconds} seconds before trying again.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sixth_attempt_is_blocked() {
        let limiter = RateLimiter::new(5, 60_000);
        let start = 1_000_000;
        for i in 0..5 {
            let info = limiter.check_at("auth:a@b.c", start + i).await;
            assert!(info.allowed);
            assert_eq!(info.remaining, 5 - i as usize);
        }

        let blocked = limiter.check_at("auth:a@b.c", start + 10).await;
        assert!(!blocked.allowed);
        assert_eq!(blocked.remaining, 0);
        assert_eq!(blocked.reset_in_ms, 60_000 - 10);

        // 窗口过去后再次放行
        let later = limiter.check_at("auth:a@b.c", start + 10 + blocked.reset_in_ms).await;
        assert!(later.allowed);
    }

    #[tokio::test]
    async fn test_keys_are_independent_and_resettable() {
        let limiter = RateLimiter::new(1, 1_000);
        assert!(limiter.check_at("a", 0).await.allowed);
        assert!(!limiter.check_at("a", 1).await.allowed);
        assert!(limiter.check_at("b", 1).await.allowed);

        limiter.reset("a").await;
        assert!(limiter.check_at("a", 2).await.allowed);
    }

    #[tokio::test]
    async fn test_blocked_attempts_are_not_recorded() {
        let limiter = RateLimiter::new(1, 1_000);
        limiter.check_at("k", 0).await;
        for t in [100, 200, 900] {
            assert!(!limiter.check_at("k", t).await.allowed);
        }
        // 只有 t=0 被记录
        assert!(limiter.check_at("k", 1_000).await.allowed);
    }

    #[tokio::test]
    async fn test_idle_keys_are_evicted() {
        let limiter = RateLimiter::new(1, 50);
        for i in 0..100 {
            assert!(limiter.check(&format!("ip:10.0.0.{i}")).await.allowed);
        }
        assert_eq!(limiter.tracked_keys().await, 100);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(limiter.tracked_keys().await, 0);

        // 淘汰后的键重新开始计数
        assert!(limiter.check("ip:10.0.0.1").await.allowed);
    }

    #[test]
    fn test_shared_limiter_is_reused() {
        let rule = RateLimitRule {
            max_attempts: 1,
            window_ms: 60_000,
        };
        let a = shared("test-shared", &rule);
        let b = shared("test-shared", &rule);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_blocked_message_rounds_up() {
        let info = RateLimitInfo {
            allowed: false,
            remaining: 0,
            reset_in_ms: 1_001,
        };
        assert_eq!(
            blocked_message(&info),
            "Too many attempts. Please wait 2 seconds before trying again."
        );
    }
}
