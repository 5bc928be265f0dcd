/*!
 * 进程内数据变更推送
 *
 * 每张被订阅的表一个 tokio broadcast 通道。所有作业、附件、完成状态的写操作
 * 在落库后发布一条 [`ChangeEvent`]，订阅方按事件类型和班级过滤。
 *
 * ```text
 * service ──publish──▶ ChangeFeed ──broadcast──▶ Subscription (per session)
 * ```
 */

mod event;

pub use event::{ChangeEvent, ChangeKind, EventFilter, SubscriptionSpec, Table};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::errors::{PlannerError, Result};

const DEFAULT_CAPACITY: usize = 256;

static GLOBAL_FEED: OnceCell<ChangeFeed> = OnceCell::new();

struct FeedInner {
    capacity: usize,
    channels: DashMap<Table, broadcast::Sender<Arc<ChangeEvent>>>,
    // 订阅 ID -> 订阅条件
    active: DashMap<u64, SubscriptionSpec>,
    next_id: AtomicU64,
}

/// 变更推送句柄，克隆开销很小
#[derive(Clone)]
pub struct ChangeFeed {
    inner: Arc<FeedInner>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                capacity: capacity.max(1),
                channels: DashMap::new(),
                active: DashMap::new(),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// 启动时按配置初始化全局实例，重复调用无效
    pub fn init(capacity: usize) -> &'static ChangeFeed {
        GLOBAL_FEED.get_or_init(|| ChangeFeed::new(capacity))
    }

    /// 全局实例，未初始化时使用默认容量
    pub fn global() -> &'static ChangeFeed {
        GLOBAL_FEED.get_or_init(|| ChangeFeed::new(DEFAULT_CAPACITY))
    }

    fn sender(&self, table: Table) -> broadcast::Sender<Arc<ChangeEvent>> {
        self.inner
            .channels
            .entry(table)
            .or_insert_with(|| broadcast::channel(self.inner.capacity).0)
            .clone()
    }

    /// 发布事件，返回收到事件的订阅数
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let table = event.table;
        match self.sender(table).send(Arc::new(event)) {
            Ok(n) => {
                trace!("Change on {} delivered to {} receivers", table, n);
                n
            }
            // 无人订阅
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self, spec: SubscriptionSpec) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let rx = self.sender(spec.table).subscribe();
        self.inner.active.insert(id, spec.clone());
        debug!("Subscription {} opened on {}", id, spec.table);

        Subscription { id, spec, rx }
    }

    /// 取消订阅；重复取消返回错误
    pub fn unsubscribe(&self, subscription: Subscription) -> Result<()> {
        let id = subscription.id;
        drop(subscription);
        match self.inner.active.remove(&id) {
            Some(_) => Ok(()),
            None => Err(PlannerError::realtime(format!("订阅不存在: {id}"))),
        }
    }

    /// 当前活跃订阅数
    pub fn active_subscriptions(&self) -> usize {
        self.inner.active.len()
    }
}

/// 订阅接收结果中的非事件情况
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// 接收过慢，丢失了若干事件
    Lagged(u64),
    Closed,
}

/// 单个订阅，只在持有者的任务中使用
pub struct Subscription {
    id: u64,
    spec: SubscriptionSpec,
    rx: broadcast::Receiver<Arc<ChangeEvent>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 等待下一条符合条件的事件
    pub async fn recv(&mut self) -> std::result::Result<Arc<ChangeEvent>, FeedError> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.spec.matches(&event) => return Ok(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => return Err(FeedError::Lagged(n)),
                Err(broadcast::error::RecvError::Closed) => return Err(FeedError::Closed),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_subscription_filters_by_class() {
        let feed = ChangeFeed::new(16);
        let mut sub = feed.subscribe(SubscriptionSpec::class(Table::Homework, "c1"));

        feed.publish(ChangeEvent::new(
            Table::Homework,
            ChangeKind::Insert,
            "c2",
            Some(json!({ "id": "other" })),
            None,
        ));
        feed.publish(ChangeEvent::new(
            Table::Homework,
            ChangeKind::Insert,
            "c1",
            Some(json!({ "id": "mine" })),
            None,
        ));

        let event = sub.recv().await.unwrap();
        assert_eq!(event.new.as_ref().unwrap()["id"], "mine");
    }

    #[tokio::test]
    async fn test_lag_is_reported() {
        let feed = ChangeFeed::new(2);
        let mut sub = feed.subscribe(SubscriptionSpec::class(Table::HomeworkCompletion, "c1"));
        for _ in 0..5 {
            feed.publish(ChangeEvent::new(
                Table::HomeworkCompletion,
                ChangeKind::Update,
                "c1",
                Some(json!({})),
                None,
            ));
        }
        assert!(matches!(sub.recv().await, Err(FeedError::Lagged(_))));
    }

    #[test]
    fn test_unsubscribe_twice_fails() {
        let feed = ChangeFeed::new(4);
        let sub = feed.subscribe(SubscriptionSpec::class(Table::Homework, "c1"));
        let id = sub.id();
        assert_eq!(feed.active_subscriptions(), 1);
        feed.unsubscribe(sub).unwrap();
        assert_eq!(feed.active_subscriptions(), 0);

        // 伪造一个已失效的订阅
        let stale = Subscription {
            id,
            spec: SubscriptionSpec::class(Table::Homework, "c1"),
            rx: feed.sender(Table::Homework).subscribe(),
        };
        assert!(feed.unsubscribe(stale).is_err());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let feed = ChangeFeed::new(4);
        let n = feed.publish(ChangeEvent::new(
            Table::HomeworkAttachments,
            ChangeKind::Delete,
            "c1",
            None,
            Some(json!({ "id": "a1" })),
        ));
        assert_eq!(n, 0);
    }
}
