//! 作业实时同步
//!
//! 每个 WebSocket 会话持有一个 [`HomeworkSync`]：激活时先订阅三张表的变更，
//! 再整体拉取一次；之后按到达顺序把事件合并进本地列表。

pub mod merge;
pub mod normalize;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::{PlannerError, Result};
use crate::models::homework::entities::{Completion, HomeworkWithRelations};
use crate::realtime::{
    ChangeEvent, ChangeFeed, ChangeKind, FeedError, Subscription, SubscriptionSpec, Table,
};
use crate::storage::Storage;
use merge::MergeOutcome;

/// 会话内的同步状态
#[derive(Debug, Clone, Default)]
pub struct SyncState {
    pub homework: Vec<HomeworkWithRelations>,
    pub loading: bool,
    pub error: Option<String>,
}

/// 一次等待的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncUpdate {
    /// 本地列表已增量更新
    Merged,
    /// 重新拉取了整个列表（成功或失败见 state.error）
    Refetched,
    /// 事件不影响本地列表
    Ignored,
    /// 推送通道已关闭或尚未激活
    Closed,
}

struct Subscriptions {
    homework: Subscription,
    attachments: Subscription,
    completion: Subscription,
}

pub struct HomeworkSync {
    storage: Arc<dyn Storage>,
    feed: ChangeFeed,
    class_id: String,
    subscriptions: Option<Subscriptions>,
    state: SyncState,
}

impl HomeworkSync {
    pub fn new(storage: Arc<dyn Storage>, feed: ChangeFeed, class_id: impl Into<String>) -> Self {
        Self {
            storage,
            feed,
            class_id: class_id.into(),
            subscriptions: None,
            state: SyncState {
                loading: true,
                ..Default::default()
            },
        }
    }

    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// 订阅后再拉取，保证拉取期间的变更不会丢失
    pub async fn activate(&mut self) -> &SyncState {
        if self.subscriptions.is_none() {
            let spec = |table| SubscriptionSpec::class(table, self.class_id.clone());
            self.subscriptions = Some(Subscriptions {
                homework: self.feed.subscribe(spec(Table::Homework)),
                attachments: self.feed.subscribe(spec(Table::HomeworkAttachments)),
                completion: self.feed.subscribe(spec(Table::HomeworkCompletion)),
            });
        }
        self.refetch().await
    }

    /// 整体重新拉取；错误写入 state.error，不重试
    pub async fn refetch(&mut self) -> &SyncState {
        self.state.loading = true;

        let result = match self.storage.list_homework_rows(&self.class_id).await {
            Ok(rows) => normalize::normalize_rows(rows),
            Err(e) => Err(e),
        };

        match result {
            Ok(homework) => {
                self.state.homework = homework;
                self.state.error = None;
            }
            Err(e) => {
                warn!("Failed to fetch homework for class {}: {}", self.class_id, e);
                self.state.error = Some(e.message().to_string());
            }
        }

        self.state.loading = false;
        &self.state
    }

    /// 等待下一条变更但不处理，可以安全地在 select 中取消
    pub async fn next_event(&mut self) -> std::result::Result<Arc<ChangeEvent>, FeedError> {
        let Some(subs) = self.subscriptions.as_mut() else {
            return Err(FeedError::Closed);
        };

        tokio::select! {
            r = subs.homework.recv() => r,
            r = subs.attachments.recv() => r,
            r = subs.completion.recv() => r,
        }
    }

    /// 处理 [`next_event`](Self::next_event) 的结果
    pub async fn process(
        &mut self,
        received: std::result::Result<Arc<ChangeEvent>, FeedError>,
    ) -> SyncUpdate {
        match received {
            Ok(event) => self.apply(&event).await,
            Err(FeedError::Lagged(n)) => {
                debug!("Class {} feed lagged by {} events, refetching", self.class_id, n);
                self.refetch().await;
                SyncUpdate::Refetched
            }
            Err(FeedError::Closed) => SyncUpdate::Closed,
        }
    }

    /// 等待并应用下一条变更
    pub async fn next_change(&mut self) -> SyncUpdate {
        let received = self.next_event().await;
        self.process(received).await
    }

    /// 应用单条事件，无法增量合并时退回整体拉取
    pub async fn apply(&mut self, event: &ChangeEvent) -> SyncUpdate {
        let list = &mut self.state.homework;
        let merged = match event.table {
            Table::Homework => merge::apply_homework_change(list, event, &self.class_id),
            Table::HomeworkAttachments => merge::apply_attachment_change(list, event),
            Table::HomeworkCompletion => merge::apply_completion_change(list, event),
        };

        match merged {
            Ok(MergeOutcome::Changed) => SyncUpdate::Merged,
            Ok(MergeOutcome::Unchanged) => SyncUpdate::Ignored,
            Ok(MergeOutcome::NeedsRefetch) => {
                self.refetch().await;
                SyncUpdate::Refetched
            }
            Err(e) => {
                warn!("Discarding malformed {} event: {}", event.table, e);
                self.refetch().await;
                SyncUpdate::Refetched
            }
        }
    }

    /// 切换完成状态：原子写入，发布变更，再整体拉取
    pub async fn toggle_completion(
        &mut self,
        homework_id: &str,
        user_id: &str,
        done: bool,
    ) -> Result<Completion> {
        let Some(item) = self.state.homework.iter().find(|h| h.id() == homework_id) else {
            return Err(PlannerError::not_found(format!("作业不存在: {homework_id}")));
        };
        let existed = item.completion.iter().any(|c| c.user_id == user_id);

        let completion = self
            .storage
            .upsert_completion(homework_id, user_id, done)
            .await?;

        let kind = if existed {
            ChangeKind::Update
        } else {
            ChangeKind::Insert
        };
        let event = ChangeEvent::from_rows(
            Table::HomeworkCompletion,
            kind,
            self.class_id.clone(),
            Some(&completion),
            None,
        )?;
        self.feed.publish(event);

        self.refetch().await;
        Ok(completion)
    }

    /// 取消全部订阅，失败只记录
    pub fn teardown(&mut self) {
        let Some(subs) = self.subscriptions.take() else {
            return;
        };
        for sub in [subs.homework, subs.attachments, subs.completion] {
            let id = sub.id();
            if let Err(e) = self.feed.unsubscribe(sub) {
                debug!("Ignoring unsubscribe failure for {}: {}", id, e);
            }
        }
    }
}

impl Drop for HomeworkSync {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::homework::requests::{NewAttachment, NewHomework};
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use chrono::{Duration, Utc};

    async fn setup() -> (Arc<dyn Storage>, String) {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let class = storage.create_class("1HAT2", None).await.unwrap();
        (Arc::new(storage), class.id)
    }

    fn new_homework(class_id: &str, title: &str, days: i64) -> NewHomework {
        NewHomework {
            class_id: class_id.into(),
            title: title.into(),
            description: None,
            subject: None,
            due_date: Utc::now() + Duration::days(days),
            created_by: None,
        }
    }

    #[tokio::test]
    async fn test_activate_fetches_sorted_snapshot() {
        let (storage, class_id) = setup().await;
        storage
            .create_homework(new_homework(&class_id, "late", 4))
            .await
            .unwrap();
        storage
            .create_homework(new_homework(&class_id, "early", 1))
            .await
            .unwrap();

        let feed = ChangeFeed::new(16);
        let mut sync = HomeworkSync::new(storage, feed.clone(), class_id);
        let state = sync.activate().await;
        assert!(!state.loading);
        assert_eq!(state.error, None);
        assert_eq!(state.homework[0].homework.title, "early");
        assert_eq!(feed.active_subscriptions(), 3);

        sync.teardown();
        assert_eq!(feed.active_subscriptions(), 0);
        // 再次调用不报错
        sync.teardown();
    }

    #[tokio::test]
    async fn test_published_insert_is_merged() {
        let (storage, class_id) = setup().await;
        let feed = ChangeFeed::new(16);
        let mut sync = HomeworkSync::new(storage.clone(), feed.clone(), class_id.clone());
        sync.activate().await;

        let hw = storage
            .create_homework(new_homework(&class_id, "fresh", 2))
            .await
            .unwrap();
        feed.publish(
            ChangeEvent::from_rows(Table::Homework, ChangeKind::Insert, &class_id, Some(&hw), None)
                .unwrap(),
        );

        assert_eq!(sync.next_change().await, SyncUpdate::Merged);
        assert_eq!(sync.state().homework.len(), 1);
        assert_eq!(sync.state().homework[0].id(), hw.id);
    }

    #[tokio::test]
    async fn test_orphan_attachment_triggers_refetch() {
        let (storage, class_id) = setup().await;
        let feed = ChangeFeed::new(16);
        let mut sync = HomeworkSync::new(storage.clone(), feed.clone(), class_id.clone());
        sync.activate().await;

        // 作业事件未送达，附件事件先到
        let hw = storage
            .create_homework(new_homework(&class_id, "with file", 2))
            .await
            .unwrap();
        let attachment = storage
            .create_attachment(NewAttachment {
                homework_id: hw.id.clone(),
                storage_path: format!("{}/1-a.png", hw.id),
                filename: "a.png".into(),
                mime_type: "image/png".into(),
                uploaded_by: None,
            })
            .await
            .unwrap();
        feed.publish(
            ChangeEvent::from_rows(
                Table::HomeworkAttachments,
                ChangeKind::Insert,
                &class_id,
                Some(&attachment),
                None,
            )
            .unwrap(),
        );

        assert_eq!(sync.next_change().await, SyncUpdate::Refetched);
        assert_eq!(sync.state().homework[0].attachments.len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_completion_twice_updates_one_row() {
        let (storage, class_id) = setup().await;
        let hw = storage
            .create_homework(new_homework(&class_id, "toggle me", 1))
            .await
            .unwrap();
        let feed = ChangeFeed::new(16);
        let mut sync = HomeworkSync::new(storage.clone(), feed.clone(), class_id);
        sync.activate().await;

        let first = sync.toggle_completion(&hw.id, "u1", true).await.unwrap();
        assert!(sync.state().homework[0].is_done_by("u1"));

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = sync.toggle_completion(&hw.id, "u1", false).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(sync.state().homework[0].completion.len(), 1);
        assert!(!sync.state().homework[0].is_done_by("u1"));

        // 自己发布的事件在拉取之后才回放，较旧的一条不能把状态翻回去
        assert_eq!(sync.next_change().await, SyncUpdate::Ignored);
        assert!(!sync.state().homework[0].is_done_by("u1"));
        assert_eq!(sync.next_change().await, SyncUpdate::Ignored);
        assert_eq!(sync.state().homework[0].completion.len(), 1);
        assert!(!sync.state().homework[0].is_done_by("u1"));
    }

    #[tokio::test]
    async fn test_toggle_unknown_homework_fails() {
        let (storage, class_id) = setup().await;
        let mut sync = HomeworkSync::new(storage, ChangeFeed::new(4), class_id);
        sync.activate().await;
        let err = sync.toggle_completion("nope", "u1", true).await.unwrap_err();
        assert!(matches!(err, PlannerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_next_change_without_activate_is_closed() {
        let (storage, class_id) = setup().await;
        let mut sync = HomeworkSync::new(storage, ChangeFeed::new(4), class_id);
        assert_eq!(sync.next_change().await, SyncUpdate::Closed);
    }
}
