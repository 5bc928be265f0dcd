//! 通知存储操作

use super::{SeaOrmStorage, new_id};
use crate::entity::notifications::{ActiveModel, Column, Entity as Notifications};
use crate::errors::{PlannerError, Result};
use crate::models::notifications::entities::{NewNotification, Notification};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 批量创建通知（同一事务）
    pub async fn create_notifications_impl(
        &self,
        notifications: Vec<NewNotification>,
    ) -> Result<Vec<Notification>> {
        if notifications.is_empty() {
            return Ok(Vec::new());
        }

        let now = chrono::Utc::now().timestamp();
        let ids: Vec<String> = notifications.iter().map(|_| new_id()).collect();
        let models: Vec<ActiveModel> = notifications
            .into_iter()
            .zip(ids.iter().cloned())
            .map(|(n, id)| ActiveModel {
                id: Set(id),
                user_id: Set(n.user_id),
                class_id: Set(n.class_id),
                notification_type: Set(n.notification_type),
                title: Set(n.title),
                message: Set(n.message),
                read: Set(false),
                created_at: Set(now),
            })
            .collect();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| PlannerError::database_operation(format!("开启事务失败: {e}")))?;

        Notifications::insert_many(models)
            .exec_without_returning(&txn)
            .await
            .map_err(|e| PlannerError::database_operation(format!("创建通知失败: {e}")))?;

        let rows = Notifications::find()
            .filter(Column::Id.is_in(ids))
            .all(&txn)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询通知失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| PlannerError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_notification()).collect())
    }

    /// 最近的通知，按创建时间倒序
    pub async fn list_recent_notifications_impl(
        &self,
        user_id: &str,
        limit: u64,
    ) -> Result<Vec<Notification>> {
        let rows = Notifications::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询通知列表失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_notification()).collect())
    }

    /// 只能标记属于自己的通知
    pub async fn mark_notification_read_impl(
        &self,
        notification_id: &str,
        user_id: &str,
    ) -> Result<bool> {
        let result = Notifications::update_many()
            .col_expr(Column::Read, Expr::value(true))
            .filter(Column::Id.eq(notification_id))
            .filter(Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("标记通知已读失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn mark_all_notifications_read_impl(&self, user_id: &str) -> Result<u64> {
        let result = Notifications::update_many()
            .col_expr(Column::Read, Expr::value(true))
            .filter(Column::UserId.eq(user_id))
            .filter(Column::Read.eq(false))
            .exec(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("标记全部已读失败: {e}")))?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notifications::entities::HOMEWORK_CREATED;

    fn notice(user: &str) -> NewNotification {
        NewNotification {
            user_id: Some(user.into()),
            class_id: Some("c1".into()),
            notification_type: HOMEWORK_CREATED.into(),
            title: "New homework: essay".into(),
            message: Some("Due tomorrow".into()),
        }
    }

    #[tokio::test]
    async fn test_create_and_mark_read() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let created = storage
            .create_notifications_impl(vec![notice("u1"), notice("u1"), notice("u2")])
            .await
            .unwrap();
        assert_eq!(created.len(), 3);

        let mine = storage.list_recent_notifications_impl("u1", 10).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|n| !n.read));

        // 不能标记他人的通知
        let theirs = created
            .iter()
            .find(|n| n.user_id.as_deref() == Some("u2"))
            .unwrap();
        assert!(!storage.mark_notification_read_impl(&theirs.id, "u1").await.unwrap());
        assert!(storage.mark_notification_read_impl(&mine[0].id, "u1").await.unwrap());

        assert_eq!(storage.mark_all_notifications_read_impl("u1").await.unwrap(), 1);
        assert_eq!(storage.mark_all_notifications_read_impl("u1").await.unwrap(), 0);

        let limited = storage.list_recent_notifications_impl("u1", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }
}
