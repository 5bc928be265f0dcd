//! 公告存储操作

use super::{SeaOrmStorage, new_id};
use crate::entity::announcements::{ActiveModel, Column, Entity as Announcements};
use crate::errors::{PlannerError, Result};
use crate::models::announcements::{entities::Announcement, requests::NewAnnouncement};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 置顶优先，其次按发布时间倒序
    pub async fn list_announcements_impl(&self, class_id: &str) -> Result<Vec<Announcement>> {
        let rows = Announcements::find()
            .filter(Column::ClassId.eq(class_id))
            .order_by_desc(Column::Pinned)
            .order_by_desc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询公告列表失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_announcement()).collect())
    }

    pub async fn get_announcement_impl(&self, announcement_id: &str) -> Result<Option<Announcement>> {
        let result = Announcements::find_by_id(announcement_id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询公告失败: {e}")))?;

        Ok(result.map(|m| m.into_announcement()))
    }

    pub async fn create_announcement_impl(&self, req: NewAnnouncement) -> Result<Announcement> {
        let model = ActiveModel {
            id: Set(new_id()),
            class_id: Set(req.class_id),
            title: Set(req.title),
            content: Set(req.content),
            priority: Set(req.priority.to_string()),
            pinned: Set(req.pinned),
            created_by: Set(req.created_by),
            created_at: Set(chrono::Utc::now().timestamp()),
            updated_at: Set(None),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("创建公告失败: {e}")))?;

        Ok(result.into_announcement())
    }

    pub async fn set_announcement_pinned_impl(
        &self,
        announcement_id: &str,
        pinned: bool,
    ) -> Result<Option<Announcement>> {
        let Some(existing) = Announcements::find_by_id(announcement_id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询公告失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.pinned = Set(pinned);
        model.updated_at = Set(Some(chrono::Utc::now().timestamp()));

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("更新公告失败: {e}")))?;

        Ok(Some(updated.into_announcement()))
    }

    pub async fn delete_announcement_impl(&self, announcement_id: &str) -> Result<bool> {
        let result = Announcements::delete_by_id(announcement_id.to_string())
            .exec(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("删除公告失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::announcements::entities::AnnouncementPriority;

    fn announcement(class_id: &str, title: &str, pinned: bool) -> NewAnnouncement {
        NewAnnouncement {
            class_id: class_id.into(),
            title: title.into(),
            content: None,
            priority: AnnouncementPriority::High,
            pinned,
            created_by: Some("u1".into()),
        }
    }

    #[tokio::test]
    async fn test_pinned_first_then_pin_toggle() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let class = storage.create_class_impl("3CD2", None).await.unwrap();

        let plain = storage
            .create_announcement_impl(announcement(&class.id, "plain", false))
            .await
            .unwrap();
        storage
            .create_announcement_impl(announcement(&class.id, "pinned", true))
            .await
            .unwrap();

        let list = storage.list_announcements_impl(&class.id).await.unwrap();
        assert_eq!(list[0].title, "pinned");
        assert_eq!(list[1].priority, AnnouncementPriority::High);

        let updated = storage
            .set_announcement_pinned_impl(&plain.id, true)
            .await
            .unwrap()
            .unwrap();
        assert!(updated.pinned);
        assert!(updated.updated_at.is_some());

        assert!(storage.delete_announcement_impl(&plain.id).await.unwrap());
        assert!(storage.get_announcement_impl(&plain.id).await.unwrap().is_none());
    }
}
