//! 作业完成状态存储操作

use super::{SeaOrmStorage, new_id};
use crate::entity::homework_completion::{ActiveModel, Column, Entity as HomeworkCompletion};
use crate::errors::{PlannerError, Result};
use crate::models::homework::entities::Completion;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};

impl SeaOrmStorage {
    /// 写入完成状态，(homework_id, user_id) 冲突时只更新 done 与时间
    pub async fn upsert_completion_impl(
        &self,
        homework_id: &str,
        user_id: &str,
        done: bool,
    ) -> Result<Completion> {
        let model = ActiveModel {
            id: Set(new_id()),
            homework_id: Set(homework_id.to_string()),
            user_id: Set(user_id.to_string()),
            done: Set(done),
            updated_at: Set(chrono::Utc::now().timestamp_millis()),
        };

        HomeworkCompletion::insert(model)
            .on_conflict(
                OnConflict::columns([Column::HomeworkId, Column::UserId])
                    .update_columns([Column::Done, Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("写入完成状态失败: {e}")))?;

        self.find_completion_impl(homework_id, user_id)
            .await?
            .ok_or_else(|| PlannerError::not_found(format!("完成状态不存在: {homework_id}")))
    }

    /// 按 (homework_id, user_id) 查询单条完成状态
    pub async fn find_completion_impl(
        &self,
        homework_id: &str,
        user_id: &str,
    ) -> Result<Option<Completion>> {
        let row = HomeworkCompletion::find()
            .filter(Column::HomeworkId.eq(homework_id))
            .filter(Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询完成状态失败: {e}")))?;

        Ok(row.map(|m| m.into_completion()))
    }

    pub async fn list_completions_for_user_impl(&self, user_id: &str) -> Result<Vec<Completion>> {
        let rows = HomeworkCompletion::find()
            .filter(Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询完成状态失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_completion()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::homework::requests::NewHomework;

    #[tokio::test]
    async fn test_toggle_twice_keeps_single_row() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let class = storage.create_class_impl("2BC1", None).await.unwrap();
        let hw = storage
            .create_homework_impl(NewHomework {
                class_id: class.id,
                title: "read chapter 3".into(),
                description: None,
                subject: None,
                due_date: chrono::Utc::now(),
                created_by: None,
            })
            .await
            .unwrap();

        let first = storage.upsert_completion_impl(&hw.id, "u1", true).await.unwrap();
        assert!(first.done);

        let second = storage.upsert_completion_impl(&hw.id, "u1", false).await.unwrap();
        assert!(!second.done);
        assert_eq!(first.id, second.id);

        let found = storage.find_completion_impl(&hw.id, "u1").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert!(!found.done);
        assert!(storage.find_completion_impl(&hw.id, "u2").await.unwrap().is_none());

        let all = storage.list_completions_for_user_impl("u1").await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(storage.list_completions_for_user_impl("u2").await.unwrap().is_empty());
    }
}
