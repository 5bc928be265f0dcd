//! 作业与附件存储操作

use std::collections::HashMap;

use super::{SeaOrmStorage, new_id};
use crate::entity::homework::{ActiveModel, Column, Entity as Homework};
use crate::entity::{homework_attachments, homework_completion, profiles};
use crate::errors::{PlannerError, Result};
use crate::models::homework::{
    entities::{self, Attachment},
    requests::{HomeworkForm, NewAttachment, NewHomework},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde_json::{Value, json};

impl SeaOrmStorage {
    /// 班级全部作业，附带附件、完成状态与创建者，字段名与后端关联查询一致
    pub async fn list_homework_rows_impl(&self, class_id: &str) -> Result<Vec<Value>> {
        let homework = Homework::find()
            .filter(Column::ClassId.eq(class_id))
            .order_by_asc(Column::DueDate)
            .all(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询作业列表失败: {e}")))?;

        if homework.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = homework.iter().map(|h| h.id.clone()).collect();
        let creator_ids: Vec<String> = homework
            .iter()
            .filter_map(|h| h.created_by.clone())
            .collect();

        let attachments = homework_attachments::Entity::find()
            .filter(homework_attachments::Column::HomeworkId.is_in(ids.clone()))
            .order_by_asc(homework_attachments::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询作业附件失败: {e}")))?;

        let completions = homework_completion::Entity::find()
            .filter(homework_completion::Column::HomeworkId.is_in(ids))
            .all(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询完成状态失败: {e}")))?;

        let creators: HashMap<String, profiles::Model> = if creator_ids.is_empty() {
            HashMap::new()
        } else {
            profiles::Entity::find()
                .filter(profiles::Column::Id.is_in(creator_ids))
                .all(&self.db)
                .await
                .map_err(|e| PlannerError::database_operation(format!("查询创建者失败: {e}")))?
                .into_iter()
                .map(|p| (p.id.clone(), p))
                .collect()
        };

        let mut attachments_by_hw: HashMap<String, Vec<Value>> = HashMap::new();
        for a in attachments {
            let hw = a.homework_id.clone();
            attachments_by_hw
                .entry(hw)
                .or_default()
                .push(serde_json::to_value(a.into_attachment())?);
        }

        let mut completion_by_hw: HashMap<String, Vec<Value>> = HashMap::new();
        for c in completions {
            let hw = c.homework_id.clone();
            completion_by_hw
                .entry(hw)
                .or_default()
                .push(serde_json::to_value(c.into_completion())?);
        }

        let mut rows = Vec::with_capacity(homework.len());
        for h in homework {
            let creator = h
                .created_by
                .as_ref()
                .and_then(|id| creators.get(id))
                .map(|p| json!({ "display_name": p.display_name, "avatar_url": p.avatar_url }))
                .unwrap_or(Value::Null);
            let id = h.id.clone();

            let mut row = serde_json::to_value(h.into_homework())?;
            if let Value::Object(map) = &mut row {
                map.insert(
                    "homework_attachments".into(),
                    Value::Array(attachments_by_hw.remove(&id).unwrap_or_default()),
                );
                map.insert(
                    "homework_completion".into(),
                    Value::Array(completion_by_hw.remove(&id).unwrap_or_default()),
                );
                map.insert("creator".into(), creator);
            }
            rows.push(row);
        }

        Ok(rows)
    }

    pub async fn list_class_homework_impl(&self, class_id: &str) -> Result<Vec<entities::Homework>> {
        let rows = Homework::find()
            .filter(Column::ClassId.eq(class_id))
            .order_by_asc(Column::DueDate)
            .all(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询作业列表失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_homework()).collect())
    }

    pub async fn list_homework_by_creator_impl(
        &self,
        user_id: &str,
    ) -> Result<Vec<entities::Homework>> {
        let rows = Homework::find()
            .filter(Column::CreatedBy.eq(user_id))
            .order_by_asc(Column::DueDate)
            .all(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询作业列表失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_homework()).collect())
    }

    pub async fn get_homework_impl(&self, homework_id: &str) -> Result<Option<entities::Homework>> {
        let result = Homework::find_by_id(homework_id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询作业失败: {e}")))?;

        Ok(result.map(|m| m.into_homework()))
    }

    pub async fn create_homework_impl(&self, req: NewHomework) -> Result<entities::Homework> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            id: Set(new_id()),
            class_id: Set(req.class_id),
            title: Set(req.title),
            description: Set(req.description),
            subject: Set(req.subject),
            due_date: Set(req.due_date.timestamp()),
            created_by: Set(req.created_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("创建作业失败: {e}")))?;

        Ok(result.into_homework())
    }

    pub async fn update_homework_impl(
        &self,
        homework_id: &str,
        form: HomeworkForm,
    ) -> Result<Option<entities::Homework>> {
        let Some(existing) = Homework::find_by_id(homework_id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询作业失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.title = Set(form.title);
        model.description = Set(form.description);
        model.subject = Set(form.subject);
        model.due_date = Set(form.due_date.timestamp());
        model.updated_at = Set(chrono::Utc::now().timestamp());

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("更新作业失败: {e}")))?;

        Ok(Some(updated.into_homework()))
    }

    pub async fn delete_homework_impl(&self, homework_id: &str) -> Result<bool> {
        let result = Homework::delete_by_id(homework_id.to_string())
            .exec(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("删除作业失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn create_attachment_impl(&self, req: NewAttachment) -> Result<Attachment> {
        let model = homework_attachments::ActiveModel {
            id: Set(new_id()),
            homework_id: Set(req.homework_id),
            storage_path: Set(req.storage_path),
            filename: Set(req.filename),
            mime_type: Set(req.mime_type),
            uploaded_by: Set(req.uploaded_by),
            created_at: Set(chrono::Utc::now().timestamp()),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("创建附件记录失败: {e}")))?;

        Ok(result.into_attachment())
    }

    pub async fn get_attachment_impl(&self, attachment_id: &str) -> Result<Option<Attachment>> {
        let result = homework_attachments::Entity::find_by_id(attachment_id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询附件失败: {e}")))?;

        Ok(result.map(|m| m.into_attachment()))
    }

    pub async fn list_attachments_impl(&self, homework_id: &str) -> Result<Vec<Attachment>> {
        let rows = homework_attachments::Entity::find()
            .filter(homework_attachments::Column::HomeworkId.eq(homework_id))
            .order_by_asc(homework_attachments::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询作业附件失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_attachment()).collect())
    }

    pub async fn delete_attachment_impl(&self, attachment_id: &str) -> Result<bool> {
        let result = homework_attachments::Entity::delete_by_id(attachment_id.to_string())
            .exec(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("删除附件记录失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profiles::requests::CreateProfile;
    use chrono::{Duration, Utc};

    async fn seeded() -> (SeaOrmStorage, String) {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let class = storage.create_class_impl("1HAT2", None).await.unwrap();
        storage
            .create_profile_if_absent_impl(CreateProfile {
                id: "u1".into(),
                class_id: class.id.clone(),
                display_name: Some("ana".into()),
                avatar_url: None,
            })
            .await
            .unwrap();
        (storage, class.id)
    }

    fn new_homework(class_id: &str, title: &str, due_in_days: i64) -> NewHomework {
        NewHomework {
            class_id: class_id.into(),
            title: title.into(),
            description: None,
            subject: Some("Math".into()),
            due_date: Utc::now() + Duration::days(due_in_days),
            created_by: Some("u1".into()),
        }
    }

    #[tokio::test]
    async fn test_rows_are_ordered_and_carry_relations() {
        let (storage, class_id) = seeded().await;
        let later = storage
            .create_homework_impl(new_homework(&class_id, "later", 5))
            .await
            .unwrap();
        let sooner = storage
            .create_homework_impl(new_homework(&class_id, "sooner", 1))
            .await
            .unwrap();
        storage
            .create_attachment_impl(NewAttachment {
                homework_id: later.id.clone(),
                storage_path: format!("{}/1-a.pdf", later.id),
                filename: "a.pdf".into(),
                mime_type: "application/pdf".into(),
                uploaded_by: Some("u1".into()),
            })
            .await
            .unwrap();

        let rows = storage.list_homework_rows_impl(&class_id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], sooner.id);
        assert_eq!(rows[1]["homework_attachments"].as_array().unwrap().len(), 1);
        assert_eq!(rows[0]["homework_completion"], json!([]));
        assert_eq!(rows[0]["creator"]["display_name"], "ana");
    }

    #[tokio::test]
    async fn test_update_and_delete_homework() {
        let (storage, class_id) = seeded().await;
        let hw = storage
            .create_homework_impl(new_homework(&class_id, "essay", 2))
            .await
            .unwrap();

        let updated = storage
            .update_homework_impl(
                &hw.id,
                HomeworkForm {
                    title: "essay v2".into(),
                    description: Some("two pages".into()),
                    subject: None,
                    due_date: hw.due_date,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "essay v2");
        assert_eq!(updated.class_id, class_id);

        assert!(storage.delete_homework_impl(&hw.id).await.unwrap());
        assert!(!storage.delete_homework_impl(&hw.id).await.unwrap());
        assert!(
            storage
                .update_homework_impl(
                    &hw.id,
                    HomeworkForm {
                        title: "x".into(),
                        description: None,
                        subject: None,
                        due_date: hw.due_date,
                    },
                )
                .await
                .unwrap()
                .is_none()
        );
    }
}
