//! 用户资料存储操作

use super::SeaOrmStorage;
use crate::entity::profiles::{ActiveModel, Column, Entity as Profiles};
use crate::errors::{PlannerError, Result};
use crate::models::profiles::{
    entities::Profile,
    requests::{CreateProfile, UpdateProfileRequest},
};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set};

impl SeaOrmStorage {
    pub async fn get_profile_impl(&self, user_id: &str) -> Result<Option<Profile>> {
        let result = Profiles::find_by_id(user_id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询用户资料失败: {e}")))?;

        Ok(result.map(|m| m.into_profile()))
    }

    /// 主键冲突时什么也不做，重复创建不算错误
    pub async fn create_profile_if_absent_impl(&self, profile: CreateProfile) -> Result<bool> {
        let model = ActiveModel {
            id: Set(profile.id),
            class_id: Set(profile.class_id),
            display_name: Set(profile.display_name),
            avatar_url: Set(profile.avatar_url),
            created_at: Set(chrono::Utc::now().timestamp()),
        };

        let inserted = Profiles::insert(model)
            .on_conflict(OnConflict::column(Column::Id).do_nothing().to_owned())
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("创建用户资料失败: {e}")))?;

        Ok(inserted > 0)
    }

    pub async fn update_profile_impl(
        &self,
        user_id: &str,
        update: UpdateProfileRequest,
    ) -> Result<Option<Profile>> {
        let Some(existing) = Profiles::find_by_id(user_id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询用户资料失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        if let Some(display_name) = update.display_name {
            model.display_name = Set(Some(display_name));
        }
        if let Some(avatar_url) = update.avatar_url {
            model.avatar_url = Set(Some(avatar_url));
        }

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("更新用户资料失败: {e}")))?;

        Ok(Some(updated.into_profile()))
    }

    pub async fn delete_profile_impl(&self, user_id: &str) -> Result<bool> {
        let result = Profiles::delete_by_id(user_id.to_string())
            .exec(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("删除用户资料失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn list_class_member_ids_impl(&self, class_id: &str) -> Result<Vec<String>> {
        let ids: Vec<String> = Profiles::find()
            .select_only()
            .column(Column::Id)
            .filter(Column::ClassId.eq(class_id))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询班级成员失败: {e}")))?;

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_profile(id: &str, class_id: &str, name: &str) -> CreateProfile {
        CreateProfile {
            id: id.into(),
            class_id: class_id.into(),
            display_name: Some(name.into()),
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_profile_is_idempotent() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let class = storage.create_class_impl("1HAT2", None).await.unwrap();

        assert!(
            storage
                .create_profile_if_absent_impl(new_profile("u1", &class.id, "ana"))
                .await
                .unwrap()
        );
        // 第二次创建不覆盖原有资料
        assert!(
            !storage
                .create_profile_if_absent_impl(new_profile("u1", &class.id, "other"))
                .await
                .unwrap()
        );

        let profile = storage.get_profile_impl("u1").await.unwrap().unwrap();
        assert_eq!(profile.display_name.as_deref(), Some("ana"));
        assert_eq!(
            storage.list_class_member_ids_impl(&class.id).await.unwrap(),
            vec!["u1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_update_and_delete_profile() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let class = storage.create_class_impl("1HAT2", None).await.unwrap();
        storage
            .create_profile_if_absent_impl(new_profile("u1", &class.id, "ana"))
            .await
            .unwrap();

        let updated = storage
            .update_profile_impl(
                "u1",
                UpdateProfileRequest {
                    display_name: Some("Ana".into()),
                    avatar_url: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.display_name.as_deref(), Some("Ana"));

        assert!(storage.delete_profile_impl("u1").await.unwrap());
        assert!(storage.get_profile_impl("u1").await.unwrap().is_none());
    }
}
