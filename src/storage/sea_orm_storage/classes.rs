//! 班级存储操作

use super::{SeaOrmStorage, new_id};
use crate::entity::classes::{ActiveModel, Column, Entity as Classes};
use crate::errors::{PlannerError, Result};
use crate::models::classes::entities::{Class, ClassLookupRow};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

impl SeaOrmStorage {
    /// 创建班级
    pub async fn create_class_impl(&self, code: &str, name: Option<String>) -> Result<Class> {
        let model = ActiveModel {
            id: Set(new_id()),
            code: Set(code.trim().to_uppercase()),
            name: Set(name),
            created_at: Set(chrono::Utc::now().timestamp()),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("创建班级失败: {e}")))?;

        Ok(result.into_class())
    }

    /// 通过 ID 获取班级
    pub async fn get_class_by_id_impl(&self, class_id: &str) -> Result<Option<Class>> {
        let result = Classes::find_by_id(class_id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询班级失败: {e}")))?;

        Ok(result.map(|m| m.into_class()))
    }

    /// 通过加入码查询班级
    pub async fn lookup_class_by_code_impl(&self, code: &str) -> Result<Vec<ClassLookupRow>> {
        let rows = Classes::find()
            .filter(Column::Code.eq(code))
            .all(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询班级失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_lookup_row()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_by_code() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let class = storage
            .create_class_impl("3ht1", Some("Class 3HT1".into()))
            .await
            .unwrap();
        assert_eq!(class.code, "3HT1");

        let rows = storage.lookup_class_by_code_impl("3HT1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].resolved_class_id(), class.id);

        assert!(storage.lookup_class_by_code_impl("9ZZ9").await.unwrap().is_empty());
    }
}
