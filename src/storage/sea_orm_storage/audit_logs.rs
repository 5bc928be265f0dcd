//! 审计日志存储操作

use super::{SeaOrmStorage, new_id};
use crate::entity::audit_logs::{ActiveModel, Column, Entity as AuditLogs};
use crate::errors::{PlannerError, Result};
use crate::models::audit::{AuditLog, NewAuditLog};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};

impl SeaOrmStorage {
    pub async fn create_audit_log_impl(&self, log: NewAuditLog) -> Result<AuditLog> {
        let details = log
            .details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let model = ActiveModel {
            id: Set(new_id()),
            user_id: Set(log.user_id),
            action: Set(log.action),
            resource_type: Set(log.resource_type),
            resource_id: Set(log.resource_id),
            details: Set(details),
            ip_address: Set(log.ip_address),
            user_agent: Set(log.user_agent),
            created_at: Set(chrono::Utc::now().timestamp()),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("写入审计日志失败: {e}")))?;

        Ok(result.into_audit_log())
    }

    pub async fn list_recent_audit_logs_impl(
        &self,
        user_id: &str,
        limit: u64,
    ) -> Result<Vec<AuditLog>> {
        let rows = AuditLogs::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("查询审计日志失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_audit_log()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_details_survive_storage() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        storage
            .create_audit_log_impl(NewAuditLog {
                user_id: Some("u1".into()),
                action: "homework_created".into(),
                resource_type: Some("homework".into()),
                resource_id: Some("h1".into()),
                details: Some(json!({ "title": "essay" })),
                ip_address: Some("127.0.0.1".into()),
                user_agent: Some("test-agent".into()),
            })
            .await
            .unwrap();

        let logs = storage.list_recent_audit_logs_impl("u1", 20).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].details, Some(json!({ "title": "essay" })));
        assert_eq!(logs[0].ip_address.as_deref(), Some("127.0.0.1"));
        assert!(storage.list_recent_audit_logs_impl("u2", 20).await.unwrap().is_empty());
    }
}
