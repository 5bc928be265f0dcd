//! 内容举报存储操作

use super::{SeaOrmStorage, new_id};
use crate::entity::content_reports::ActiveModel;
use crate::errors::{PlannerError, Result};
use crate::models::reports::{ContentReport, NewContentReport};
use sea_orm::{ActiveModelTrait, Set};

impl SeaOrmStorage {
    /// 新举报一律为 pending
    pub async fn create_report_impl(&self, report: NewContentReport) -> Result<ContentReport> {
        let model = ActiveModel {
            id: Set(new_id()),
            homework_id: Set(report.homework_id),
            reported_by: Set(report.reported_by),
            reason: Set(report.reason),
            description: Set(report.description),
            status: Set("pending".to_string()),
            created_at: Set(chrono::Utc::now().timestamp()),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| PlannerError::database_operation(format!("创建举报失败: {e}")))?;

        Ok(result.into_report())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::homework::requests::NewHomework;

    #[tokio::test]
    async fn test_report_starts_pending() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let class = storage.create_class_impl("1HAT2", None).await.unwrap();
        let hw = storage
            .create_homework_impl(NewHomework {
                class_id: class.id,
                title: "spam".into(),
                description: None,
                subject: None,
                due_date: chrono::Utc::now(),
                created_by: None,
            })
            .await
            .unwrap();

        let report = storage
            .create_report_impl(NewContentReport {
                homework_id: hw.id.clone(),
                reported_by: "u1".into(),
                reason: "Spam or misleading".into(),
                description: None,
            })
            .await
            .unwrap();
        assert_eq!(report.status, "pending");
        assert_eq!(report.homework_id, hw.id);
    }
}
