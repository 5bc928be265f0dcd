use std::sync::Arc;

use crate::models::{
    announcements::{entities::Announcement, requests::NewAnnouncement},
    audit::{AuditLog, NewAuditLog},
    classes::entities::{Class, ClassLookupRow},
    homework::{
        entities::{Attachment, Completion, Homework},
        requests::{HomeworkForm, NewAttachment, NewHomework},
    },
    notifications::entities::{NewNotification, Notification},
    profiles::{
        entities::Profile,
        requests::{CreateProfile, UpdateProfileRequest},
    },
    reports::{ContentReport, NewContentReport},
};

use crate::errors::Result;

pub mod sea_orm_storage;

/// 按加入码查找班级
///
/// 单独成 trait，加入码校验只依赖这一个能力。
#[async_trait::async_trait]
pub trait ClassCodeLookup: Send + Sync {
    async fn lookup_class_by_code(&self, code: &str) -> Result<Vec<ClassLookupRow>>;
}

#[async_trait::async_trait]
pub trait Storage: ClassCodeLookup + Send + Sync {
    /// 班级
    async fn create_class(&self, code: &str, name: Option<String>) -> Result<Class>;
    async fn get_class_by_id(&self, class_id: &str) -> Result<Option<Class>>;

    /// 用户资料
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>>;
    // 已存在时不做修改，返回是否新建
    async fn create_profile_if_absent(&self, profile: CreateProfile) -> Result<bool>;
    async fn update_profile(
        &self,
        user_id: &str,
        update: UpdateProfileRequest,
    ) -> Result<Option<Profile>>;
    async fn delete_profile(&self, user_id: &str) -> Result<bool>;
    async fn list_class_member_ids(&self, class_id: &str) -> Result<Vec<String>>;

    /// 作业
    // 班级全部作业及附件、完成状态、创建者，按截止时间升序，返回后端原始行
    async fn list_homework_rows(&self, class_id: &str) -> Result<Vec<serde_json::Value>>;
    async fn list_class_homework(&self, class_id: &str) -> Result<Vec<Homework>>;
    async fn list_homework_by_creator(&self, user_id: &str) -> Result<Vec<Homework>>;
    async fn get_homework(&self, homework_id: &str) -> Result<Option<Homework>>;
    async fn create_homework(&self, homework: NewHomework) -> Result<Homework>;
    async fn update_homework(&self, homework_id: &str, form: HomeworkForm)
    -> Result<Option<Homework>>;
    async fn delete_homework(&self, homework_id: &str) -> Result<bool>;

    /// 附件
    async fn create_attachment(&self, attachment: NewAttachment) -> Result<Attachment>;
    async fn get_attachment(&self, attachment_id: &str) -> Result<Option<Attachment>>;
    async fn list_attachments(&self, homework_id: &str) -> Result<Vec<Attachment>>;
    async fn delete_attachment(&self, attachment_id: &str) -> Result<bool>;

    /// 完成状态
    // 以 (homework_id, user_id) 为键原子写入
    async fn upsert_completion(
        &self,
        homework_id: &str,
        user_id: &str,
        done: bool,
    ) -> Result<Completion>;
    async fn get_completion(&self, homework_id: &str, user_id: &str)
    -> Result<Option<Completion>>;
    async fn list_completions_for_user(&self, user_id: &str) -> Result<Vec<Completion>>;

    /// 公告
    async fn list_announcements(&self, class_id: &str) -> Result<Vec<Announcement>>;
    async fn get_announcement(&self, announcement_id: &str) -> Result<Option<Announcement>>;
    async fn create_announcement(&self, announcement: NewAnnouncement) -> Result<Announcement>;
    async fn set_announcement_pinned(
        &self,
        announcement_id: &str,
        pinned: bool,
    ) -> Result<Option<Announcement>>;
    async fn delete_announcement(&self, announcement_id: &str) -> Result<bool>;

    /// 通知
    async fn create_notifications(
        &self,
        notifications: Vec<NewNotification>,
    ) -> Result<Vec<Notification>>;
    async fn list_recent_notifications(
        &self,
        user_id: &str,
        limit: u64,
    ) -> Result<Vec<Notification>>;
    async fn mark_notification_read(&self, notification_id: &str, user_id: &str)
    -> Result<bool>;
    async fn mark_all_notifications_read(&self, user_id: &str) -> Result<u64>;

    /// 审计日志
    async fn create_audit_log(&self, log: NewAuditLog) -> Result<AuditLog>;
    async fn list_recent_audit_logs(&self, user_id: &str, limit: u64) -> Result<Vec<AuditLog>>;

    /// 内容举报
    async fn create_report(&self, report: NewContentReport) -> Result<ContentReport>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
