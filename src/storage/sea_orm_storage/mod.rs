//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod announcements;
mod audit_logs;
mod classes;
mod completion;
mod homework;
mod notifications;
mod profiles;
mod reports;

use crate::config::AppConfig;
use crate::errors::{PlannerError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 按全局配置创建存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        Self::connect(
            &config.database.url,
            config.database.pool_size,
            config.database.timeout,
        )
        .await
    }

    /// 连接数据库并执行迁移
    pub async fn connect(url: &str, pool_size: u32, timeout: u64) -> Result<Self> {
        let db_url = Self::build_database_url(url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, pool_size, timeout).await?
        } else {
            Self::connect_generic(&db_url, pool_size, timeout).await?
        };

        Migrator::up(&db, None)
            .await
            .map_err(|e| PlannerError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// 单连接的内存 SQLite，供测试使用
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:", 1, 5).await
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, pool_size: u32, timeout: u64) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let in_memory = url.contains(":memory:");

        let mut opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| PlannerError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");
        if !in_memory {
            opt = opt
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .pragma("mmap_size", "536870912")
                .pragma("wal_autocheckpoint", "1000");
        }

        let mut pool = SqlitePoolOptions::new()
            .max_connections(pool_size.max(1))
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(timeout));
        // 内存库随连接关闭而消失，不能回收空闲连接
        pool = if in_memory {
            pool.idle_timeout(None).max_lifetime(None)
        } else {
            pool.idle_timeout(Duration::from_secs(300))
        };

        let pool = pool
            .connect_with(opt)
            .await
            .map_err(|e| PlannerError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, pool_size: u32, timeout: u64) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(pool_size)
            .min_connections(pool_size.min(5))
            .connect_timeout(Duration::from_secs(timeout))
            .acquire_timeout(Duration::from_secs(timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| PlannerError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(PlannerError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// Storage trait 实现
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
use crate::storage::{ClassCodeLookup, Storage};
use async_trait::async_trait;

#[async_trait]
impl ClassCodeLookup for SeaOrmStorage {
    async fn lookup_class_by_code(&self, code: &str) -> Result<Vec<ClassLookupRow>> {
        self.lookup_class_by_code_impl(code).await
    }
}

#[async_trait]
impl Storage for SeaOrmStorage {
    // 班级模块
    async fn create_class(&self, code: &str, name: Option<String>) -> Result<Class> {
        self.create_class_impl(code, name).await
    }

    async fn get_class_by_id(&self, class_id: &str) -> Result<Option<Class>> {
        self.get_class_by_id_impl(class_id).await
    }

    // 资料模块
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        self.get_profile_impl(user_id).await
    }

    async fn create_profile_if_absent(&self, profile: CreateProfile) -> Result<bool> {
        self.create_profile_if_absent_impl(profile).await
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: UpdateProfileRequest,
    ) -> Result<Option<Profile>> {
        self.update_profile_impl(user_id, update).await
    }

    async fn delete_profile(&self, user_id: &str) -> Result<bool> {
        self.delete_profile_impl(user_id).await
    }

    async fn list_class_member_ids(&self, class_id: &str) -> Result<Vec<String>> {
        self.list_class_member_ids_impl(class_id).await
    }

    // 作业模块
    async fn list_homework_rows(&self, class_id: &str) -> Result<Vec<serde_json::Value>> {
        self.list_homework_rows_impl(class_id).await
    }

    async fn list_class_homework(&self, class_id: &str) -> Result<Vec<Homework>> {
        self.list_class_homework_impl(class_id).await
    }

    async fn list_homework_by_creator(&self, user_id: &str) -> Result<Vec<Homework>> {
        self.list_homework_by_creator_impl(user_id).await
    }

    async fn get_homework(&self, homework_id: &str) -> Result<Option<Homework>> {
        self.get_homework_impl(homework_id).await
    }

    async fn create_homework(&self, homework: NewHomework) -> Result<Homework> {
        self.create_homework_impl(homework).await
    }

    async fn update_homework(
        &self,
        homework_id: &str,
        form: HomeworkForm,
    ) -> Result<Option<Homework>> {
        self.update_homework_impl(homework_id, form).await
    }

    async fn delete_homework(&self, homework_id: &str) -> Result<bool> {
        self.delete_homework_impl(homework_id).await
    }

    // 附件模块
    async fn create_attachment(&self, attachment: NewAttachment) -> Result<Attachment> {
        self.create_attachment_impl(attachment).await
    }

    async fn get_attachment(&self, attachment_id: &str) -> Result<Option<Attachment>> {
        self.get_attachment_impl(attachment_id).await
    }

    async fn list_attachments(&self, homework_id: &str) -> Result<Vec<Attachment>> {
        self.list_attachments_impl(homework_id).await
    }

    async fn delete_attachment(&self, attachment_id: &str) -> Result<bool> {
        self.delete_attachment_impl(attachment_id).await
    }

    // 完成状态模块
    async fn upsert_completion(
        &self,
        homework_id: &str,
        user_id: &str,
        done: bool,
    ) -> Result<Completion> {
        self.upsert_completion_impl(homework_id, user_id, done)
            .await
    }

    async fn get_completion(
        &self,
        homework_id: &str,
        user_id: &str,
    ) -> Result<Option<Completion>> {
        self.find_completion_impl(homework_id, user_id).await
    }

    async fn list_completions_for_user(&self, user_id: &str) -> Result<Vec<Completion>> {
        self.list_completions_for_user_impl(user_id).await
    }

    // 公告模块
    async fn list_announcements(&self, class_id: &str) -> Result<Vec<Announcement>> {
        self.list_announcements_impl(class_id).await
    }

    async fn get_announcement(&self, announcement_id: &str) -> Result<Option<Announcement>> {
        self.get_announcement_impl(announcement_id).await
    }

    async fn create_announcement(&self, announcement: NewAnnouncement) -> Result<Announcement> {
        self.create_announcement_impl(announcement).await
    }

    async fn set_announcement_pinned(
        &self,
        announcement_id: &str,
        pinned: bool,
    ) -> Result<Option<Announcement>> {
        self.set_announcement_pinned_impl(announcement_id, pinned)
            .await
    }

    async fn delete_announcement(&self, announcement_id: &str) -> Result<bool> {
        self.delete_announcement_impl(announcement_id).await
    }

    // 通知模块
    async fn create_notifications(
        &self,
        notifications: Vec<NewNotification>,
    ) -> Result<Vec<Notification>> {
        self.create_notifications_impl(notifications).await
    }

    async fn list_recent_notifications(
        &self,
        user_id: &str,
        limit: u64,
    ) -> Result<Vec<Notification>> {
        self.list_recent_notifications_impl(user_id, limit).await
    }

    async fn mark_notification_read(
        &self,
        notification_id: &str,
        user_id: &str,
    ) -> Result<bool> {
        self.mark_notification_read_impl(notification_id, user_id)
            .await
    }

    async fn mark_all_notifications_read(&self, user_id: &str) -> Result<u64> {
        self.mark_all_notifications_read_impl(user_id).await
    }

    // 审计模块
    async fn create_audit_log(&self, log: NewAuditLog) -> Result<AuditLog> {
        self.create_audit_log_impl(log).await
    }

    async fn list_recent_audit_logs(&self, user_id: &str, limit: u64) -> Result<Vec<AuditLog>> {
        self.list_recent_audit_logs_impl(user_id, limit).await
    }

    // 举报模块
    async fn create_report(&self, report: NewContentReport) -> Result<ContentReport> {
        self.create_report_impl(report).await
    }
}
