//! SeaORM 数据库实体
//!
//! 存储层使用这些实体读写数据库，再通过 `into_*` 转换为 models 中的业务实体。
//! 时间统一以 Unix 秒存储，完成状态的更新时间精确到毫秒。

pub mod prelude;

pub mod announcements;
pub mod audit_logs;
pub mod classes;
pub mod content_reports;
pub mod homework;
pub mod homework_attachments;
pub mod homework_completion;
pub mod notifications;
pub mod profiles;

use chrono::{DateTime, Utc};

pub(crate) fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default()
}

pub(crate) fn from_unix_millis(millis: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_default()
}
