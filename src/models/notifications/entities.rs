use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 通知类型
pub const HOMEWORK_CREATED: &str = "homework_created";
pub const HOMEWORK_UPDATED: &str = "homework_updated";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/notification.ts")]
pub struct Notification {
    pub id: String,
    pub user_id: Option<String>,
    pub class_id: Option<String>,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: Option<String>,
    pub read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Option<String>,
    pub class_id: Option<String>,
    pub notification_type: String,
    pub title: String,
    pub message: Option<String>,
}
