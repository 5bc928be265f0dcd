use serde::Deserialize;
use ts_rs::TS;

use super::entities::AnnouncementPriority;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/announcement.ts")]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub content: Option<String>,
    #[serde(default)]
    pub priority: AnnouncementPriority,
    #[serde(default)]
    pub pinned: bool,
}

#[derive(Debug, Clone)]
pub struct NewAnnouncement {
    pub class_id: String,
    pub title: String,
    pub content: Option<String>,
    pub priority: AnnouncementPriority,
    pub pinned: bool,
    pub created_by: Option<String>,
}
