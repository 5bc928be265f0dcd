use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "../frontend/src/types/generated/announcement.ts")]
pub enum AnnouncementPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl AnnouncementPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnouncementPriority::Low => "low",
            AnnouncementPriority::Normal => "normal",
            AnnouncementPriority::High => "high",
            AnnouncementPriority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for AnnouncementPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnouncementPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(AnnouncementPriority::Low),
            "normal" => Ok(AnnouncementPriority::Normal),
            "high" => Ok(AnnouncementPriority::High),
            "urgent" => Ok(AnnouncementPriority::Urgent),
            other => Err(format!("Unknown announcement priority: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/announcement.ts")]
pub struct Announcement {
    pub id: String,
    pub class_id: String,
    pub title: String,
    pub content: Option<String>,
    pub priority: AnnouncementPriority,
    pub pinned: bool,
    pub created_by: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}
