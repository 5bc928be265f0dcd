use serde::Serialize;
use ts_rs::TS;

use super::entities::Profile;
use crate::models::homework::entities::{Completion, Homework};

/// 账号数据导出
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/profile.ts")]
pub struct AccountExport {
    pub profile: Option<Profile>,
    pub homework: Vec<Homework>,
    pub completions: Vec<Completion>,
    pub exported_at: chrono::DateTime<chrono::Utc>,
}
