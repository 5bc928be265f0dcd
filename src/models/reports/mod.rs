use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 可选的举报原因
pub const REPORT_REASONS: [&str; 6] = [
    "Inappropriate content",
    "Spam or misleading",
    "Harassment or bullying",
    "Violence or threats",
    "Hate speech",
    "Other",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct ContentReport {
    pub id: String,
    pub homework_id: String,
    pub reported_by: String,
    pub reason: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct CreateReportRequest {
    pub homework_id: String,
    #[serde(default)]
    pub reason: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewContentReport {
    pub homework_id: String,
    pub reported_by: String,
    pub reason: String,
    pub description: Option<String>,
}
