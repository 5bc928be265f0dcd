use serde::Serialize;
use ts_rs::TS;

/// 标记全部已读响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/notification.ts")]
pub struct MarkAllReadResponse {
    pub marked_count: u64,
}
