use serde::Serialize;
use ts_rs::TS;

use super::entities::HomeworkWithRelations;

/// 筛选后的作业，以及班级全部作业中出现过的科目（排序去重）
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/homework.ts")]
pub struct HomeworkListResponse {
    pub homework: Vec<HomeworkWithRelations>,
    pub subjects: Vec<String>,
}

/// 今日概览中的计数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/homework.ts")]
pub struct HomeworkDigest {
    pub due_today: usize,
    pub due_tomorrow: usize,
    pub overdue: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/homework.ts")]
pub struct CalendarDay {
    pub date: chrono::NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    pub homework_ids: Vec<String>,
}

/// 以周日为每周第一天的整周月历
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/homework.ts")]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<Vec<CalendarDay>>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/homework.ts")]
pub struct SignedUrlResponse {
    pub url: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}
