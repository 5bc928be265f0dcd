use serde::Deserialize;
use ts_rs::TS;

/// 新建与编辑共用的表单
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/homework.ts")]
pub struct HomeworkForm {
    pub title: String,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub due_date: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/homework.ts")]
pub struct ToggleCompletionRequest {
    pub done: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/homework.ts")]
pub enum HomeworkStatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/homework.ts")]
pub enum HomeworkSortKey {
    #[default]
    DueDate,
    CreatedAt,
    Subject,
    Title,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/homework.ts")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// 作业列表的搜索、筛选与排序参数，全部可省略
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/homework.ts")]
pub struct HomeworkListQuery {
    /// 在标题、描述、科目中搜索（不区分大小写）
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub status: HomeworkStatusFilter,
    #[serde(default)]
    pub sort_by: HomeworkSortKey,
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/homework.ts")]
pub struct CalendarQuery {
    pub year: i32,
    pub month: u32,
}

/// 写入存储的作业字段，id 与时间戳由存储层生成
#[derive(Debug, Clone)]
pub struct NewHomework {
    pub class_id: String,
    pub title: String,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub due_date: chrono::DateTime<chrono::Utc>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub homework_id: String,
    pub storage_path: String,
    pub filename: String,
    pub mime_type: String,
    pub uploaded_by: Option<String>,
}

/// 签名下载链接的查询参数
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadQuery {
    pub token: String,
}
