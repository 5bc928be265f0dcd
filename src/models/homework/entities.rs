use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/homework.ts")]
pub struct Homework {
    pub id: String,
    pub class_id: String,
    pub title: String,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub due_date: chrono::DateTime<chrono::Utc>,
    pub created_by: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/homework.ts")]
pub struct Attachment {
    pub id: String,
    pub homework_id: String,
    // 对象存储中的路径
    pub storage_path: String,
    pub filename: String,
    pub mime_type: String,
    pub uploaded_by: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/homework.ts")]
pub struct Completion {
    pub id: String,
    pub homework_id: String,
    pub user_id: String,
    pub done: bool,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/homework.ts")]
pub struct Creator {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// 带附件、完成状态和创建者信息的作业
///
/// 行中未识别的字段原样保留在 `extra` 中并随序列化输出。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/homework.ts")]
pub struct HomeworkWithRelations {
    #[serde(flatten)]
    pub homework: Homework,
    pub attachments: Vec<Attachment>,
    pub completion: Vec<Completion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<Creator>,
    #[serde(flatten)]
    #[ts(skip)]
    pub extra: Map<String, Value>,
}

impl HomeworkWithRelations {
    pub fn id(&self) -> &str {
        &self.homework.id
    }

    /// 不带任何关联数据的作业
    pub fn bare(homework: Homework) -> Self {
        Self {
            homework,
            attachments: Vec::new(),
            completion: Vec::new(),
            creator: None,
            extra: Map::new(),
        }
    }

    pub fn is_done_by(&self, user_id: &str) -> bool {
        self.completion
            .iter()
            .any(|c| c.user_id == user_id && c.done)
    }
}
