use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct Class {
    pub id: String,
    // 班级加入码，例如 1HAT2
    pub code: String,
    pub name: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 按加入码查询班级时返回的行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct ClassLookupRow {
    pub id: String,
    pub class_id: Option<String>,
    pub code: String,
    pub name: Option<String>,
}

impl ClassLookupRow {
    /// 优先取 class_id，缺失时回退到 id
    pub fn resolved_class_id(&self) -> &str {
        self.class_id.as_deref().unwrap_or(&self.id)
    }
}

/// 请求携带的当前班级，以及调用者在该班级中的资料（尚未创建时为 None）
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveClass {
    pub class_id: String,
    pub profile: Option<crate::models::profiles::entities::Profile>,
}
