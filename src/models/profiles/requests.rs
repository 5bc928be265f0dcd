use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/profile.ts")]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// 新建资料时写入的字段
#[derive(Debug, Clone)]
pub struct CreateProfile {
    pub id: String,
    pub class_id: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}
