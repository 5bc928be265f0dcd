use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 加入码校验结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct ClassCodeValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClassCodeValidation {
    pub fn ok(class_id: impl Into<String>) -> Self {
        Self {
            valid: true,
            class_id: Some(class_id.into()),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            class_id: None,
            error: Some(error.into()),
        }
    }
}
