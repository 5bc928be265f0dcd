use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 顶层页面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/gate.ts")]
pub enum Screen {
    ClassCodeEntry,
    AuthGate,
    MainApp,
    Settings,
    Terms,
    Privacy,
    Announcements,
}

/// 路径解析结果：渲染某个页面或重定向
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "action", rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/gate.ts")]
pub enum GateDecision {
    Render { screen: Screen },
    Redirect { to: String },
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/gate.ts")]
pub struct GateQuery {
    pub path: String,
}
