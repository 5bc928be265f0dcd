use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct RateLimitInfo {
    pub allowed: bool,
    pub remaining: usize,
    pub reset_in_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct PasswordStrength {
    // 0..=4
    pub score: u8,
    pub feedback: Vec<String>,
    pub is_strong: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct CaptchaChallenge {
    pub id: String,
    pub question: String,
}

/// 验证码校验结果；失败时附带新题目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct CaptchaVerification {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_challenge: Option<CaptchaChallenge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct PrecheckResponse {
    /// 为 true 时前端可以继续调用认证服务
    pub proceed: bool,
    /// 需要先完成验证码
    pub show_captcha: bool,
    pub rate_limit: RateLimitInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_strength: Option<PasswordStrength>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct ExplainedError {
    pub message: String,
    pub show_captcha: bool,
}
