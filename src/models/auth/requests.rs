use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub enum AuthMode {
    SignIn,
    SignUp,
    MagicLink,
}

/// 提交到认证服务之前的预检
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct PrecheckRequest {
    pub mode: AuthMode,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    /// 已通过校验的验证码令牌
    #[serde(default)]
    pub captcha_token: Option<String>,
    /// 界面当前是否显示验证码
    #[serde(default)]
    pub captcha_required: bool,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct CaptchaAnswerRequest {
    pub id: String,
    pub answer: String,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct ExplainErrorRequest {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct PasswordStrengthRequest {
    pub password: String,
}
