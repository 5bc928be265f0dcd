use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 通过令牌校验的会话用户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct SessionUser {
    pub id: String,
    pub email: Option<String>,
    pub user_metadata: serde_json::Value,
    // 令牌过期时间 (Unix 秒)
    pub expires_at: i64,
}

impl SessionUser {
    /// 元数据中的 display_name，缺失时取邮箱 @ 前的部分
    pub fn preferred_display_name(&self) -> Option<String> {
        self.user_metadata
            .get("display_name")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(email: Option<&str>, metadata: serde_json::Value) -> SessionUser {
        SessionUser {
            id: "u1".into(),
            email: email.map(str::to_string),
            user_metadata: metadata,
            expires_at: 0,
        }
    }

    #[test]
    fn test_display_name_prefers_metadata() {
        let u = user(Some("ana@school.org"), json!({"display_name": "Ana P."}));
        assert_eq!(u.preferred_display_name().as_deref(), Some("Ana P."));
    }

    #[test]
    fn test_display_name_falls_back_to_email_local_part() {
        let u = user(Some("ana@school.org"), json!({}));
        assert_eq!(u.preferred_display_name().as_deref(), Some("ana"));
        assert_eq!(user(None, json!(null)).preferred_display_name(), None);
    }
}
