use crate::config::AppConfig;
use actix_web::cookie::{Cookie, SameSite};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::models::auth::entities::SessionUser;

pub const CLASS_COOKIE: &str = "class_id";

// 认证服务签发的访问令牌
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderClaims {
    pub sub: String, // 用户 ID
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    // 字符串或字符串数组
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<serde_json::Value>,
    #[serde(default)]
    pub user_metadata: Option<serde_json::Value>,
}

impl ProviderClaims {
    fn audience_matches(&self, expected: &str) -> bool {
        match &self.aud {
            None => true,
            Some(serde_json::Value::String(aud)) => aud == expected,
            Some(serde_json::Value::Array(list)) => {
                list.iter().any(|a| a.as_str() == Some(expected))
            }
            Some(_) => false,
        }
    }

    pub fn into_session_user(self) -> SessionUser {
        SessionUser {
            id: self.sub,
            email: self.email,
            user_metadata: self.user_metadata.unwrap_or(serde_json::Value::Null),
            expires_at: self.exp,
        }
    }
}

// 附件下载链接中的令牌
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageUrlClaims {
    pub path: String,
    pub exp: i64,
    pub iat: i64,
}

pub struct JwtUtils;

impl JwtUtils {
    // 校验访问令牌（使用全局配置）
    pub fn verify_access_token(token: &str) -> Result<ProviderClaims, jsonwebtoken::errors::Error> {
        let config = AppConfig::get();
        Self::verify_access_token_with(
            token,
            &config.auth.jwt_secret,
            &config.auth.audience,
            config.auth.leeway,
        )
    }

    pub fn verify_access_token_with(
        token: &str,
        secret: &str,
        audience: &str,
        leeway: u64,
    ) -> Result<ProviderClaims, jsonwebtoken::errors::Error> {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway;
        // aud 可缺省，存在时手动比对
        validation.validate_aud = false;

        let claims = decode::<ProviderClaims>(token, &decoding_key, &validation)?.claims;
        if !claims.audience_matches(audience) {
            return Err(jsonwebtoken::errors::ErrorKind::InvalidAudience.into());
        }
        Ok(claims)
    }

    // 按认证服务的格式签发令牌，供本地调试与测试
    pub fn sign_access_token_with(
        claims: &ProviderClaims,
        secret: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    // 为对象路径生成限时下载令牌，返回 (令牌, 过期时间)
    pub fn sign_storage_path(
        path: &str,
        ttl_secs: i64,
    ) -> Result<(String, chrono::DateTime<chrono::Utc>), jsonwebtoken::errors::Error> {
        Self::sign_storage_path_with(path, ttl_secs, &AppConfig::get().upload.signing_secret)
    }

    pub fn sign_storage_path_with(
        path: &str,
        ttl_secs: i64,
        secret: &str,
    ) -> Result<(String, chrono::DateTime<chrono::Utc>), jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now();
        let expires_at = now + chrono::Duration::seconds(ttl_secs);
        let claims = StorageUrlClaims {
            path: path.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;
        Ok((token, expires_at))
    }

    // 校验下载令牌，返回对象路径
    pub fn verify_storage_token(token: &str) -> Result<String, jsonwebtoken::errors::Error> {
        Self::verify_storage_token_with(token, &AppConfig::get().upload.signing_secret)
    }

    pub fn verify_storage_token_with(
        token: &str,
        secret: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;
        decode::<StorageUrlClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .map(|data| data.claims.path)
    }

    /// 班级 Cookie
    pub fn create_class_cookie(class_id: &str) -> Cookie<'static> {
        let config = AppConfig::get();
        Cookie::build(CLASS_COOKIE, class_id.to_string())
            .path("/")
            .max_age(actix_web::cookie::time::Duration::days(365))
            .same_site(SameSite::Lax)
            .http_only(true)
            .secure(config.is_production())
            .finish()
    }

    /// 空的班级 Cookie（用于注销）
    pub fn create_empty_class_cookie() -> Cookie<'static> {
        let config = AppConfig::get();
        Cookie::build(CLASS_COOKIE, "")
            .path("/")
            .max_age(actix_web::cookie::time::Duration::seconds(0))
            .same_site(SameSite::Lax)
            .http_only(true)
            .secure(config.is_production())
            .finish()
    }

    /// 从 Authorization 头中提取 Bearer 令牌
    pub fn extract_bearer_token(req: &actix_web::HttpRequest) -> Option<String> {
        req.headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn claims(aud: Option<serde_json::Value>, exp_offset: i64) -> ProviderClaims {
        ProviderClaims {
            sub: "user-1".into(),
            email: Some("ana@school.org".into()),
            exp: chrono::Utc::now().timestamp() + exp_offset,
            aud,
            user_metadata: Some(json!({ "display_name": "Ana" })),
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let token = JwtUtils::sign_access_token_with(&claims(Some(json!("authenticated")), 600), SECRET)
            .unwrap();
        let verified =
            JwtUtils::verify_access_token_with(&token, SECRET, "authenticated", 0).unwrap();
        let user = verified.into_session_user();
        assert_eq!(user.id, "user-1");
        assert_eq!(user.preferred_display_name().as_deref(), Some("Ana"));
    }

    #[test]
    fn test_wrong_audience_and_secret() {
        let token =
            JwtUtils::sign_access_token_with(&claims(Some(json!(["other"])), 600), SECRET).unwrap();
        assert!(JwtUtils::verify_access_token_with(&token, SECRET, "authenticated", 0).is_err());

        let token = JwtUtils::sign_access_token_with(&claims(None, 600), SECRET).unwrap();
        assert!(JwtUtils::verify_access_token_with(&token, SECRET, "authenticated", 0).is_ok());
        assert!(JwtUtils::verify_access_token_with(&token, "nope", "authenticated", 0).is_err());
    }

    #[test]
    fn test_expired_token() {
        let token = JwtUtils::sign_access_token_with(&claims(None, -120), SECRET).unwrap();
        assert!(JwtUtils::verify_access_token_with(&token, SECRET, "authenticated", 0).is_err());
    }

    #[test]
    fn test_storage_token() {
        let (token, expires_at) =
            JwtUtils::sign_storage_path_with("h1/1-a.pdf", 3600, SECRET).unwrap();
        assert!(expires_at > chrono::Utc::now());
        assert_eq!(
            JwtUtils::verify_storage_token_with(&token, SECRET).unwrap(),
            "h1/1-a.pdf"
        );

        let (expired, _) = JwtUtils::sign_storage_path_with("h1/1-a.pdf", -10, SECRET).unwrap();
        assert!(JwtUtils::verify_storage_token_with(&expired, SECRET).is_err());
    }
}
