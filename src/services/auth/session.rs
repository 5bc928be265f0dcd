use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::AuthService;
use crate::cache::ObjectCache;
use crate::errors::{PlannerError, Result};
use crate::middlewares::RequireJWT;
use crate::middlewares::require_jwt::revoked_key;
use crate::models::ApiResponse;
use crate::models::auth::entities::SessionUser;
use crate::models::profiles::{entities::Profile, requests::CreateProfile};
use crate::services::audit::{AuditEvent, log_audit_event};
use crate::services::{class_from, session_from, storage_error, try_or_respond};
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;

pub async fn handle_session(req: &HttpRequest) -> ActixResult<HttpResponse> {
    let user = try_or_respond!(session_from(req));
    Ok(HttpResponse::Ok().json(ApiResponse::success(user, "ok")))
}

/// 在当前班级创建资料；已存在时保持不变。返回资料与是否新建
pub async fn ensure_profile(
    storage: &dyn Storage,
    user: &SessionUser,
    class_id: &str,
) -> Result<(Profile, bool)> {
    let created = storage
        .create_profile_if_absent(CreateProfile {
            id: user.id.clone(),
            class_id: class_id.to_string(),
            display_name: user.preferred_display_name(),
            avatar_url: None,
        })
        .await?;

    let profile = storage
        .get_profile(&user.id)
        .await?
        .ok_or_else(|| PlannerError::not_found(format!("用户资料不存在: {}", user.id)))?;
    Ok((profile, created))
}

pub async fn handle_ensure_profile(
    service: &AuthService,
    req: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_or_respond!(service.get_storage(req));
    let user = try_or_respond!(session_from(req));
    let class = try_or_respond!(class_from(req));

    let (profile, created) = match ensure_profile(storage.as_ref(), &user, &class.class_id).await {
        Ok(result) => result,
        Err(e) => return Ok(storage_error(e, None)),
    };
    if created {
        info!("Created profile for user {} in class {}", user.id, class.class_id);
    }

    log_audit_event(
        storage.as_ref(),
        req,
        Some(&user.id),
        AuditEvent::new("user_login").resource("auth", &user.id),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(profile, "ok")))
}

/// 令牌在过期之前都视为已注销
pub async fn revoke_session(cache: &dyn ObjectCache, token: &str, expires_at: i64) {
    let remaining = (expires_at - chrono::Utc::now().timestamp()).max(1) as u64;
    cache.insert_raw(revoked_key(token), "1".into(), remaining).await;
}

pub async fn handle_sign_out(service: &AuthService, req: &HttpRequest) -> ActixResult<HttpResponse> {
    let user = try_or_respond!(session_from(req));
    let cache = try_or_respond!(service.get_cache(req));

    if let Some(token) = RequireJWT::extract_token(req) {
        revoke_session(cache.as_ref(), &token, user.expires_at).await;
    }

    if let Ok(storage) = service.get_storage(req) {
        log_audit_event(
            storage.as_ref(),
            req,
            Some(&user.id),
            AuditEvent::new("session_revoked").resource("auth", &user.id),
        )
        .await;
    }

    Ok(HttpResponse::Ok()
        .cookie(JwtUtils::create_empty_class_cookie())
        .json(ApiResponse::<()>::success_empty("Signed out")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheResult;
    use crate::cache::object_cache::moka::MokaCacheWrapper;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use serde_json::json;

    fn user(id: &str, email: &str, metadata: serde_json::Value) -> SessionUser {
        SessionUser {
            id: id.into(),
            email: Some(email.into()),
            user_metadata: metadata,
            expires_at: chrono::Utc::now().timestamp() + 600,
        }
    }

    #[tokio::test]
    async fn test_ensure_profile_is_idempotent() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let class = storage.create_class("1HAT2", None).await.unwrap();
        let u = user("u1", "mila@school.org", json!({}));

        let (profile, created) = ensure_profile(&storage, &u, &class.id).await.unwrap();
        assert!(created);
        assert_eq!(profile.display_name.as_deref(), Some("mila"));
        assert_eq!(profile.class_id, class.id);

        // 第二次调用不改动已有资料
        let renamed = user("u1", "mila@school.org", json!({"display_name": "Mila K."}));
        let (again, created) = ensure_profile(&storage, &renamed, &class.id).await.unwrap();
        assert!(!created);
        assert_eq!(again.display_name.as_deref(), Some("mila"));
    }

    #[tokio::test]
    async fn test_revoke_marks_token() {
        let cache = MokaCacheWrapper::with_capacity(10, 60);
        revoke_session(&cache, "tok", chrono::Utc::now().timestamp() + 30).await;
        assert!(matches!(
            cache.get_raw(&revoked_key("tok")).await,
            CacheResult::Found(_)
        ));
    }
}
