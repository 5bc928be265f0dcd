pub mod export;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::models::profiles::requests::UpdateProfileRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::audit::{AuditEvent, log_audit_event};
use crate::services::{session_from, storage_error, try_or_respond};
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;

/// 活动记录的条数
pub const ACTIVITY_LIMIT: u64 = 20;
pub const DISPLAY_NAME_MAX: usize = 50;

pub struct ProfileService {
    storage: Option<Arc<dyn Storage>>,
}

fn profile_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::ProfileNotFound,
        "Profile not found",
    ))
}

/// 规范化资料更新：去空白，空字符串视为清空
pub fn normalize_update(mut update: UpdateProfileRequest) -> Result<UpdateProfileRequest, &'static str> {
    update.display_name = update
        .display_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    if update
        .display_name
        .as_ref()
        .is_some_and(|n| n.chars().count() > DISPLAY_NAME_MAX)
    {
        return Err("Display name must be at most 50 characters");
    }
    update.avatar_url = update
        .avatar_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());
    Ok(update)
}

impl ProfileService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>, HttpResponse> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from(request),
        }
    }

    pub async fn get_profile(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = try_or_respond!(self.get_storage(request));
        let user = try_or_respond!(session_from(request));

        match storage.get_profile(&user.id).await {
            Ok(Some(profile)) => Ok(HttpResponse::Ok().json(ApiResponse::success(profile, "ok"))),
            Ok(None) => Ok(profile_not_found()),
            Err(e) => Ok(storage_error(e, None)),
        }
    }

    pub async fn update_profile(
        &self,
        request: &HttpRequest,
        update: UpdateProfileRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = try_or_respond!(self.get_storage(request));
        let user = try_or_respond!(session_from(request));

        let update = match normalize_update(update) {
            Ok(update) => update,
            Err(message) => {
                return Ok(HttpResponse::BadRequest()
                    .json(ApiResponse::error_empty(ErrorCode::BadRequest, message)));
            }
        };

        match storage.update_profile(&user.id, update).await {
            Ok(Some(profile)) => Ok(HttpResponse::Ok()
                .json(ApiResponse::success(profile, "Profile updated successfully!"))),
            Ok(None) => Ok(profile_not_found()),
            Err(e) => Ok(storage_error(e, None)),
        }
    }

    // 删除资料行并清除班级 Cookie
    pub async fn delete_account(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = try_or_respond!(self.get_storage(request));
        let user = try_or_respond!(session_from(request));

        match storage.delete_profile(&user.id).await {
            Ok(true) => {}
            Ok(false) => return Ok(profile_not_found()),
            Err(e) => return Ok(storage_error(e, None)),
        }
        info!("User {} deleted their profile", user.id);

        log_audit_event(
            storage.as_ref(),
            request,
            Some(&user.id),
            AuditEvent::new("account_deleted").resource("profile", &user.id),
        )
        .await;

        Ok(HttpResponse::Ok()
            .cookie(JwtUtils::create_empty_class_cookie())
            .json(ApiResponse::<()>::success_empty("Account deleted")))
    }

    pub async fn export_data(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        export::handle_export(self, request).await
    }

    // 最近的审计记录
    pub async fn activity(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = try_or_respond!(self.get_storage(request));
        let user = try_or_respond!(session_from(request));

        match storage.list_recent_audit_logs(&user.id, ACTIVITY_LIMIT).await {
            Ok(logs) => Ok(HttpResponse::Ok().json(ApiResponse::success(logs, "ok"))),
            Err(e) => Ok(storage_error(e, None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_update() {
        let update = normalize_update(UpdateProfileRequest {
            display_name: Some("  Noor  ".into()),
            avatar_url: Some(" ".into()),
        })
        .unwrap();
        assert_eq!(update.display_name.as_deref(), Some("Noor"));
        assert_eq!(update.avatar_url, None);

        let too_long = UpdateProfileRequest {
            display_name: Some("x".repeat(51)),
            avatar_url: None,
        };
        assert!(normalize_update(too_long).is_err());
    }
}
