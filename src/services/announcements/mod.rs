use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::Result;
use crate::models::announcements::entities::Announcement;
use crate::models::announcements::requests::{CreateAnnouncementRequest, NewAnnouncement};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{class_from, session_from, storage_error, try_or_respond};
use crate::storage::Storage;

pub struct AnnouncementService {
    storage: Option<Arc<dyn Storage>>,
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::AnnouncementNotFound,
        "Announcement not found",
    ))
}

/// 其他班级的公告视为不存在
async fn find_class_announcement(
    storage: &dyn Storage,
    class_id: &str,
    announcement_id: &str,
) -> Result<Option<Announcement>> {
    Ok(storage
        .get_announcement(announcement_id)
        .await?
        .filter(|a| a.class_id == class_id))
}

impl AnnouncementService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> std::result::Result<Arc<dyn Storage>, HttpResponse> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from(request),
        }
    }

    // 置顶优先，其次按发布时间倒序
    pub async fn list(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = try_or_respond!(self.get_storage(request));
        let class = try_or_respond!(class_from(request));

        match storage.list_announcements(&class.class_id).await {
            Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list, "ok"))),
            Err(e) => Ok(storage_error(e, None)),
        }
    }

    pub async fn create(
        &self,
        request: &HttpRequest,
        body: CreateAnnouncementRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = try_or_respond!(self.get_storage(request));
        let user = try_or_respond!(session_from(request));
        let class = try_or_respond!(class_from(request));

        let title = body.title.trim();
        if title.is_empty() {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::AnnouncementInvalid,
                "Title is required",
            )));
        }

        let content = body
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        match storage
            .create_announcement(NewAnnouncement {
                class_id: class.class_id,
                title: title.to_string(),
                content,
                priority: body.priority,
                pinned: body.pinned,
                created_by: Some(user.id),
            })
            .await
        {
            Ok(announcement) => Ok(HttpResponse::Created()
                .json(ApiResponse::success(announcement, "Announcement posted"))),
            Err(e) => Ok(storage_error(e, None)),
        }
    }

    // 切换置顶状态
    pub async fn toggle_pin(
        &self,
        request: &HttpRequest,
        announcement_id: String,
    ) -> ActixResult<HttpResponse> {
        let storage = try_or_respond!(self.get_storage(request));
        let class = try_or_respond!(class_from(request));

        let current =
            match find_class_announcement(storage.as_ref(), &class.class_id, &announcement_id)
                .await
            {
                Ok(Some(a)) => a,
                Ok(None) => return Ok(not_found()),
                Err(e) => return Ok(storage_error(e, None)),
            };

        match storage
            .set_announcement_pinned(&announcement_id, !current.pinned)
            .await
        {
            Ok(Some(updated)) => Ok(HttpResponse::Ok().json(ApiResponse::success(updated, "ok"))),
            Ok(None) => Ok(not_found()),
            Err(e) => Ok(storage_error(e, None)),
        }
    }

    pub async fn delete(
        &self,
        request: &HttpRequest,
        announcement_id: String,
    ) -> ActixResult<HttpResponse> {
        let storage = try_or_respond!(self.get_storage(request));
        let class = try_or_respond!(class_from(request));

        match find_class_announcement(storage.as_ref(), &class.class_id, &announcement_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return Ok(not_found()),
            Err(e) => return Ok(storage_error(e, None)),
        }

        match storage.delete_announcement(&announcement_id).await {
            Ok(true) => Ok(HttpResponse::Ok()
                .json(ApiResponse::<()>::success_empty("Announcement deleted"))),
            Ok(false) => Ok(not_found()),
            Err(e) => Ok(storage_error(e, None)),
        }
    }
}
