pub mod delete;
pub mod download;
pub mod upload;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::Result;
use crate::models::homework::entities::{Attachment, Homework};
use crate::models::{ApiResponse, ErrorCode};
use crate::object_store::ObjectStore;
use crate::storage::Storage;

pub struct AttachmentService {
    storage: Option<Arc<dyn Storage>>,
}

impl AttachmentService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> std::result::Result<Arc<dyn Storage>, HttpResponse> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from(request),
        }
    }

    pub(crate) fn get_objects(&self, request: &HttpRequest) -> std::result::Result<Arc<dyn ObjectStore>, HttpResponse> {
        super::object_store_from(request)
    }

    // 上传附件
    pub async fn upload(
        &self,
        request: &HttpRequest,
        homework_id: String,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        upload::handle_upload(self, request, homework_id, payload).await
    }

    // 生成限时下载链接
    pub async fn signed_url(
        &self,
        request: &HttpRequest,
        attachment_id: String,
    ) -> ActixResult<HttpResponse> {
        download::handle_signed_url(self, request, attachment_id).await
    }

    pub async fn download(&self, request: &HttpRequest, token: String) -> ActixResult<HttpResponse> {
        download::handle_download(self, request, token).await
    }

    pub async fn delete(
        &self,
        request: &HttpRequest,
        attachment_id: String,
    ) -> ActixResult<HttpResponse> {
        delete::handle_delete(self, request, attachment_id).await
    }
}

/// 附件及其所属作业；作业不在该班级时为 None
pub(crate) async fn find_class_attachment(
    storage: &dyn Storage,
    class_id: &str,
    attachment_id: &str,
) -> Result<Option<(Attachment, Homework)>> {
    let Some(attachment) = storage.get_attachment(attachment_id).await? else {
        return Ok(None);
    };
    let homework = storage
        .get_homework(&attachment.homework_id)
        .await?
        .filter(|hw| hw.class_id == class_id);
    Ok(homework.map(|hw| (attachment, hw)))
}

pub(crate) fn attachment_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::FileNotFound,
        "Attachment not found",
    ))
}
