use actix_web::http::header::{CacheControl, CacheDirective, ContentDisposition, DispositionType};
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{debug, error};

use super::{AttachmentService, attachment_not_found, find_class_attachment};
use crate::config::AppConfig;
use crate::models::homework::responses::SignedUrlResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{class_from, storage_error, try_or_respond};
use crate::utils::file_magic::mime_for_path;
use crate::utils::jwt::JwtUtils;

pub const DOWNLOAD_PATH: &str = "/api/v1/attachments/download";

pub async fn handle_signed_url(
    service: &AttachmentService,
    req: &HttpRequest,
    attachment_id: String,
) -> ActixResult<HttpResponse> {
    let storage = try_or_respond!(service.get_storage(req));
    let class = try_or_respond!(class_from(req));

    let attachment =
        match find_class_attachment(storage.as_ref(), &class.class_id, &attachment_id).await {
            Ok(Some((attachment, _))) => attachment,
            Ok(None) => return Ok(attachment_not_found()),
            Err(e) => return Ok(storage_error(e, None)),
        };

    let ttl = AppConfig::get().upload.signed_url_ttl;
    match JwtUtils::sign_storage_path(&attachment.storage_path, ttl) {
        Ok((token, expires_at)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            SignedUrlResponse {
                url: format!("{DOWNLOAD_PATH}?token={token}"),
                expires_at,
            },
            "ok",
        ))),
        Err(e) => {
            error!("Failed to sign attachment url: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                "Failed to create download link",
            )))
        }
    }
}

/// 凭签名令牌下载，无需登录
pub async fn handle_download(
    service: &AttachmentService,
    req: &HttpRequest,
    token: String,
) -> ActixResult<HttpResponse> {
    let objects = try_or_respond!(service.get_objects(req));

    let path = match JwtUtils::verify_storage_token(&token) {
        Ok(path) => path,
        Err(e) => {
            debug!("Rejected download token: {}", e);
            return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                ErrorCode::Forbidden,
                "Download link is invalid or has expired",
            )));
        }
    };

    let data = match objects.get(&path).await {
        Ok(Some(data)) => data,
        Ok(None) => return Ok(attachment_not_found()),
        Err(e) => return Ok(storage_error(e, Some(ErrorCode::FileNotFound))),
    };

    let content_type = mime_for_path(&path).unwrap_or("application/octet-stream");
    Ok(HttpResponse::Ok()
        .content_type(content_type)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Inline,
            parameters: vec![],
        })
        .insert_header(CacheControl(vec![CacheDirective::Private, CacheDirective::MaxAge(300)]))
        .body(data))
}
