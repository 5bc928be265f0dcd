use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::homework::requests::DownloadQuery;
use crate::services::AttachmentService;

// 懒加载的全局 AttachmentService 实例
static ATTACHMENT_SERVICE: Lazy<AttachmentService> = Lazy::new(AttachmentService::new_lazy);

pub async fn upload_attachment(
    req: HttpRequest,
    path: web::Path<String>,
    payload: actix_multipart::Multipart,
) -> ActixResult<HttpResponse> {
    ATTACHMENT_SERVICE
        .upload(&req, path.into_inner(), payload)
        .await
}

pub async fn signed_url(req: HttpRequest, path: web::Path<String>) -> ActixResult<HttpResponse> {
    ATTACHMENT_SERVICE.signed_url(&req, path.into_inner()).await
}

pub async fn download(req: HttpRequest, query: web::Query<DownloadQuery>) -> ActixResult<HttpResponse> {
    ATTACHMENT_SERVICE
        .download(&req, query.into_inner().token)
        .await
}

pub async fn delete_attachment(
    req: HttpRequest,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    ATTACHMENT_SERVICE.delete(&req, path.into_inner()).await
}

// 配置路由
pub fn configure_attachment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/attachments")
            // 下载只凭签名令牌
            .route("/download", web::get().to(download))
            .service(
                web::scope("")
                    .wrap(middlewares::RequireClass)
                    .wrap(middlewares::RequireJWT)
                    .route("/{id}/url", web::get().to(signed_url))
                    .route("/{id}", web::delete().to(delete_attachment)),
            ),
    );
}
