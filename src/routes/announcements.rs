use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::announcements::requests::CreateAnnouncementRequest;
use crate::services::AnnouncementService;

// 懒加载的全局 AnnouncementService 实例
static ANNOUNCEMENT_SERVICE: Lazy<AnnouncementService> = Lazy::new(AnnouncementService::new_lazy);

pub async fn list_announcements(req: HttpRequest) -> ActixResult<HttpResponse> {
    ANNOUNCEMENT_SERVICE.list(&req).await
}

pub async fn create_announcement(
    req: HttpRequest,
    body: web::Json<CreateAnnouncementRequest>,
) -> ActixResult<HttpResponse> {
    ANNOUNCEMENT_SERVICE.create(&req, body.into_inner()).await
}

pub async fn toggle_pin(req: HttpRequest, path: web::Path<String>) -> ActixResult<HttpResponse> {
    ANNOUNCEMENT_SERVICE.toggle_pin(&req, path.into_inner()).await
}

pub async fn delete_announcement(
    req: HttpRequest,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    ANNOUNCEMENT_SERVICE.delete(&req, path.into_inner()).await
}

// 配置路由
pub fn configure_announcement_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/announcements")
            .wrap(middlewares::RequireClass)
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_announcements))
            .route("", web::post().to(create_announcement))
            .route("/{id}/pin", web::post().to(toggle_pin))
            .route("/{id}", web::delete().to(delete_announcement)),
    );
}
