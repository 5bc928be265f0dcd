use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::services::NotificationService;

// 懒加载的全局 NotificationService 实例
static NOTIFICATION_SERVICE: Lazy<NotificationService> = Lazy::new(NotificationService::new_lazy);

pub async fn list_notifications(req: HttpRequest) -> ActixResult<HttpResponse> {
    NOTIFICATION_SERVICE.list_recent(&req).await
}

pub async fn mark_read(req: HttpRequest, path: web::Path<String>) -> ActixResult<HttpResponse> {
    NOTIFICATION_SERVICE.mark_read(&req, path.into_inner()).await
}

pub async fn mark_all_read(req: HttpRequest) -> ActixResult<HttpResponse> {
    NOTIFICATION_SERVICE.mark_all_read(&req).await
}

// 配置路由
pub fn configure_notification_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/notifications")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_notifications))
            .route("/read-all", web::post().to(mark_all_read))
            .route("/{id}/read", web::post().to(mark_read)),
    );
}
