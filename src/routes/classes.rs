use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::classes::requests::ClassCodeRequest;
use crate::services::ClassService;

// 懒加载的全局 ClassService 实例
static CLASS_SERVICE: Lazy<ClassService> = Lazy::new(ClassService::new_lazy);

pub async fn lookup(
    req: HttpRequest,
    body: web::Json<ClassCodeRequest>,
) -> ActixResult<HttpResponse> {
    CLASS_SERVICE.lookup(&req, body.into_inner()).await
}

// 配置路由
pub fn configure_classes_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/classes").service(
            web::resource("/lookup")
                .wrap(middlewares::RateLimit::class_code())
                .route(web::post().to(lookup)),
        ),
    );
}
