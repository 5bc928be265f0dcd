use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::reports::CreateReportRequest;
use crate::services::ReportService;

// 懒加载的全局 ReportService 实例
static REPORT_SERVICE: Lazy<ReportService> = Lazy::new(ReportService::new_lazy);

pub async fn create_report(
    req: HttpRequest,
    body: web::Json<CreateReportRequest>,
) -> ActixResult<HttpResponse> {
    REPORT_SERVICE.create(&req, body.into_inner()).await
}

// 配置路由
pub fn configure_report_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/v1/reports")
            .wrap(middlewares::RateLimit::report())
            .wrap(middlewares::RequireClass)
            .wrap(middlewares::RequireJWT)
            .route(web::post().to(create_report)),
    );
}
