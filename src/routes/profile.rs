use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::profiles::requests::UpdateProfileRequest;
use crate::services::ProfileService;

// 懒加载的全局 ProfileService 实例
static PROFILE_SERVICE: Lazy<ProfileService> = Lazy::new(ProfileService::new_lazy);

pub async fn get_profile(req: HttpRequest) -> ActixResult<HttpResponse> {
    PROFILE_SERVICE.get_profile(&req).await
}

pub async fn update_profile(
    req: HttpRequest,
    body: web::Json<UpdateProfileRequest>,
) -> ActixResult<HttpResponse> {
    PROFILE_SERVICE.update_profile(&req, body.into_inner()).await
}

pub async fn delete_account(req: HttpRequest) -> ActixResult<HttpResponse> {
    PROFILE_SERVICE.delete_account(&req).await
}

pub async fn export_data(req: HttpRequest) -> ActixResult<HttpResponse> {
    PROFILE_SERVICE.export_data(&req).await
}

pub async fn activity(req: HttpRequest) -> ActixResult<HttpResponse> {
    PROFILE_SERVICE.activity(&req).await
}

// 配置路由
pub fn configure_profile_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/profile")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(get_profile))
            .route("", web::put().to(update_profile))
            .route("", web::delete().to(delete_account))
            .route("/export", web::get().to(export_data))
            .route("/activity", web::get().to(activity)),
    );
}
