use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::auth::requests::{
    CaptchaAnswerRequest, ExplainErrorRequest, PasswordStrengthRequest, PrecheckRequest,
};
use crate::services::AuthService;

// 懒加载的全局 AuthService 实例
static AUTH_SERVICE: Lazy<AuthService> = Lazy::new(AuthService::new_lazy);

pub async fn precheck(
    req: HttpRequest,
    body: web::Json<PrecheckRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.precheck(body.into_inner(), &req).await
}

pub async fn issue_captcha(req: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.issue_captcha(&req).await
}

pub async fn verify_captcha(
    req: HttpRequest,
    body: web::Json<CaptchaAnswerRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.verify_captcha(body.into_inner(), &req).await
}

pub async fn explain_error(body: web::Json<ExplainErrorRequest>) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.explain_error(body.into_inner()).await
}

pub async fn password_strength(
    body: web::Json<PasswordStrengthRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.password_strength(body.into_inner()).await
}

pub async fn session(req: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.session(&req).await
}

pub async fn sign_out(req: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.sign_out(&req).await
}

pub async fn ensure_profile(req: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.ensure_profile(&req).await
}

// 配置路由
pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/auth")
            .route("/precheck", web::post().to(precheck))
            .route("/captcha", web::post().to(issue_captcha))
            .route("/captcha/verify", web::post().to(verify_captcha))
            .route("/explain-error", web::post().to(explain_error))
            .route("/password-strength", web::post().to(password_strength))
            .service(
                web::resource("/profile")
                    .wrap(middlewares::RequireClass)
                    .wrap(middlewares::RequireJWT)
                    .route(web::post().to(ensure_profile)),
            )
            .service(
                web::scope("")
                    .wrap(middlewares::RequireJWT)
                    .route("/session", web::get().to(session))
                    .route("/sign-out", web::post().to(sign_out)),
            ),
    );
}
