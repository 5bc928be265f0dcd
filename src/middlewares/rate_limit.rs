/*!
 * 速率限制中间件
 *
 * 包装 [`RateLimiter`]，同名的限制在所有 worker 间共享。
 *
 * ## 使用方法
 *
 * ```rust,ignore
 * web::resource("/lookup")
 *     .wrap(RateLimit::class_code())
 *     .route(web::post().to(lookup))
 * ```
 *
 * ## 限制规则
 *
 * - 已认证时以用户 ID 为键，否则用客户端 IP
 * - 超过限制返回 429，附带 `Retry-After`（秒，向上取整）与 `X-RateLimit-Remaining`
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::CONTENT_TYPE,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::warn;

use crate::config::AppConfig;
use crate::models::auth::entities::SessionUser;
use crate::models::auth::responses::RateLimitInfo;
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::rate_limiter::{self, RateLimiter, blocked_message};

#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<RateLimiter>,
    /// 限制键前缀（用于区分不同端点）
    key_prefix: &'static str,
}

impl RateLimit {
    pub fn new(key_prefix: &'static str, limiter: Arc<RateLimiter>) -> Self {
        Self {
            limiter,
            key_prefix,
        }
    }

    /// 加入码查询：默认 10次/分钟/客户端
    pub fn class_code() -> Self {
        let rule = AppConfig::get().rate_limit.class_code;
        Self::new("class_code", rate_limiter::shared("class_code", &rule))
    }

    /// 内容举报：默认 5次/分钟
    pub fn report() -> Self {
        let rule = AppConfig::get().rate_limit.report;
        Self::new("report", rate_limiter::shared("report", &rule))
    }

    /// 附件上传：默认 10次/分钟
    pub fn upload() -> Self {
        let rule = AppConfig::get().rate_limit.upload;
        Self::new("upload", rate_limiter::shared("upload", &rule))
    }
}

/// 从请求中提取客户端 IP
///
/// 部署在反向代理后面时，需要代理正确设置 X-Forwarded-For / X-Real-IP。
fn extract_client_ip(req: &ServiceRequest) -> String {
    let connection_ip = req
        .connection_info()
        .realip_remote_addr()
        .map(|s| s.to_string());

    if let Some(ref ip) = connection_ip
        && is_valid_ip(ip)
    {
        return ip.clone();
    }

    // 只取第一个 IP（最接近客户端的）
    if let Some(forwarded) = req.headers().get("X-Forwarded-For")
        && let Ok(value) = forwarded.to_str()
        && let Some(ip) = value.split(',').next()
    {
        let ip = ip.trim();
        if is_valid_ip(ip) {
            return ip.to_string();
        }
    }

    if let Some(real_ip) = req.headers().get("X-Real-IP")
        && let Ok(ip) = real_ip.to_str()
    {
        let ip = ip.trim();
        if is_valid_ip(ip) {
            return ip.to_string();
        }
    }

    connection_ip.unwrap_or_else(|| "unknown".to_string())
}

fn is_valid_ip(ip: &str) -> bool {
    use std::net::IpAddr;
    ip.parse::<IpAddr>().is_ok()
}

fn extract_user_id(req: &ServiceRequest) -> Option<String> {
    req.extensions().get::<SessionUser>().map(|user| user.id.clone())
}

/// 429 响应
pub fn create_rate_limit_response(info: &RateLimitInfo) -> HttpResponse {
    let retry_after = (info.reset_in_ms + 999) / 1000;
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
        .insert_header(("Retry-After", retry_after.to_string()))
        .insert_header(("X-RateLimit-Remaining", info.remaining.to_string()))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            blocked_message(info),
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
            key_prefix: self.key_prefix,
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limiter: Arc<RateLimiter>,
    key_prefix: &'static str,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let limiter = self.limiter.clone();
        let key_prefix = self.key_prefix;

        Box::pin(async move {
            let identifier = extract_user_id(&req)
                .map(|id| format!("user:{id}"))
                .unwrap_or_else(|| format!("ip:{}", extract_client_ip(&req)));
            let key = format!("{key_prefix}:{identifier}");

            let info = limiter.check(&key).await;
            if !info.allowed {
                warn!("Rate limit exceeded for key: {}", key);
                return Ok(
                    req.into_response(create_rate_limit_response(&info).map_into_right_body())
                );
            }

            req.extensions_mut().insert(info);
            let res = srv.call(req).await?.map_into_left_body();
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test, web};

    #[actix_web::test]
    async fn test_third_request_is_throttled() {
        let limiter = Arc::new(RateLimiter::new(2, 60_000));
        let app = test::init_service(
            App::new().service(
                web::resource("/r")
                    .wrap(RateLimit::new("test", limiter))
                    .route(web::post().to(HttpResponse::Ok)),
            ),
        )
        .await;

        for _ in 0..2 {
            let resp = test::call_service(&app, test::TestRequest::post().uri("/r").to_request()).await;
            assert!(resp.status().is_success());
        }

        let resp = test::call_service(&app, test::TestRequest::post().uri("/r").to_request()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after: i64 = resp
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap();
        assert!((1..=60).contains(&retry_after));
        assert_eq!(resp.headers().get("X-RateLimit-Remaining").unwrap(), "0");
    }
}
