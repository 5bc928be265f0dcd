/*!
 * 访问令牌校验中间件
 *
 * 认证由外部服务完成，这里只校验其签发的 HS256 访问令牌。
 *
 * ## 使用方法
 *
 * ```rust,ignore
 * web::scope("/api/v1/homework")
 *     .wrap(RequireClass)
 *     .wrap(RequireJWT)
 * ```
 *
 * 处理程序中：
 * ```rust,ignore
 * let user = RequireJWT::extract_user(&req);
 * let user_id = RequireJWT::extract_user_id(&req);
 * ```
 *
 * ## 认证流程
 *
 * 1. 令牌取自 `Authorization: Bearer <token>`，WebSocket 握手时也可用 `?token=`
 * 2. 已注销的令牌（缓存中的 `revoked:<token>`）直接拒绝
 * 3. 命中 `session:<token>` 缓存时跳过签名校验
 * 4. 校验通过后将 [`SessionUser`] 与 [`AccessToken`] 放入请求扩展
 */

use crate::cache::{CacheResult, ObjectCache, traits};
use crate::config::AppConfig;
use crate::models::ErrorCode;
use crate::models::auth::entities::SessionUser;
use crate::utils::jwt::JwtUtils;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info};

use super::create_error_response;

/// 当前请求使用的原始访问令牌
#[derive(Debug, Clone)]
pub struct AccessToken(pub String);

#[derive(Clone)]
pub struct RequireJWT;

pub fn revoked_key(token: &str) -> String {
    format!("revoked:{token}")
}

fn session_key(token: &str) -> String {
    format!("session:{token}")
}

fn extract_token(req: &ServiceRequest) -> Option<String> {
    if let Some(token) = JwtUtils::extract_bearer_token(req.request()) {
        return Some(token);
    }
    web::Query::<std::collections::HashMap<String, String>>::from_query(req.query_string())
        .ok()
        .and_then(|q| q.get("token").cloned())
        .filter(|t| !t.is_empty())
}

// 提取并校验访问令牌
async fn extract_and_validate_jwt(req: &ServiceRequest) -> Result<(SessionUser, String), String> {
    let token = extract_token(req).ok_or_else(|| "Missing or invalid Authorization header".to_string())?;

    let cache = req
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .map(|c| c.get_ref().clone());

    if let Some(cache) = &cache {
        if let CacheResult::Found(_) = cache.get_raw(&revoked_key(&token)).await {
            return Err("Session has been revoked".to_string());
        }
        if let Some(user) = traits::get_json::<SessionUser>(cache.as_ref(), &session_key(&token)).await
            && user.expires_at > chrono::Utc::now().timestamp()
        {
            return Ok((user, token));
        }
    }

    let claims = JwtUtils::verify_access_token(&token).map_err(|err| {
        info!("Access token validation failed: {}", err);
        "Invalid access token".to_string()
    })?;
    let user = claims.into_session_user();

    // 缓存时间不超过令牌剩余有效期
    if let Some(cache) = &cache {
        let remaining = (user.expires_at - chrono::Utc::now().timestamp()).max(1) as u64;
        let ttl = AppConfig::get().cache.default_ttl.min(remaining);
        traits::insert_json(cache.as_ref(), session_key(&token), &user, ttl).await;
    }

    Ok((user, token))
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
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
        Box::pin(async move {
            // 预检请求直接放行
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(srv.call(req).await?.map_into_left_body());
            }

            match extract_and_validate_jwt(&req).await {
                Ok((user, token)) => {
                    debug!("Access token accepted for user: {}", user.id);
                    req.extensions_mut().insert(user);
                    req.extensions_mut().insert(AccessToken(token));
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(err) => {
                    info!(
                        "Authentication failed for request to {}: {}",
                        req.path(),
                        err
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            &format!("Unauthorized: {err}"),
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

impl RequireJWT {
    /// 从请求扩展中提取会话用户
    pub fn extract_user(req: &actix_web::HttpRequest) -> Option<SessionUser> {
        req.extensions().get::<SessionUser>().cloned()
    }

    pub fn extract_user_id(req: &actix_web::HttpRequest) -> Option<String> {
        req.extensions().get::<SessionUser>().map(|user| user.id.clone())
    }

    pub fn extract_token(req: &actix_web::HttpRequest) -> Option<String> {
        req.extensions().get::<AccessToken>().map(|t| t.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::object_cache::moka::MokaCacheWrapper;
    use crate::utils::jwt::ProviderClaims;
    use actix_web::{App, HttpRequest, HttpResponse, test};

    async fn whoami(req: HttpRequest) -> HttpResponse {
        HttpResponse::Ok().body(RequireJWT::extract_user_id(&req).unwrap_or_default())
    }

    fn token_for(sub: &str) -> String {
        let config = AppConfig::get();
        let claims = ProviderClaims {
            sub: sub.into(),
            email: None,
            exp: chrono::Utc::now().timestamp() + 600,
            aud: Some(serde_json::json!(config.auth.audience)),
            user_metadata: None,
        };
        JwtUtils::sign_access_token_with(&claims, &config.auth.jwt_secret).unwrap()
    }

    #[actix_web::test]
    async fn test_missing_token_is_rejected() {
        let app = test::init_service(
            App::new().service(web::scope("/p").wrap(RequireJWT).route("", web::get().to(whoami))),
        )
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/p").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_valid_and_revoked_tokens() {
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::with_capacity(100, 60));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(cache.clone()))
                .service(web::scope("/p").wrap(RequireJWT).route("", web::get().to(whoami))),
        )
        .await;

        let token = token_for("user-7");
        let req = test::TestRequest::get()
            .uri("/p")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "user-7");

        // 查询参数形式
        let req = test::TestRequest::get()
            .uri(&format!("/p?token={token}"))
            .to_request();
        assert_eq!(test::call_and_read_body(&app, req).await, "user-7");

        cache
            .insert_raw(revoked_key(&token), "1".into(), 60)
            .await;
        let req = test::TestRequest::get()
            .uri("/p")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
