/*!
 * 当前班级中间件
 *
 * 班级 ID 依次取自 `class_id` Cookie、`X-Class-Id` 请求头、`?class_id=`。
 * 须放在 [`RequireJWT`](super::RequireJWT) 之内：
 *
 * ```rust,ignore
 * web::scope("/api/v1/homework")
 *     .wrap(RequireClass)
 *     .wrap(RequireJWT)
 * ```
 *
 * - 缺少班级 ID：400
 * - 班级不存在：404
 * - 调用者已有资料且属于其他班级：403
 *
 * 通过后在请求扩展中放入 [`ActiveClass`]。
 */

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
use tracing::{debug, error};

use crate::models::ErrorCode;
use crate::models::auth::entities::SessionUser;
use crate::models::classes::entities::ActiveClass;
use crate::storage::Storage;
use crate::utils::jwt::CLASS_COOKIE;

use super::create_error_response;

pub const CLASS_HEADER: &str = "X-Class-Id";

#[derive(Clone)]
pub struct RequireClass;

pub(crate) fn class_id_from(req: &actix_web::HttpRequest) -> Option<String> {
    req.cookie(CLASS_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| {
            req.headers()
                .get(CLASS_HEADER)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string)
        })
        .or_else(|| {
            web::Query::<std::collections::HashMap<String, String>>::from_query(
                req.query_string(),
            )
            .ok()
            .and_then(|q| q.get("class_id").cloned())
        })
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}

enum Rejection {
    Status(StatusCode, ErrorCode, String),
}

async fn resolve_active_class(req: &ServiceRequest) -> Result<ActiveClass, Rejection> {
    let user_id = req
        .extensions()
        .get::<SessionUser>()
        .map(|u| u.id.clone())
        .ok_or_else(|| {
            Rejection::Status(
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
                "Unauthorized: missing session".into(),
            )
        })?;

    let class_id = class_id_from(req.request()).ok_or_else(|| {
        Rejection::Status(
            StatusCode::BAD_REQUEST,
            ErrorCode::ClassRequired,
            "Please enter your class code.".into(),
        )
    })?;

    let storage = req
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|s| s.get_ref().clone())
        .ok_or_else(|| {
            error!("Storage not found in app data");
            Rejection::Status(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
                "Storage unavailable".into(),
            )
        })?;

    let server_error = |e: crate::errors::PlannerError| {
        Rejection::Status(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
            format!("Server error: {}", e.message()),
        )
    };

    if storage
        .get_class_by_id(&class_id)
        .await
        .map_err(server_error)?
        .is_none()
    {
        return Err(Rejection::Status(
            StatusCode::NOT_FOUND,
            ErrorCode::ClassNotFound,
            "Class not found".into(),
        ));
    }

    let profile = storage.get_profile(&user_id).await.map_err(server_error)?;
    if let Some(profile) = &profile
        && profile.class_id != class_id
    {
        debug!(
            "User {} belongs to class {}, request targets {}",
            user_id, profile.class_id, class_id
        );
        return Err(Rejection::Status(
            StatusCode::FORBIDDEN,
            ErrorCode::ClassMismatch,
            "You are not a member of this class".into(),
        ));
    }

    Ok(ActiveClass { class_id, profile })
}

impl<S, B> Transform<S, ServiceRequest> for RequireClass
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireClassMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireClassMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireClassMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireClassMiddleware<S>
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
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(srv.call(req).await?.map_into_left_body());
            }

            match resolve_active_class(&req).await {
                Ok(active) => {
                    req.extensions_mut().insert(active);
                    Ok(srv.call(req).await?.map_into_left_body())
                }
                Err(Rejection::Status(status, code, message)) => Ok(req.into_response(
                    create_error_response(status, code, &message).map_into_right_body(),
                )),
            }
        })
    }
}

impl RequireClass {
    pub fn extract_class(req: &actix_web::HttpRequest) -> Option<ActiveClass> {
        req.extensions().get::<ActiveClass>().cloned()
    }

    pub fn extract_class_id(req: &actix_web::HttpRequest) -> Option<String> {
        req.extensions()
            .get::<ActiveClass>()
            .map(|c| c.class_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profiles::requests::CreateProfile;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use actix_web::dev::Service as _;
    use actix_web::{App, HttpRequest, HttpResponse, test};

    async fn echo_class(req: HttpRequest) -> HttpResponse {
        HttpResponse::Ok().body(RequireClass::extract_class_id(&req).unwrap_or_default())
    }

    fn user(id: &str) -> SessionUser {
        SessionUser {
            id: id.into(),
            email: None,
            user_metadata: serde_json::Value::Null,
            expires_at: i64::MAX,
        }
    }

    #[actix_web::test]
    async fn test_class_resolution() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let mine = storage.create_class("1HAT2", None).await.unwrap();
        let other = storage.create_class("2BC1", None).await.unwrap();
        storage
            .create_profile_if_absent(CreateProfile {
                id: "u1".into(),
                class_id: mine.id.clone(),
                display_name: None,
                avatar_url: None,
            })
            .await
            .unwrap();
        let storage: Arc<dyn Storage> = Arc::new(storage);

        let app = test::init_service(
            App::new().app_data(web::Data::new(storage)).service(
                web::scope("/c")
                    .wrap(RequireClass)
                    .route("", web::get().to(echo_class)),
            ),
        )
        .await;

        let call = |class: Option<&str>, uid: &str| {
            let mut req = test::TestRequest::get().uri("/c");
            if let Some(class) = class {
                req = req.insert_header((CLASS_HEADER, class));
            }
            let req = req.to_request();
            req.extensions_mut().insert(user(uid));
            req
        };

        let resp = app.call(call(Some(&mine.id), "u1")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, mine.id.as_bytes());

        let resp = app.call(call(Some(&other.id), "u1")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        // 尚无资料的用户可以进入任意存在的班级
        let resp = app.call(call(Some(&other.id), "u2")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app.call(call(None, "u1")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app.call(call(Some("missing"), "u1")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
