pub mod announcements;
pub mod attachments;
pub mod audit;
pub mod auth;
pub mod classes;
pub mod gate;
pub mod homework;
pub mod notifications;
pub mod profile;
pub mod reports;
pub mod websocket;

pub use announcements::AnnouncementService;
pub use attachments::AttachmentService;
pub use auth::AuthService;
pub use classes::ClassService;
pub use homework::HomeworkService;
pub use notifications::NotificationService;
pub use profile::ProfileService;
pub use reports::ReportService;

use actix_web::{HttpRequest, HttpResponse, web};
use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::errors::PlannerError;
use crate::middlewares::{RequireClass, RequireJWT};
use crate::models::auth::entities::SessionUser;
use crate::models::classes::entities::ActiveClass;
use crate::models::common::response::error_response;
use crate::models::{ApiResponse, ErrorCode};
use crate::object_store::ObjectStore;
use crate::storage::Storage;

/// 从 app_data 取存储
pub(crate) fn storage_from(req: &HttpRequest) -> Result<Arc<dyn Storage>, HttpResponse> {
    req.app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|s| s.get_ref().clone())
        .ok_or_else(|| missing_app_data("Storage"))
}

pub(crate) fn cache_from(req: &HttpRequest) -> Result<Arc<dyn ObjectCache>, HttpResponse> {
    req.app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .map(|c| c.get_ref().clone())
        .ok_or_else(|| missing_app_data("Cache"))
}

pub(crate) fn object_store_from(req: &HttpRequest) -> Result<Arc<dyn ObjectStore>, HttpResponse> {
    req.app_data::<web::Data<Arc<dyn ObjectStore>>>()
        .map(|o| o.get_ref().clone())
        .ok_or_else(|| missing_app_data("Object store"))
}

fn missing_app_data(what: &str) -> HttpResponse {
    tracing::error!("{} not found in app data", what);
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
        ErrorCode::InternalServerError,
        format!("{what} unavailable"),
    ))
}

/// 会话用户；未经过 RequireJWT 时返回 401
pub(crate) fn session_from(req: &HttpRequest) -> Result<SessionUser, HttpResponse> {
    RequireJWT::extract_user(req).ok_or_else(|| {
        HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Not signed in",
        ))
    })
}

/// 当前班级；未经过 RequireClass 时返回 400
pub(crate) fn class_from(req: &HttpRequest) -> Result<ActiveClass, HttpResponse> {
    RequireClass::extract_class(req).ok_or_else(|| {
        HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::ClassRequired,
            "Please enter your class code.",
        ))
    })
}

/// 存储错误写成统一响应
pub(crate) fn storage_error(err: PlannerError, code: Option<ErrorCode>) -> HttpResponse {
    tracing::error!("{}", err);
    error_response(&err, code)
}

/// 在返回 `ActixResult<HttpResponse>` 的函数里解开 `Result<T, HttpResponse>`
macro_rules! try_or_respond {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(response) => return Ok(response),
        }
    };
}

pub(crate) use try_or_respond;
